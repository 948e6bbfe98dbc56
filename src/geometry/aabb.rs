//! Bounding-box tree over the elements of a mesh.
//!
//! Boxes are indexed with an `rstar` R-tree. 2-D boxes are embedded in the
//! `z = 0` plane so a single 3-D tree type serves both dimensions; distances
//! are unchanged by the embedding.

use crate::geometry::bbox::BoundingBox;
use crate::strata_error::StrataError;
use rstar::{AABB, Envelope, PointDistance, RTree, RTreeObject};

/// Exact distance between a query point and one element.
pub trait ElementDistance<const D: usize> {
    /// `(distance, closest point)` from `point` to `element`.
    fn distance(&self, point: &[f64; D], element: usize)
    -> Result<(f64, [f64; D]), StrataError>;
}

#[derive(Clone, Debug)]
struct ElementBox {
    element: usize,
    envelope: AABB<[f64; 3]>,
}

impl RTreeObject for ElementBox {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for ElementBox {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.envelope.distance_2(point)
    }
}

fn lift<const D: usize>(p: &[f64; D]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, v) in out.iter_mut().zip(p) {
        *o = *v;
    }
    out
}

/// Result of [`AabbTree::closest_element`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestElement<const D: usize> {
    pub element: usize,
    pub distance: f64,
    pub closest_point: [f64; D],
}

#[derive(Clone, Debug)]
pub struct AabbTree<const D: usize> {
    tree: RTree<ElementBox>,
    boxes: Vec<BoundingBox<D>>,
}

impl<const D: usize> AabbTree<D> {
    /// Bulk-loads one box per element; `boxes[i]` belongs to element `i`.
    /// Empty boxes are kept for indexing but never returned.
    pub fn new(boxes: Vec<BoundingBox<D>>) -> Self {
        let entries = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_empty())
            .map(|(element, b)| ElementBox {
                element,
                envelope: AABB::from_corners(lift(b.min()), lift(b.max())),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            boxes,
        }
    }

    #[inline]
    pub fn nb_elements(&self) -> usize {
        self.boxes.len()
    }

    pub fn element_box(&self, element: usize) -> Option<&BoundingBox<D>> {
        self.boxes.get(element)
    }

    /// Union of every element box.
    pub fn bounding_box(&self) -> BoundingBox<D> {
        let mut bbox = BoundingBox::new();
        for b in &self.boxes {
            bbox.add_box(b);
        }
        bbox
    }

    /// Elements whose box contains `point`.
    pub fn elements_with_box_containing(&self, point: &[f64; D]) -> Vec<usize> {
        let envelope = AABB::from_point(lift(point));
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.element)
            .collect()
    }

    /// Element closest to `point` under `distance`.
    ///
    /// Boxes are visited by increasing box distance; the search stops once
    /// the next box is farther than the best exact distance found.
    pub fn closest_element(
        &self,
        point: &[f64; D],
        distance: &impl ElementDistance<D>,
    ) -> Result<Option<ClosestElement<D>>, StrataError> {
        let query = lift(point);
        let mut best: Option<ClosestElement<D>> = None;
        for (entry, box_distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            if let Some(b) = &best {
                if box_distance_2 > b.distance * b.distance {
                    break;
                }
            }
            let (d, closest_point) = distance.distance(point, entry.element)?;
            if best.is_none_or(|b| d < b.distance) {
                best = Some(ClosestElement {
                    element: entry.element,
                    distance: d,
                    closest_point,
                });
            }
            if d == 0.0 {
                break;
            }
        }
        Ok(best)
    }
}
