//! Point location and barycentric interpolation over one block mesh.
//!
//! [`ScalarFieldQuery`] names a per-vertex attribute of a [`SimplexMesh`] and
//! owns the lazily built geometric [`AabbTree`] of that mesh. The tree sits in
//! a `OnceCell`: concurrent first queries block on a single build, later
//! queries read it without synchronisation. Mutators of the mesh geometry
//! must call [`InvalidateCache::invalidate_cache`].

use crate::data::attribute::VertexSection;
use crate::geometry::aabb::{AabbTree, ElementDistance};
use crate::geometry::bbox::BoundingBox;
use crate::geometry::simplex::{GLOBAL_EPSILON, barycentric_coordinates};
use crate::mesh::simplex_mesh::SimplexMesh;
use crate::strata_error::StrataError;
use crate::topology::cache::InvalidateCache;
use once_cell::sync::OnceCell;

/// Tuning of point-location queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryConfig {
    /// A point is inside an element when its distance to it is below this.
    pub containment_tolerance: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            containment_tolerance: GLOBAL_EPSILON,
        }
    }
}

impl<const D: usize> ElementDistance<D> for SimplexMesh<D> {
    fn distance(
        &self,
        point: &[f64; D],
        element: usize,
    ) -> Result<(f64, [f64; D]), StrataError> {
        self.cell_distance(point, element)
    }
}

/// Builds an element tree, computing each element box in its own slot.
pub(crate) fn build_element_tree<const D: usize, F>(nb_elements: usize, element_box: F) -> AabbTree<D>
where
    F: Fn(usize) -> BoundingBox<D> + Sync + Send,
{
    let mut boxes = vec![BoundingBox::new(); nb_elements];
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        boxes
            .par_iter_mut()
            .enumerate()
            .for_each(|(element, slot)| *slot = element_box(element));
    }
    #[cfg(not(feature = "rayon"))]
    boxes
        .iter_mut()
        .enumerate()
        .for_each(|(element, slot)| *slot = element_box(element));
    AabbTree::new(boxes)
}

/// Barycentric interpolation of `section` over `cell` at `point`.
///
/// A point equal to a cell vertex returns that vertex's stored slice
/// unchanged, so interpolation at vertices is exact.
pub(crate) fn interpolate<const D: usize>(
    mesh: &SimplexMesh<D>,
    section: &VertexSection,
    point: &[f64; D],
    cell: usize,
) -> Result<Vec<f64>, StrataError> {
    let vertices = mesh.cell_vertices(cell)?;
    for &v in vertices {
        if mesh.point(v)? == point {
            return Ok(section.try_restrict(v)?.to_vec());
        }
    }
    let weights = barycentric_coordinates(point, &mesh.cell_points(cell)?)?;
    let mut value = vec![0.0; section.width()];
    for (&v, w) in vertices.iter().zip(weights) {
        for (acc, x) in value.iter_mut().zip(section.try_restrict(v)?) {
            *acc += w * x;
        }
    }
    Ok(value)
}

#[derive(Debug)]
pub struct ScalarFieldQuery<const D: usize> {
    attribute: String,
    config: QueryConfig,
    tree: OnceCell<AabbTree<D>>,
}

impl<const D: usize> ScalarFieldQuery<D> {
    pub fn new(attribute: &str, config: QueryConfig) -> Self {
        Self {
            attribute: attribute.to_owned(),
            config,
            tree: OnceCell::new(),
        }
    }

    #[inline]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[inline]
    pub fn config(&self) -> QueryConfig {
        self.config
    }

    pub fn set_config(&mut self, config: QueryConfig) {
        self.config = config;
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.tree.get().is_some()
    }

    /// Geometric tree of `mesh`, built on first call.
    pub fn ensure_built(&self, mesh: &SimplexMesh<D>) -> &AabbTree<D> {
        self.tree.get_or_init(|| {
            build_element_tree(mesh.nb_cells(), |cell| {
                mesh.cell_bounding_box(cell).unwrap_or_default()
            })
        })
    }

    /// Cell containing `point`, or `None` when the point is outside `mesh`.
    pub fn containing_element(
        &self,
        mesh: &SimplexMesh<D>,
        point: &[f64; D],
    ) -> Result<Option<usize>, StrataError> {
        let closest = self.ensure_built(mesh).closest_element(point, mesh)?;
        Ok(closest
            .filter(|c| c.distance < self.config.containment_tolerance)
            .map(|c| c.element))
    }

    fn section<'m>(&self, mesh: &'m SimplexMesh<D>) -> Result<&'m VertexSection, StrataError> {
        let section = mesh.vertex_attributes().require(&self.attribute)?;
        if section.width() != 1 {
            return Err(StrataError::AttributeWidthMismatch {
                name: self.attribute.clone(),
                expected: 1,
                found: section.width(),
            });
        }
        Ok(section)
    }

    /// Stored value at `vertex`.
    pub fn value_at_vertex(&self, mesh: &SimplexMesh<D>, vertex: usize) -> Result<f64, StrataError> {
        self.section(mesh)?.scalar(vertex)
    }

    /// Interpolated value at `point` over `cell`; containment is not checked.
    pub fn value_in_element(
        &self,
        mesh: &SimplexMesh<D>,
        point: &[f64; D],
        cell: usize,
    ) -> Result<f64, StrataError> {
        let value = interpolate(mesh, self.section(mesh)?, point, cell)?;
        Ok(value[0])
    }

    /// Interpolated value at `point`, or `None` outside `mesh`.
    pub fn value(
        &self,
        mesh: &SimplexMesh<D>,
        point: &[f64; D],
    ) -> Result<Option<f64>, StrataError> {
        // Check the attribute first so a missing one is reported even for
        // points outside the mesh.
        self.section(mesh)?;
        match self.containing_element(mesh, point)? {
            Some(cell) => self.value_in_element(mesh, point, cell).map(Some),
            None => Ok(None),
        }
    }
}

impl<const D: usize> InvalidateCache for ScalarFieldQuery<D> {
    fn invalidate_cache(&mut self) {
        self.tree.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tetrahedra sharing the face (1, 2, 3); value = x + 2y + 3z.
    fn two_tets() -> SimplexMesh<3> {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ];
        let mut mesh = SimplexMesh::from_parts(points, &[0, 1, 2, 3, 1, 2, 3, 4]).unwrap();
        let values: Vec<f64> = mesh
            .points()
            .iter()
            .map(|p| p[0] + 2.0 * p[1] + 3.0 * p[2])
            .collect();
        let section = mesh
            .vertex_attributes_mut()
            .find_or_create("f", &[0.0])
            .unwrap();
        for (v, x) in values.into_iter().enumerate() {
            section.try_set(v, &[x]).unwrap();
        }
        mesh
    }

    #[test]
    fn tree_is_built_lazily_and_invalidated() {
        let mesh = two_tets();
        let mut q = ScalarFieldQuery::new("f", QueryConfig::default());
        assert!(!q.is_built());
        assert_eq!(q.ensure_built(&mesh).nb_elements(), 2);
        assert!(q.is_built());
        q.invalidate_cache();
        assert!(!q.is_built());
    }

    #[test]
    fn linear_field_is_reproduced() {
        let mesh = two_tets();
        let q = ScalarFieldQuery::new("f", QueryConfig::default());
        let p = [0.5, 0.5, 0.5];
        let cell = q.containing_element(&mesh, &p).unwrap().unwrap();
        assert_eq!(cell, 1);
        let v = q.value(&mesh, &p).unwrap().unwrap();
        assert!((v - 3.0).abs() < 1e-12);
    }

    #[test]
    fn vertex_values_are_exact() {
        let mesh = two_tets();
        let q = ScalarFieldQuery::new("f", QueryConfig::default());
        for v in 0..mesh.nb_vertices() {
            let p = *mesh.point(v).unwrap();
            assert_eq!(
                q.value(&mesh, &p).unwrap(),
                Some(q.value_at_vertex(&mesh, v).unwrap())
            );
        }
    }

    #[test]
    fn outside_point_is_not_an_error() {
        let mesh = two_tets();
        let q = ScalarFieldQuery::new("f", QueryConfig::default());
        assert_eq!(q.containing_element(&mesh, &[5.0, 5.0, 5.0]).unwrap(), None);
        assert_eq!(q.value(&mesh, &[5.0, 5.0, 5.0]).unwrap(), None);
    }

    #[test]
    fn tolerance_accepts_near_misses() {
        let mesh = two_tets();
        let loose = ScalarFieldQuery::new(
            "f",
            QueryConfig {
                containment_tolerance: 0.1,
            },
        );
        assert_eq!(
            loose.containing_element(&mesh, &[-0.05, 0.1, 0.1]).unwrap(),
            Some(0)
        );
        let strict = ScalarFieldQuery::new("f", QueryConfig::default());
        assert_eq!(
            strict.containing_element(&mesh, &[-0.05, 0.1, 0.1]).unwrap(),
            None
        );
    }

    #[test]
    fn missing_attribute_is_a_precondition_violation() {
        let mesh = two_tets();
        let q = ScalarFieldQuery::new("absent", QueryConfig::default());
        assert!(matches!(
            q.value_at_vertex(&mesh, 0),
            Err(StrataError::PreconditionViolated(_))
        ));
        assert!(matches!(
            q.value(&mesh, &[9.0, 9.0, 9.0]),
            Err(StrataError::PreconditionViolated(_))
        ));
    }
}
