//! Geometric <-> restored-space mapping over one block mesh.
//!
//! The stratigraphic coordinate of a vertex is its restored location
//! (`D - 1` values) followed by its implicit value. The forward mapping
//! interpolates both attributes; the inverse solves barycentric weights in
//! restored space and blends the geometric vertex positions with them.
//!
//! Restored-space containment uses its own element tree. Any change of a
//! vertex location or implicit value invalidates it; the mutator is
//! responsible for calling [`InvalidateCache::invalidate_cache`].

use crate::data::attribute::VertexSection;
use crate::geometry::aabb::{AabbTree, ElementDistance};
use crate::geometry::bbox::BoundingBox;
use crate::geometry::simplex::{barycentric_coordinates, point_simplex_distance, signed_measure};
use crate::implicit::scalar_field::{
    QueryConfig, ScalarFieldQuery, build_element_tree, interpolate,
};
use crate::implicit::stratigraphic_point::StratigraphicPoint;
use crate::mesh::simplex_mesh::SimplexMesh;
use crate::strata_error::StrataError;
use crate::topology::cache::InvalidateCache;
use once_cell::sync::OnceCell;

/// Location and implicit sections of one mesh, width-checked.
#[derive(Clone, Copy)]
struct RestoredSections<'m, const D: usize> {
    mesh: &'m SimplexMesh<D>,
    location: &'m VertexSection,
    implicit: &'m VertexSection,
}

impl<'m, const D: usize> RestoredSections<'m, D> {
    fn vertex(&self, vertex: usize) -> Result<[f64; D], StrataError> {
        let mut coords = [0.0; D];
        coords[..D - 1].copy_from_slice(self.location.try_restrict(vertex)?);
        coords[D - 1] = self.implicit.scalar(vertex)?;
        Ok(coords)
    }

    fn cell(&self, cell: usize) -> Result<Vec<[f64; D]>, StrataError> {
        self.mesh
            .cell_vertices(cell)?
            .iter()
            .map(|&v| self.vertex(v))
            .collect()
    }
}

impl<const D: usize> ElementDistance<D> for RestoredSections<'_, D> {
    fn distance(
        &self,
        point: &[f64; D],
        element: usize,
    ) -> Result<(f64, [f64; D]), StrataError> {
        Ok(point_simplex_distance(point, &self.cell(element)?))
    }
}

#[derive(Debug)]
pub struct CoordinateTransform<const D: usize> {
    location_attribute: String,
    implicit_attribute: String,
    config: QueryConfig,
    tree: OnceCell<AabbTree<D>>,
}

impl<const D: usize> CoordinateTransform<D> {
    pub fn new(location_attribute: &str, implicit_attribute: &str, config: QueryConfig) -> Self {
        Self {
            location_attribute: location_attribute.to_owned(),
            implicit_attribute: implicit_attribute.to_owned(),
            config,
            tree: OnceCell::new(),
        }
    }

    pub fn set_config(&mut self, config: QueryConfig) {
        self.config = config;
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.tree.get().is_some()
    }

    fn sections<'m>(&self, mesh: &'m SimplexMesh<D>) -> Result<RestoredSections<'m, D>, StrataError> {
        let attributes = mesh.vertex_attributes();
        let location = attributes.require(&self.location_attribute)?;
        let implicit = attributes.require(&self.implicit_attribute)?;
        for (name, section, expected) in [
            (&self.location_attribute, location, D - 1),
            (&self.implicit_attribute, implicit, 1),
        ] {
            if section.width() != expected {
                return Err(StrataError::AttributeWidthMismatch {
                    name: name.clone(),
                    expected,
                    found: section.width(),
                });
            }
        }
        Ok(RestoredSections {
            mesh,
            location,
            implicit,
        })
    }

    /// Restored-space tree of `mesh`, built on first call.
    pub fn ensure_built(&self, mesh: &SimplexMesh<D>) -> Result<&AabbTree<D>, StrataError> {
        self.tree.get_or_try_init(|| {
            let sections = self.sections(mesh)?;
            Ok(build_element_tree(mesh.nb_cells(), |cell| {
                sections
                    .cell(cell)
                    .map(|points| BoundingBox::from_points(&points))
                    .unwrap_or_default()
            }))
        })
    }

    /// Union of every restored element box.
    pub fn stratigraphic_bounding_box(
        &self,
        mesh: &SimplexMesh<D>,
    ) -> Result<BoundingBox<D>, StrataError> {
        Ok(self.ensure_built(mesh)?.bounding_box())
    }

    pub fn stratigraphic_coordinates_at_vertex(
        &self,
        mesh: &SimplexMesh<D>,
        vertex: usize,
    ) -> Result<StratigraphicPoint<D>, StrataError> {
        Ok(StratigraphicPoint::from_coordinates(
            self.sections(mesh)?.vertex(vertex)?,
        ))
    }

    /// Forward mapping over `cell`; containment is not checked.
    pub fn stratigraphic_coordinates_in_element(
        &self,
        mesh: &SimplexMesh<D>,
        point: &[f64; D],
        cell: usize,
    ) -> Result<StratigraphicPoint<D>, StrataError> {
        let sections = self.sections(mesh)?;
        let location = interpolate(mesh, sections.location, point, cell)?;
        let implicit = interpolate(mesh, sections.implicit, point, cell)?;
        StratigraphicPoint::new(&location, implicit[0])
    }

    /// Forward mapping; `None` when `point` is outside the mesh.
    pub fn stratigraphic_coordinates(
        &self,
        mesh: &SimplexMesh<D>,
        geometry: &ScalarFieldQuery<D>,
        point: &[f64; D],
    ) -> Result<Option<StratigraphicPoint<D>>, StrataError> {
        match geometry.containing_element(mesh, point)? {
            Some(cell) => self
                .stratigraphic_coordinates_in_element(mesh, point, cell)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Cell whose restored simplex contains `point`.
    pub fn stratigraphic_containing_element(
        &self,
        mesh: &SimplexMesh<D>,
        point: &StratigraphicPoint<D>,
    ) -> Result<Option<usize>, StrataError> {
        let sections = self.sections(mesh)?;
        let closest = self
            .ensure_built(mesh)?
            .closest_element(point.stratigraphic_coordinates(), &sections)?;
        Ok(closest
            .filter(|c| c.distance < self.config.containment_tolerance)
            .map(|c| c.element))
    }

    /// Inverse mapping over `cell`; containment is not checked.
    ///
    /// The restored simplex is made positively oriented first by swapping its
    /// first two vertices, together with the geometric vertices they blend.
    pub fn geometric_coordinates_in_element(
        &self,
        mesh: &SimplexMesh<D>,
        point: &StratigraphicPoint<D>,
        cell: usize,
    ) -> Result<[f64; D], StrataError> {
        let sections = self.sections(mesh)?;
        let mut order = mesh.cell_vertices(cell)?.to_vec();
        let mut restored = sections.cell(cell)?;
        let target = point.stratigraphic_coordinates();
        if let Some(i) = restored.iter().position(|r| r == target) {
            return Ok(*mesh.point(order[i])?);
        }
        if signed_measure(&restored)? < 0.0 {
            restored.swap(0, 1);
            order.swap(0, 1);
        }
        let weights = barycentric_coordinates(target, &restored)?;
        let mut result = [0.0; D];
        for (&v, w) in order.iter().zip(weights) {
            let p = mesh.point(v)?;
            for d in 0..D {
                result[d] += w * p[d];
            }
        }
        Ok(result)
    }

    /// Inverse mapping; `None` when `point` is outside the restored mesh.
    pub fn geometric_coordinates(
        &self,
        mesh: &SimplexMesh<D>,
        point: &StratigraphicPoint<D>,
    ) -> Result<Option<[f64; D]>, StrataError> {
        match self.stratigraphic_containing_element(mesh, point)? {
            Some(cell) => self
                .geometric_coordinates_in_element(mesh, point, cell)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Cells whose restored simplex is not positively oriented while the
    /// geometric one is.
    pub fn invalid_stratigraphic_elements(
        &self,
        mesh: &SimplexMesh<D>,
    ) -> Result<Vec<usize>, StrataError> {
        let sections = self.sections(mesh)?;
        let mut invalid = Vec::new();
        for cell in 0..mesh.nb_cells() {
            let geometric = mesh.cell_signed_measure(cell)?;
            let restored = signed_measure(&sections.cell(cell)?)?;
            if geometric > 0.0 && restored <= 0.0 {
                invalid.push(cell);
            }
        }
        Ok(invalid)
    }
}

impl<const D: usize> InvalidateCache for CoordinateTransform<D> {
    fn invalidate_cache(&mut self) {
        self.tree.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOC: &str = "loc";
    const IMP: &str = "imp";

    /// Unit square split in two triangles, restored space = (x + 1, 2y).
    fn square() -> SimplexMesh<2> {
        let mut mesh = SimplexMesh::from_parts(
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            &[0, 1, 2, 0, 2, 3],
        )
        .unwrap();
        let points = mesh.points().to_vec();
        let attrs = mesh.vertex_attributes_mut();
        attrs.find_or_create(LOC, &[0.0]).unwrap();
        attrs.find_or_create(IMP, &[0.0]).unwrap();
        for (v, p) in points.iter().enumerate() {
            attrs.find_mut(LOC).unwrap().try_set(v, &[p[0] + 1.0]).unwrap();
            attrs.find_mut(IMP).unwrap().try_set(v, &[2.0 * p[1]]).unwrap();
        }
        mesh
    }

    fn transform() -> CoordinateTransform<2> {
        CoordinateTransform::new(LOC, IMP, QueryConfig::default())
    }

    #[test]
    fn forward_mapping_interpolates_both_attributes() {
        let mesh = square();
        let geometry = ScalarFieldQuery::new(IMP, QueryConfig::default());
        let sp = transform()
            .stratigraphic_coordinates(&mesh, &geometry, &[0.25, 0.5])
            .unwrap()
            .unwrap();
        assert!((sp.location()[0] - 1.25).abs() < 1e-12);
        assert!((sp.implicit_value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_mapping_round_trips() {
        let mesh = square();
        let t = transform();
        let sp = StratigraphicPoint::new(&[1.75], 0.5).unwrap();
        let p = t.geometric_coordinates(&mesh, &sp).unwrap().unwrap();
        assert!((p[0] - 0.75).abs() < 1e-12 && (p[1] - 0.25).abs() < 1e-12);
        assert_eq!(
            t.geometric_coordinates(&mesh, &StratigraphicPoint::new(&[9.0], 0.0).unwrap())
                .unwrap(),
            None
        );
    }

    #[test]
    fn inverse_mapping_handles_mirrored_restored_space() {
        let mut mesh = square();
        // Mirror the location axis: every restored triangle is now negative.
        mesh.vertex_attributes_mut()
            .find_mut(LOC)
            .unwrap()
            .map_in_place(|x| -x);
        let t = transform();
        assert_eq!(t.invalid_stratigraphic_elements(&mesh).unwrap(), vec![0, 1]);
        let sp = StratigraphicPoint::new(&[-1.75], 0.5).unwrap();
        let cell = t.stratigraphic_containing_element(&mesh, &sp).unwrap().unwrap();
        let p = t.geometric_coordinates_in_element(&mesh, &sp, cell).unwrap();
        assert!((p[0] - 0.75).abs() < 1e-12 && (p[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn stratigraphic_bounding_box_and_invalidation() {
        let mut mesh = square();
        let mut t = transform();
        let bbox = t.stratigraphic_bounding_box(&mesh).unwrap();
        assert_eq!(bbox.min(), &[1.0, 0.0]);
        assert_eq!(bbox.max(), &[2.0, 2.0]);

        mesh.vertex_attributes_mut()
            .find_mut(IMP)
            .unwrap()
            .map_in_place(|x| x * 10.0);
        assert_eq!(t.stratigraphic_bounding_box(&mesh).unwrap().max(), &[2.0, 2.0]);
        t.invalidate_cache();
        assert_eq!(t.stratigraphic_bounding_box(&mesh).unwrap().max(), &[2.0, 20.0]);
    }

    #[test]
    fn missing_location_attribute_is_reported() {
        let mut mesh = square();
        mesh.vertex_attributes_mut().remove(LOC);
        assert!(matches!(
            transform().stratigraphic_coordinates_at_vertex(&mesh, 0),
            Err(StrataError::PreconditionViolated(_))
        ));
    }
}
