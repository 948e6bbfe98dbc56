//! Simplicial mesh of one block: triangles for `D = 2`, tetrahedra for `D = 3`.
//!
//! Cells are stored flat, `D + 1` vertex indices per cell, and are validated
//! on insertion so every later index into the vertex array is in range.

use crate::data::attribute::AttributeManager;
use crate::geometry::bbox::BoundingBox;
use crate::geometry::simplex::{point_simplex_distance, signed_measure};
use crate::strata_error::StrataError;

#[derive(Clone, Debug, Default)]
pub struct SimplexMesh<const D: usize> {
    points: Vec<[f64; D]>,
    cells: Vec<usize>,
    attributes: AttributeManager,
}

impl<const D: usize> SimplexMesh<D> {
    /// Vertices per cell.
    pub const CELL_SIZE: usize = D + 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from points and a flat cell list, `D + 1` indices per cell.
    pub fn from_parts(points: Vec<[f64; D]>, cells: &[usize]) -> Result<Self, StrataError> {
        if cells.len() % Self::CELL_SIZE != 0 {
            return Err(StrataError::DimensionMismatch {
                expected: Self::CELL_SIZE,
                found: cells.len() % Self::CELL_SIZE,
            });
        }
        let mut mesh = Self::new();
        for p in points {
            mesh.add_vertex(p);
        }
        for cell in cells.chunks_exact(Self::CELL_SIZE) {
            mesh.add_cell(cell)?;
        }
        Ok(mesh)
    }

    pub fn add_vertex(&mut self, point: [f64; D]) -> usize {
        self.points.push(point);
        self.attributes.resize(self.points.len());
        self.points.len() - 1
    }

    pub fn add_cell(&mut self, vertices: &[usize]) -> Result<usize, StrataError> {
        if vertices.len() != Self::CELL_SIZE {
            return Err(StrataError::DimensionMismatch {
                expected: Self::CELL_SIZE,
                found: vertices.len(),
            });
        }
        if let Some(&v) = vertices.iter().find(|&&v| v >= self.points.len()) {
            return Err(StrataError::VertexOutOfRange {
                vertex: v,
                nb_vertices: self.points.len(),
            });
        }
        self.cells.extend_from_slice(vertices);
        Ok(self.nb_cells() - 1)
    }

    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn nb_cells(&self) -> usize {
        self.cells.len() / Self::CELL_SIZE
    }

    pub fn point(&self, vertex: usize) -> Result<&[f64; D], StrataError> {
        self.points.get(vertex).ok_or(StrataError::VertexOutOfRange {
            vertex,
            nb_vertices: self.points.len(),
        })
    }

    pub fn set_point(&mut self, vertex: usize, point: [f64; D]) -> Result<(), StrataError> {
        let nb_vertices = self.points.len();
        let slot = self
            .points
            .get_mut(vertex)
            .ok_or(StrataError::VertexOutOfRange {
                vertex,
                nb_vertices,
            })?;
        *slot = point;
        Ok(())
    }

    pub fn points(&self) -> &[[f64; D]] {
        &self.points
    }

    /// Vertex indices of `cell`.
    pub fn cell_vertices(&self, cell: usize) -> Result<&[usize], StrataError> {
        if cell >= self.nb_cells() {
            return Err(StrataError::CellOutOfRange {
                cell,
                nb_cells: self.nb_cells(),
            });
        }
        let start = cell * Self::CELL_SIZE;
        Ok(&self.cells[start..start + Self::CELL_SIZE])
    }

    /// Corner positions of `cell`, in cell-vertex order.
    pub fn cell_points(&self, cell: usize) -> Result<Vec<[f64; D]>, StrataError> {
        Ok(self
            .cell_vertices(cell)?
            .iter()
            .map(|&v| self.points[v])
            .collect())
    }

    pub fn cell_bounding_box(&self, cell: usize) -> Result<BoundingBox<D>, StrataError> {
        Ok(BoundingBox::from_points(
            self.cell_vertices(cell)?.iter().map(|&v| &self.points[v]),
        ))
    }

    pub fn cell_signed_measure(&self, cell: usize) -> Result<f64, StrataError> {
        signed_measure(&self.cell_points(cell)?)
    }

    /// `(distance, closest point)` from `point` to `cell`.
    pub fn cell_distance(
        &self,
        point: &[f64; D],
        cell: usize,
    ) -> Result<(f64, [f64; D]), StrataError> {
        Ok(point_simplex_distance(point, &self.cell_points(cell)?))
    }

    pub fn bounding_box(&self) -> BoundingBox<D> {
        BoundingBox::from_points(&self.points)
    }

    #[inline]
    pub fn vertex_attributes(&self) -> &AttributeManager {
        &self.attributes
    }

    #[inline]
    pub fn vertex_attributes_mut(&mut self) -> &mut AttributeManager {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> SimplexMesh<2> {
        SimplexMesh::from_parts(
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            &[0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn counts_and_cells() {
        let mesh = unit_square();
        assert_eq!(mesh.nb_vertices(), 4);
        assert_eq!(mesh.nb_cells(), 2);
        assert_eq!(mesh.cell_vertices(1).unwrap(), &[0, 2, 3]);
        assert!((mesh.cell_signed_measure(0).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(mesh.bounding_box().max(), &[1.0, 1.0]);
    }

    #[test]
    fn invalid_cells_are_rejected() {
        let mut mesh = unit_square();
        assert_eq!(
            mesh.add_cell(&[0, 1, 9]).unwrap_err(),
            StrataError::VertexOutOfRange {
                vertex: 9,
                nb_vertices: 4
            }
        );
        assert!(matches!(
            mesh.add_cell(&[0, 1]),
            Err(StrataError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            mesh.cell_vertices(2),
            Err(StrataError::CellOutOfRange { cell: 2, nb_cells: 2 })
        ));
    }

    #[test]
    fn attributes_follow_vertex_count() {
        let mut mesh = unit_square();
        mesh.vertex_attributes_mut()
            .find_or_create("implicit", &[0.0])
            .unwrap();
        mesh.add_vertex([2.0, 2.0]);
        let section = mesh.vertex_attributes().find("implicit").unwrap();
        assert_eq!(section.nb_vertices(), 5);
    }
}
