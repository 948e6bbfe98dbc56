//! The implicit model aggregate.
//!
//! An [`ImplicitModel`] composes the pieces a stratigraphic model needs:
//!
//! - the block/boundary [`ModelTopology`] and one [`SimplexMesh`] per block,
//! - horizon collections (horizon -> boundaries) and unit containers
//!   (stratigraphic unit -> blocks), both keyed by stack ids,
//! - the [`HorizonsStack`] and the per-horizon isovalues,
//! - one [`ScalarFieldQuery`] and one [`CoordinateTransform`] per block,
//!   each owning its lazily built element tree.
//!
//! All reads live here; every mutation goes through
//! [`ImplicitModelBuilder`](crate::implicit::builder::ImplicitModelBuilder).

use crate::geometry::bbox::BoundingBox;
use crate::implicit::coordinate_transform::CoordinateTransform;
use crate::implicit::scalar_field::{QueryConfig, ScalarFieldQuery};
use crate::implicit::stratigraphic_point::StratigraphicPoint;
use crate::mesh::simplex_mesh::SimplexMesh;
use crate::stack::horizons_stack::HorizonsStack;
use crate::strata_error::StrataError;
use crate::topology::cache::InvalidateCache;
use crate::topology::collections::Collections;
use crate::topology::component::ComponentType;
use crate::topology::component_id::ComponentId;
use crate::topology::model_topology::ModelTopology;
use std::collections::BTreeMap;

/// Vertex attribute holding the implicit value.
pub const IMPLICIT_ATTRIBUTE_NAME: &str = "strata_implicit_value";
/// Vertex attribute holding the restored location (`D - 1` values).
pub const STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME: &str = "strata_stratigraphic_location";

/// How horizon isovalues evolve from the bottom of the stack to its top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsovalueDirection {
    Increasing,
    Decreasing,
}

/// Mesh and query caches of one block.
#[derive(Debug)]
pub(crate) struct BlockGeometry<const D: usize> {
    pub(crate) mesh: SimplexMesh<D>,
    pub(crate) implicit: ScalarFieldQuery<D>,
    pub(crate) transform: CoordinateTransform<D>,
}

impl<const D: usize> BlockGeometry<D> {
    pub(crate) fn new(mesh: SimplexMesh<D>, config: QueryConfig) -> Self {
        Self {
            mesh,
            implicit: ScalarFieldQuery::new(IMPLICIT_ATTRIBUTE_NAME, config),
            transform: CoordinateTransform::new(
                STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME,
                IMPLICIT_ATTRIBUTE_NAME,
                config,
            ),
        }
    }
}

impl<const D: usize> InvalidateCache for BlockGeometry<D> {
    fn invalidate_cache(&mut self) {
        self.implicit.invalidate_cache();
        self.transform.invalidate_cache();
    }
}

#[derive(Debug)]
pub struct ImplicitModel<const D: usize> {
    pub(crate) topology: ModelTopology,
    pub(crate) blocks: BTreeMap<ComponentId, BlockGeometry<D>>,
    pub(crate) horizon_collections: Collections,
    pub(crate) unit_containers: Collections,
    pub(crate) stack: HorizonsStack,
    pub(crate) horizon_isovalues: BTreeMap<ComponentId, f64>,
    pub(crate) config: QueryConfig,
}

/// 3-D model: tetrahedral blocks, 2-D restored location.
pub type StratigraphicModel = ImplicitModel<3>;
/// 2-D cross-section: triangular blocks, 1-D restored location.
pub type StratigraphicSection = ImplicitModel<2>;

impl<const D: usize> Default for ImplicitModel<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> ImplicitModel<D> {
    const VALID_DIMENSION: () = assert!(D == 2 || D == 3, "implicit models are 2-D or 3-D");

    pub fn new() -> Self {
        let () = Self::VALID_DIMENSION;
        Self {
            topology: ModelTopology::new(),
            blocks: BTreeMap::new(),
            horizon_collections: Collections::new(ComponentType::Horizon),
            unit_containers: Collections::new(ComponentType::StratigraphicUnit),
            stack: HorizonsStack::new(),
            horizon_isovalues: BTreeMap::new(),
            config: QueryConfig::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Parts
    // -------------------------------------------------------------------------

    #[inline]
    pub fn topology(&self) -> &ModelTopology {
        &self.topology
    }

    #[inline]
    pub fn horizons_stack(&self) -> &HorizonsStack {
        &self.stack
    }

    #[inline]
    pub fn config(&self) -> QueryConfig {
        self.config
    }

    /// Horizon -> boundary membership.
    #[inline]
    pub fn horizon_collections(&self) -> &Collections {
        &self.horizon_collections
    }

    /// Stratigraphic unit -> block membership.
    #[inline]
    pub fn stratigraphic_unit_containers(&self) -> &Collections {
        &self.unit_containers
    }

    pub fn blocks(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.blocks.keys().copied()
    }

    #[inline]
    pub fn nb_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub(crate) fn block(&self, block: ComponentId) -> Result<&BlockGeometry<D>, StrataError> {
        self.blocks
            .get(&block)
            .ok_or(StrataError::block_not_found(block))
    }

    pub fn block_mesh(&self, block: ComponentId) -> Result<&SimplexMesh<D>, StrataError> {
        Ok(&self.block(block)?.mesh)
    }

    // -------------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------------

    /// Unit container holding `block`, if any.
    pub fn stratigraphic_unit_of_block(&self, block: ComponentId) -> Option<ComponentId> {
        self.unit_containers.collections_of(block).next()
    }

    /// Horizon owning `boundary`, if any.
    pub fn horizon_of_boundary(&self, boundary: ComponentId) -> Option<ComponentId> {
        self.horizon_collections.collections_of(boundary).next()
    }

    pub fn is_block_in_stratigraphic_unit(&self, block: ComponentId, unit: ComponentId) -> bool {
        self.unit_containers.is_item(block, unit)
    }

    pub fn nb_blocks_in_stratigraphic_unit(&self, unit: ComponentId) -> usize {
        self.unit_containers.nb_items(unit)
    }

    // -------------------------------------------------------------------------
    // Implicit values
    // -------------------------------------------------------------------------

    pub fn implicit_value_at_vertex(
        &self,
        block: ComponentId,
        vertex: usize,
    ) -> Result<f64, StrataError> {
        let b = self.block(block)?;
        b.implicit.value_at_vertex(&b.mesh, vertex)
    }

    /// Interpolated over `cell`; containment is not checked.
    pub fn implicit_value_in_element(
        &self,
        block: ComponentId,
        point: &[f64; D],
        cell: usize,
    ) -> Result<f64, StrataError> {
        let b = self.block(block)?;
        b.implicit.value_in_element(&b.mesh, point, cell)
    }

    /// `None` when `point` is outside `block`.
    pub fn implicit_value(
        &self,
        block: ComponentId,
        point: &[f64; D],
    ) -> Result<Option<f64>, StrataError> {
        let b = self.block(block)?;
        b.implicit.value(&b.mesh, point)
    }

    pub fn containing_element(
        &self,
        block: ComponentId,
        point: &[f64; D],
    ) -> Result<Option<usize>, StrataError> {
        let b = self.block(block)?;
        b.implicit.containing_element(&b.mesh, point)
    }

    /// First block, in id order, with an element containing `point`.
    pub fn containing_block(
        &self,
        point: &[f64; D],
    ) -> Result<Option<(ComponentId, usize)>, StrataError> {
        for (&id, b) in &self.blocks {
            if let Some(cell) = b.implicit.containing_element(&b.mesh, point)? {
                return Ok(Some((id, cell)));
            }
        }
        Ok(None)
    }

    // -------------------------------------------------------------------------
    // Horizon isovalues
    // -------------------------------------------------------------------------

    pub fn horizon_implicit_value(&self, horizon: ComponentId) -> Option<f64> {
        self.horizon_isovalues.get(&horizon).copied()
    }

    /// Direction of the isovalues of the stack horizons, bottom to top.
    ///
    /// Horizons without an isovalue are skipped. Two consecutive valued
    /// horizons with equal isovalues, or a change of direction along the
    /// stack, fail with [`StrataError::InvalidStack`] naming both horizons.
    /// With a single valued horizon the direction is `Increasing`.
    pub fn isovalue_direction(&self) -> Result<IsovalueDirection, StrataError> {
        if self.stack.bottom_horizon().is_none() {
            return Err(StrataError::InvalidStack(
                "top and bottom horizons have not been computed".into(),
            ));
        }
        let mut direction = None;
        let mut previous: Option<(ComponentId, f64)> = None;
        for horizon in self.stack.bottom_to_top_horizons() {
            let Some(value) = self.horizon_implicit_value(horizon) else {
                continue;
            };
            if let Some((prev, prev_value)) = previous {
                let step = if value > prev_value {
                    IsovalueDirection::Increasing
                } else if value < prev_value {
                    IsovalueDirection::Decreasing
                } else {
                    return Err(StrataError::InvalidStack(format!(
                        "horizons `{}` and `{}` share the isovalue {value}",
                        self.stack.display_name(prev),
                        self.stack.display_name(horizon)
                    )));
                };
                match direction {
                    None => direction = Some(step),
                    Some(d) if d != step => {
                        return Err(StrataError::InvalidStack(format!(
                            "isovalues of horizons `{}` ({prev_value}) and `{}` ({value}) \
                             reverse the direction of the stack",
                            self.stack.display_name(prev),
                            self.stack.display_name(horizon)
                        )));
                    }
                    Some(_) => {}
                }
            }
            previous = Some((horizon, value));
        }
        if previous.is_none() {
            return Err(StrataError::PreconditionViolated(
                "no horizon of the stack has an isovalue".into(),
            ));
        }
        Ok(direction.unwrap_or(IsovalueDirection::Increasing))
    }

    /// `true` if `value` lies on the upper side of `horizon`. A value equal
    /// to the isovalue counts as above when isovalues increase upward.
    pub fn implicit_value_is_above_horizon(
        &self,
        value: f64,
        horizon: ComponentId,
    ) -> Result<bool, StrataError> {
        let isovalue = self.horizon_implicit_value(horizon).ok_or_else(|| {
            StrataError::PreconditionViolated(format!(
                "horizon `{}` has no isovalue",
                self.stack.display_name(horizon)
            ))
        })?;
        Ok(match self.isovalue_direction()? {
            IsovalueDirection::Increasing => value >= isovalue,
            IsovalueDirection::Decreasing => value < isovalue,
        })
    }

    /// Unit whose horizons bracket `value`.
    ///
    /// `None` when the value falls under the bottom or over the top of the
    /// stack without a unit there, or when a horizon met on the way up has
    /// no isovalue.
    pub fn containing_stratigraphic_unit(
        &self,
        value: f64,
    ) -> Result<Option<ComponentId>, StrataError> {
        self.isovalue_direction()?;
        let mut last = None;
        for horizon in self.stack.bottom_to_top_horizons() {
            if self.horizon_implicit_value(horizon).is_none() {
                return Ok(None);
            }
            if !self.implicit_value_is_above_horizon(value, horizon)? {
                return self.stack.under(horizon);
            }
            last = Some(horizon);
        }
        match last {
            Some(top) => self.stack.above(top),
            None => Ok(None),
        }
    }

    // -------------------------------------------------------------------------
    // Stratigraphic coordinates
    // -------------------------------------------------------------------------

    pub fn stratigraphic_coordinates_at_vertex(
        &self,
        block: ComponentId,
        vertex: usize,
    ) -> Result<StratigraphicPoint<D>, StrataError> {
        let b = self.block(block)?;
        b.transform.stratigraphic_coordinates_at_vertex(&b.mesh, vertex)
    }

    pub fn stratigraphic_coordinates_in_element(
        &self,
        block: ComponentId,
        point: &[f64; D],
        cell: usize,
    ) -> Result<StratigraphicPoint<D>, StrataError> {
        let b = self.block(block)?;
        b.transform
            .stratigraphic_coordinates_in_element(&b.mesh, point, cell)
    }

    /// `None` when `point` is outside `block`.
    pub fn stratigraphic_coordinates(
        &self,
        block: ComponentId,
        point: &[f64; D],
    ) -> Result<Option<StratigraphicPoint<D>>, StrataError> {
        let b = self.block(block)?;
        b.transform
            .stratigraphic_coordinates(&b.mesh, &b.implicit, point)
    }

    pub fn stratigraphic_containing_element(
        &self,
        block: ComponentId,
        point: &StratigraphicPoint<D>,
    ) -> Result<Option<usize>, StrataError> {
        let b = self.block(block)?;
        b.transform.stratigraphic_containing_element(&b.mesh, point)
    }

    pub fn geometric_coordinates_in_element(
        &self,
        block: ComponentId,
        point: &StratigraphicPoint<D>,
        cell: usize,
    ) -> Result<[f64; D], StrataError> {
        let b = self.block(block)?;
        b.transform
            .geometric_coordinates_in_element(&b.mesh, point, cell)
    }

    /// `None` when `point` is outside the restored image of `block`.
    pub fn geometric_coordinates(
        &self,
        block: ComponentId,
        point: &StratigraphicPoint<D>,
    ) -> Result<Option<[f64; D]>, StrataError> {
        let b = self.block(block)?;
        b.transform.geometric_coordinates(&b.mesh, point)
    }

    /// Cells of `block` folded over in restored space.
    pub fn invalid_stratigraphic_elements(
        &self,
        block: ComponentId,
    ) -> Result<Vec<usize>, StrataError> {
        let b = self.block(block)?;
        b.transform.invalid_stratigraphic_elements(&b.mesh)
    }

    // -------------------------------------------------------------------------
    // Bounding boxes
    // -------------------------------------------------------------------------

    pub fn bounding_box(&self) -> BoundingBox<D> {
        let mut bbox = BoundingBox::new();
        for b in self.blocks.values() {
            bbox.add_box(&b.mesh.bounding_box());
        }
        bbox
    }

    /// Union of the restored-space boxes of every block.
    pub fn stratigraphic_bounding_box(&self) -> Result<BoundingBox<D>, StrataError> {
        let mut bbox = BoundingBox::new();
        for b in self.blocks.values() {
            bbox.add_box(&b.transform.stratigraphic_bounding_box(&b.mesh)?);
        }
        Ok(bbox)
    }
}
