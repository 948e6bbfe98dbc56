//! Sole mutation path of an [`ImplicitModel`].
//!
//! Every edit that moves a vertex or changes a value read by an element
//! tree invalidates that tree before returning, so readers never see a
//! stale index.

use crate::implicit::model::{
    BlockGeometry, IMPLICIT_ATTRIBUTE_NAME, ImplicitModel, STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME,
};
use crate::implicit::scalar_field::QueryConfig;
use crate::mesh::simplex_mesh::SimplexMesh;
use crate::stack::horizons_stack::{HorizonsStack, HorizonsStackBuilder};
use crate::strata_error::StrataError;
use crate::topology::cache::InvalidateCache;
use crate::topology::component::ComponentType;
use crate::topology::component_id::ComponentId;

pub struct ImplicitModelBuilder<'a, const D: usize> {
    model: &'a mut ImplicitModel<D>,
}

impl<'a, const D: usize> ImplicitModelBuilder<'a, D> {
    pub fn new(model: &'a mut ImplicitModel<D>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ImplicitModel<D> {
        self.model
    }

    /// Applies `config` to the model and to every block query.
    pub fn set_query_config(&mut self, config: QueryConfig) {
        self.model.config = config;
        for b in self.model.blocks.values_mut() {
            b.implicit.set_config(config);
            b.transform.set_config(config);
        }
    }

    // -------------------------------------------------------------------------
    // Stack
    // -------------------------------------------------------------------------

    /// Edits the model stack in place.
    pub fn horizons_stack_builder(&mut self) -> HorizonsStackBuilder<'_> {
        HorizonsStackBuilder::new(&mut self.model.stack)
    }

    /// Replaces the stack. Isovalues, horizon collections and unit
    /// containers keyed by components absent from `stack` are dropped.
    pub fn set_horizons_stack(&mut self, stack: HorizonsStack) {
        self.model
            .horizon_isovalues
            .retain(|h, _| stack.has_horizon(*h));
        let nb_horizons = self
            .model
            .horizon_collections
            .retain_collections(|h| stack.has_horizon(h));
        let nb_units = self
            .model
            .unit_containers
            .retain_collections(|u| stack.has_stratigraphic_unit(u));
        if nb_horizons + nb_units > 0 {
            log::debug!(
                "[ImplicitModel] new stack dropped {nb_horizons} horizon collection(s) and {nb_units} unit container(s)"
            );
        }
        self.model.stack = stack;
    }

    pub fn set_horizon_implicit_value(
        &mut self,
        horizon: ComponentId,
        value: f64,
    ) -> Result<(), StrataError> {
        if !self.model.stack.has_horizon(horizon) {
            return Err(StrataError::horizon_not_found(horizon));
        }
        self.model.horizon_isovalues.insert(horizon, value);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Blocks and boundaries
    // -------------------------------------------------------------------------

    pub fn add_block(&mut self, mesh: SimplexMesh<D>) -> ComponentId {
        let id = ComponentId::generate();
        self.insert_block(id, mesh);
        id
    }

    /// Adds a block under a caller-chosen id (reopening a saved model).
    pub fn add_block_with_id(
        &mut self,
        id: ComponentId,
        mesh: SimplexMesh<D>,
    ) -> Result<ComponentId, StrataError> {
        if self.model.topology.has_block(id) {
            return Err(StrataError::PreconditionViolated(format!(
                "block `{id}` already exists"
            )));
        }
        self.insert_block(id, mesh);
        Ok(id)
    }

    fn insert_block(&mut self, id: ComponentId, mesh: SimplexMesh<D>) {
        self.model.topology.add_block(id);
        self.model
            .blocks
            .insert(id, BlockGeometry::new(mesh, self.model.config));
    }

    /// Removes a block, its incidences and its unit membership.
    pub fn remove_block(&mut self, block: ComponentId) -> Result<SimplexMesh<D>, StrataError> {
        self.model.topology.remove_block(block)?;
        self.model.unit_containers.remove_item_everywhere(block);
        let geometry = self
            .model
            .blocks
            .remove(&block)
            .ok_or(StrataError::block_not_found(block))?;
        Ok(geometry.mesh)
    }

    pub fn add_boundary(&mut self) -> ComponentId {
        let id = ComponentId::generate();
        self.model.topology.add_boundary(id);
        id
    }

    /// Records that `boundary` bounds `block`.
    pub fn add_block_boundary(
        &mut self,
        block: ComponentId,
        boundary: ComponentId,
    ) -> Result<(), StrataError> {
        self.model.topology.add_block_boundary(block, boundary)
    }

    /// Makes `boundary` a part of `horizon`; the horizon collection is
    /// created on first use.
    pub fn add_boundary_in_horizon(
        &mut self,
        boundary: ComponentId,
        horizon: ComponentId,
    ) -> Result<(), StrataError> {
        if !self.model.topology.has_boundary(boundary) {
            return Err(StrataError::NotFound {
                kind: ComponentType::Boundary,
                id: boundary,
            });
        }
        if !self.model.stack.has_horizon(horizon) {
            return Err(StrataError::horizon_not_found(horizon));
        }
        self.model.horizon_collections.add_collection(horizon);
        self.model.horizon_collections.add_item(horizon, boundary)
    }

    // -------------------------------------------------------------------------
    // Unit containers
    // -------------------------------------------------------------------------

    /// Creates the container of a stack unit. Returns `true` if it was
    /// created.
    pub fn add_stratigraphic_unit_container(
        &mut self,
        unit: ComponentId,
    ) -> Result<bool, StrataError> {
        if !self.model.stack.has_stratigraphic_unit(unit) {
            return Err(StrataError::unit_not_found(unit));
        }
        Ok(self.model.unit_containers.add_collection(unit))
    }

    pub fn remove_stratigraphic_unit_container(
        &mut self,
        unit: ComponentId,
    ) -> Result<(), StrataError> {
        self.model.unit_containers.remove_collection(unit)
    }

    /// Assigns `block` to `unit`, replacing any previous assignment.
    pub fn add_block_in_stratigraphic_unit(
        &mut self,
        block: ComponentId,
        unit: ComponentId,
    ) -> Result<(), StrataError> {
        if !self.model.topology.has_block(block) {
            return Err(StrataError::block_not_found(block));
        }
        self.add_stratigraphic_unit_container(unit)?;
        self.model.unit_containers.remove_item_everywhere(block);
        self.model.unit_containers.add_item(unit, block)
    }

    // -------------------------------------------------------------------------
    // Vertex data
    // -------------------------------------------------------------------------

    /// Creates the implicit attribute (zero-filled) on every block missing it.
    pub fn instantiate_implicit_attribute_on_blocks(&mut self) -> Result<(), StrataError> {
        for b in self.model.blocks.values_mut() {
            b.mesh
                .vertex_attributes_mut()
                .find_or_create(IMPLICIT_ATTRIBUTE_NAME, &[0.0])?;
            b.transform.invalidate_cache();
        }
        Ok(())
    }

    /// Creates the restored-location attribute on every block missing it.
    pub fn instantiate_stratigraphic_location_on_blocks(&mut self) -> Result<(), StrataError> {
        let default = vec![0.0; D - 1];
        for b in self.model.blocks.values_mut() {
            b.mesh
                .vertex_attributes_mut()
                .find_or_create(STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME, &default)?;
            b.transform.invalidate_cache();
        }
        Ok(())
    }

    pub fn set_implicit_value(
        &mut self,
        block: ComponentId,
        vertex: usize,
        value: f64,
    ) -> Result<(), StrataError> {
        let b = self.block_mut(block)?;
        b.mesh
            .vertex_attributes_mut()
            .find_or_create(IMPLICIT_ATTRIBUTE_NAME, &[0.0])?
            .try_set(vertex, &[value])?;
        b.transform.invalidate_cache();
        Ok(())
    }

    pub fn set_stratigraphic_location(
        &mut self,
        block: ComponentId,
        vertex: usize,
        location: &[f64],
    ) -> Result<(), StrataError> {
        let b = self.block_mut(block)?;
        b.mesh
            .vertex_attributes_mut()
            .find_or_create(STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME, &vec![0.0; D - 1])?
            .try_set(vertex, location)?;
        b.transform.invalidate_cache();
        Ok(())
    }

    /// Moves a vertex; both element trees of the block are dropped.
    pub fn set_point(
        &mut self,
        block: ComponentId,
        vertex: usize,
        point: [f64; D],
    ) -> Result<(), StrataError> {
        let b = self.block_mut(block)?;
        b.mesh.set_point(vertex, point)?;
        b.invalidate_cache();
        Ok(())
    }

    /// Mutable mesh of `block`. Both element trees are dropped up front.
    pub fn block_mesh_mut(&mut self, block: ComponentId) -> Result<&mut SimplexMesh<D>, StrataError> {
        let b = self.block_mut(block)?;
        b.invalidate_cache();
        Ok(&mut b.mesh)
    }

    fn block_mut(&mut self, block: ComponentId) -> Result<&mut BlockGeometry<D>, StrataError> {
        self.model
            .blocks
            .get_mut(&block)
            .ok_or(StrataError::block_not_found(block))
    }

    /// Mutable meshes of every block, in id order, caches dropped.
    pub(crate) fn block_meshes_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentId, &mut SimplexMesh<D>)> + '_ {
        self.model.blocks.iter_mut().map(|(&id, b)| {
            b.invalidate_cache();
            (id, &mut b.mesh)
        })
    }

    pub(crate) fn horizon_isovalues_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentId, &mut f64)> + '_ {
        self.model
            .horizon_isovalues
            .iter_mut()
            .map(|(&h, v)| (h, v))
    }
}
