//! Block/boundary incidence of a model.
//!
//! Stored as two mirrored adjacency maps: the *cone* of a block lists the
//! boundaries that bound it, the *support* of a boundary lists the blocks it
//! separates (one for an outer boundary, two for an internal one).

use crate::strata_error::StrataError;
use crate::topology::component::ComponentType;
use crate::topology::component_id::ComponentId;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct ModelTopology {
    cone: BTreeMap<ComponentId, Vec<ComponentId>>,
    support: BTreeMap<ComponentId, Vec<ComponentId>>,
}

impl ModelTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_block(&mut self, block: ComponentId) {
        self.cone.entry(block).or_default();
    }

    pub(crate) fn add_boundary(&mut self, boundary: ComponentId) {
        self.support.entry(boundary).or_default();
    }

    /// Records that `boundary` bounds `block`. Idempotent.
    pub(crate) fn add_block_boundary(
        &mut self,
        block: ComponentId,
        boundary: ComponentId,
    ) -> Result<(), StrataError> {
        if !self.support.contains_key(&boundary) {
            return Err(StrataError::NotFound {
                kind: ComponentType::Boundary,
                id: boundary,
            });
        }
        let cone = self
            .cone
            .get_mut(&block)
            .ok_or(StrataError::block_not_found(block))?;
        if !cone.contains(&boundary) {
            cone.push(boundary);
        }
        if let Some(support) = self.support.get_mut(&boundary) {
            if !support.contains(&block) {
                support.push(block);
            }
        }
        Ok(())
    }

    /// Removes `block` and scrubs it from every boundary support.
    pub(crate) fn remove_block(&mut self, block: ComponentId) -> Result<(), StrataError> {
        let cone = self
            .cone
            .remove(&block)
            .ok_or(StrataError::block_not_found(block))?;
        for boundary in cone {
            if let Some(support) = self.support.get_mut(&boundary) {
                support.retain(|b| *b != block);
            }
        }
        Ok(())
    }

    #[inline]
    pub fn has_block(&self, block: ComponentId) -> bool {
        self.cone.contains_key(&block)
    }

    #[inline]
    pub fn has_boundary(&self, boundary: ComponentId) -> bool {
        self.support.contains_key(&boundary)
    }

    /// Blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.cone.keys().copied()
    }

    pub fn boundary_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.support.keys().copied()
    }

    #[inline]
    pub fn nb_blocks(&self) -> usize {
        self.cone.len()
    }

    /// Boundaries of `block`.
    pub fn boundaries(&self, block: ComponentId) -> Result<&[ComponentId], StrataError> {
        self.cone
            .get(&block)
            .map(Vec::as_slice)
            .ok_or(StrataError::block_not_found(block))
    }

    /// Blocks incident to `boundary`.
    pub fn incidences(&self, boundary: ComponentId) -> Result<&[ComponentId], StrataError> {
        self.support
            .get(&boundary)
            .map(Vec::as_slice)
            .ok_or(StrataError::NotFound {
                kind: ComponentType::Boundary,
                id: boundary,
            })
    }

    /// The block on the other side of `boundary`, seen from `block`.
    pub fn neighbor_across(
        &self,
        block: ComponentId,
        boundary: ComponentId,
    ) -> Result<Option<ComponentId>, StrataError> {
        Ok(self
            .incidences(boundary)?
            .iter()
            .copied()
            .find(|b| *b != block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> ComponentId {
        ComponentId::generate()
    }

    #[test]
    fn cone_and_support_mirror() {
        let (a, b, s) = (pid(), pid(), pid());
        let mut topo = ModelTopology::new();
        topo.add_block(a);
        topo.add_block(b);
        topo.add_boundary(s);
        topo.add_block_boundary(a, s).unwrap();
        topo.add_block_boundary(b, s).unwrap();
        topo.add_block_boundary(b, s).unwrap();
        assert_eq!(topo.boundaries(a).unwrap(), &[s]);
        assert_eq!(topo.incidences(s).unwrap(), &[a, b]);
        assert_eq!(topo.neighbor_across(a, s).unwrap(), Some(b));
        assert_eq!(topo.neighbor_across(b, s).unwrap(), Some(a));
    }

    #[test]
    fn remove_block_scrubs_support() {
        let (a, b, s) = (pid(), pid(), pid());
        let mut topo = ModelTopology::new();
        topo.add_block(a);
        topo.add_block(b);
        topo.add_boundary(s);
        topo.add_block_boundary(a, s).unwrap();
        topo.add_block_boundary(b, s).unwrap();
        topo.remove_block(a).unwrap();
        assert!(!topo.has_block(a));
        assert_eq!(topo.incidences(s).unwrap(), &[b]);
        assert_eq!(topo.neighbor_across(b, s).unwrap(), None);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut topo = ModelTopology::new();
        let a = pid();
        assert!(matches!(
            topo.boundaries(a),
            Err(StrataError::NotFound {
                kind: ComponentType::Block,
                ..
            })
        ));
        topo.add_block(a);
        assert!(matches!(
            topo.add_block_boundary(a, pid()),
            Err(StrataError::NotFound {
                kind: ComponentType::Boundary,
                ..
            })
        ));
    }
}
