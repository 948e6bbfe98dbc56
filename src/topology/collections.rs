//! Collection membership: horizon -> boundaries, stratigraphic unit -> blocks.
//!
//! Collections are keyed by the id of the stack component they mirror, so a
//! model's unit container shares its id with the stack unit.

use crate::strata_error::StrataError;
use crate::topology::component::ComponentType;
use crate::topology::component_id::ComponentId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Debug)]
pub struct Collections {
    kind: ComponentType,
    items: BTreeMap<ComponentId, BTreeSet<ComponentId>>,
    owners: HashMap<ComponentId, BTreeSet<ComponentId>>,
}

impl Collections {
    /// Empty membership table for collections of `kind`.
    pub fn new(kind: ComponentType) -> Self {
        Self {
            kind,
            items: BTreeMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Creates the collection if missing. Returns `true` if it was created.
    pub(crate) fn add_collection(&mut self, collection: ComponentId) -> bool {
        if self.items.contains_key(&collection) {
            return false;
        }
        self.items.insert(collection, BTreeSet::new());
        true
    }

    /// Drops the collection and every membership it held.
    pub(crate) fn remove_collection(&mut self, collection: ComponentId) -> Result<(), StrataError> {
        let items = self.items.remove(&collection).ok_or(StrataError::NotFound {
            kind: self.kind,
            id: collection,
        })?;
        for item in items {
            if let Some(owners) = self.owners.get_mut(&item) {
                owners.remove(&collection);
                if owners.is_empty() {
                    self.owners.remove(&item);
                }
            }
        }
        Ok(())
    }

    /// Drops every collection for which `keep` is false. Returns how many
    /// were dropped.
    pub(crate) fn retain_collections(&mut self, mut keep: impl FnMut(ComponentId) -> bool) -> usize {
        let stale: Vec<ComponentId> = self.collection_ids().filter(|&c| !keep(c)).collect();
        for &collection in &stale {
            // Listed by `collection_ids`, so the collection exists.
            let _ = self.remove_collection(collection);
        }
        stale.len()
    }

    pub(crate) fn add_item(
        &mut self,
        collection: ComponentId,
        item: ComponentId,
    ) -> Result<(), StrataError> {
        let items = self.items.get_mut(&collection).ok_or(StrataError::NotFound {
            kind: self.kind,
            id: collection,
        })?;
        items.insert(item);
        self.owners.entry(item).or_default().insert(collection);
        Ok(())
    }

    /// Forgets `item` in every collection.
    pub(crate) fn remove_item_everywhere(&mut self, item: ComponentId) {
        if let Some(owners) = self.owners.remove(&item) {
            for collection in owners {
                if let Some(items) = self.items.get_mut(&collection) {
                    items.remove(&item);
                }
            }
        }
    }

    #[inline]
    pub fn has_collection(&self, collection: ComponentId) -> bool {
        self.items.contains_key(&collection)
    }

    pub fn collection_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.items.keys().copied()
    }

    pub fn is_item(&self, item: ComponentId, collection: ComponentId) -> bool {
        self.items
            .get(&collection)
            .is_some_and(|items| items.contains(&item))
    }

    /// Number of items; zero for an unknown collection.
    pub fn nb_items(&self, collection: ComponentId) -> usize {
        self.items.get(&collection).map_or(0, BTreeSet::len)
    }

    pub fn items(
        &self,
        collection: ComponentId,
    ) -> Result<impl Iterator<Item = ComponentId> + '_, StrataError> {
        self.items
            .get(&collection)
            .map(|items| items.iter().copied())
            .ok_or(StrataError::NotFound {
                kind: self.kind,
                id: collection,
            })
    }

    /// Collections holding `item`, in id order.
    pub fn collections_of(&self, item: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.owners.get(&item).into_iter().flatten().copied()
    }

    #[inline]
    pub fn has_owner(&self, item: ComponentId) -> bool {
        self.owners.contains_key(&item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_round_trip() {
        let (unit, block) = (ComponentId::generate(), ComponentId::generate());
        let mut c = Collections::new(ComponentType::StratigraphicUnit);
        assert!(c.add_collection(unit));
        assert!(!c.add_collection(unit));
        c.add_item(unit, block).unwrap();
        assert!(c.is_item(block, unit));
        assert_eq!(c.nb_items(unit), 1);
        assert_eq!(c.collections_of(block).collect::<Vec<_>>(), vec![unit]);
        c.remove_collection(unit).unwrap();
        assert!(!c.has_owner(block));
        assert_eq!(c.nb_items(unit), 0);
    }

    #[test]
    fn add_item_to_unknown_collection_fails() {
        let mut c = Collections::new(ComponentType::Horizon);
        let err = c
            .add_item(ComponentId::generate(), ComponentId::generate())
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::NotFound {
                kind: ComponentType::Horizon,
                ..
            }
        ));
    }

    #[test]
    fn remove_item_everywhere_detaches_all_owners() {
        let (h1, h2, s) = (
            ComponentId::generate(),
            ComponentId::generate(),
            ComponentId::generate(),
        );
        let mut c = Collections::new(ComponentType::Horizon);
        c.add_collection(h1);
        c.add_collection(h2);
        c.add_item(h1, s).unwrap();
        c.add_item(h2, s).unwrap();
        c.remove_item_everywhere(s);
        assert_eq!(c.nb_items(h1), 0);
        assert_eq!(c.nb_items(h2), 0);
    }
}
