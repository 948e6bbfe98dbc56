//! Id-keyed component registry.
//!
//! Iteration follows id order, which is creation order for generated ids.

use crate::strata_error::StrataError;
use crate::topology::component::Component;
use crate::topology::component_id::ComponentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentRegistry<T> {
    components: BTreeMap<ComponentId, T>,
}

impl<T> Default for ComponentRegistry<T> {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }
}

impl<T: Component> ComponentRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `component`; its id must not be registered yet.
    pub fn insert(&mut self, component: T) -> Result<ComponentId, StrataError> {
        let id = component.id();
        if self.components.contains_key(&id) {
            return Err(StrataError::PreconditionViolated(format!(
                "{} `{id}` is already registered",
                T::TYPE
            )));
        }
        self.components.insert(id, component);
        Ok(id)
    }

    pub fn remove(&mut self, id: ComponentId) -> Result<T, StrataError> {
        self.components.remove(&id).ok_or(StrataError::NotFound {
            kind: T::TYPE,
            id,
        })
    }

    #[inline]
    pub fn has(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn get(&self, id: ComponentId) -> Result<&T, StrataError> {
        self.components.get(&id).ok_or(StrataError::NotFound {
            kind: T::TYPE,
            id,
        })
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Result<&mut T, StrataError> {
        self.components.get_mut(&id).ok_or(StrataError::NotFound {
            kind: T::TYPE,
            id,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.components.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// First component carrying `name`, in id order.
    pub fn find_by_name(&self, name: &str) -> Option<ComponentId> {
        self.components
            .values()
            .find(|c| c.name() == Some(name))
            .map(Component::id)
    }
}
