//! The horizons stack aggregate and its builder.
//!
//! [`HorizonsStack`] owns four parts: an optional name, the horizon registry,
//! the stratigraphic-unit registry and the [`RelationGraph`], plus the cached
//! top/bottom ends. Read access goes through delegating methods; every
//! structural edit goes through [`HorizonsStackBuilder`].

use crate::debug_invariants::DebugInvariants;
use crate::stack::ordering::{self, RepairReport, StackEnds};
use crate::stack::relations::{RelationGraph, UnconformityKind};
use crate::strata_error::StrataError;
use crate::topology::cache::InvalidateCache;
use crate::topology::component::{
    Component, ComponentType, ContactType, Horizon, StratigraphicUnit,
};
use crate::topology::component_id::ComponentId;
use crate::topology::registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HorizonsStack {
    name: Option<String>,
    horizons: ComponentRegistry<Horizon>,
    units: ComponentRegistry<StratigraphicUnit>,
    relations: RelationGraph,
    #[serde(skip)]
    ends: Option<StackEnds>,
}

/// Ids created by [`HorizonsStackBuilder::add_horizon_in_stratigraphic_unit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertedHorizonInfo {
    pub new_horizon: ComponentId,
    pub unit_above: ComponentId,
    pub unit_under: ComponentId,
}

impl HorizonsStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // -------------------------------------------------------------------------
    // Registries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn nb_horizons(&self) -> usize {
        self.horizons.len()
    }

    #[inline]
    pub fn nb_stratigraphic_units(&self) -> usize {
        self.units.len()
    }

    pub fn horizon(&self, id: ComponentId) -> Result<&Horizon, StrataError> {
        self.horizons.get(id)
    }

    pub fn stratigraphic_unit(&self, id: ComponentId) -> Result<&StratigraphicUnit, StrataError> {
        self.units.get(id)
    }

    pub fn horizons(&self) -> impl Iterator<Item = &Horizon> {
        self.horizons.iter()
    }

    pub fn stratigraphic_units(&self) -> impl Iterator<Item = &StratigraphicUnit> {
        self.units.iter()
    }

    #[inline]
    pub fn has_horizon(&self, id: ComponentId) -> bool {
        self.horizons.has(id)
    }

    #[inline]
    pub fn has_stratigraphic_unit(&self, id: ComponentId) -> bool {
        self.units.has(id)
    }

    pub fn horizon_id_from_name(&self, name: &str) -> Option<ComponentId> {
        self.horizons.find_by_name(name)
    }

    pub fn stratigraphic_unit_id_from_name(&self, name: &str) -> Option<ComponentId> {
        self.units.find_by_name(name)
    }

    /// Name of a horizon or unit, falling back to its id.
    pub fn display_name(&self, id: ComponentId) -> String {
        let name = match self.horizons.get(id) {
            Ok(h) => h.name(),
            Err(_) => self.units.get(id).ok().and_then(|u| u.name()),
        };
        name.map_or_else(|| id.to_string(), str::to_owned)
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    #[inline]
    pub fn is_above(&self, a: ComponentId, b: ComponentId) -> bool {
        self.relations.is_above(a, b)
    }

    pub fn above(&self, x: ComponentId) -> Result<Option<ComponentId>, StrataError> {
        self.relations.above(x)
    }

    pub fn under(&self, x: ComponentId) -> Result<Option<ComponentId>, StrataError> {
        self.relations.under(x)
    }

    pub fn is_conformal_above(&self, a: ComponentId, b: ComponentId) -> bool {
        self.relations.is_conformal_above(a, b)
    }

    pub fn is_conformal_under(&self, a: ComponentId, b: ComponentId) -> bool {
        self.relations.is_conformal_under(a, b)
    }

    pub fn is_eroded_by(&self, eroded: ComponentId, erosion: ComponentId) -> bool {
        self.relations.is_eroded_by(eroded, erosion)
    }

    pub fn is_baselap_of(&self, baselap: ComponentId, baselap_top: ComponentId) -> bool {
        self.relations.is_baselap_of(baselap, baselap_top)
    }

    /// `true` if `a` is reached by walking upward from `b` (any distance).
    pub fn is_above_in_stack(&self, a: ComponentId, b: ComponentId) -> Result<bool, StrataError> {
        let limit = self.hop_limit();
        let mut current = b;
        for _ in 0..limit {
            match self.relations.above(current)? {
                Some(next) if next == a => return Ok(true),
                Some(next) => current = next,
                None => return Ok(false),
            }
        }
        Err(StrataError::RelationCycle {
            start: b,
            hops: limit,
        })
    }

    /// Ceiling for every hop-until-none walk over this stack.
    #[inline]
    pub fn hop_limit(&self) -> usize {
        self.nb_horizons() + self.nb_stratigraphic_units() + 1
    }

    // -------------------------------------------------------------------------
    // Cached ends
    // -------------------------------------------------------------------------

    /// Top horizon, once [`HorizonsStackBuilder::compute_top_and_bottom`] ran.
    pub fn top_horizon(&self) -> Option<ComponentId> {
        self.ends.map(|e| e.top)
    }

    pub fn bottom_horizon(&self) -> Option<ComponentId> {
        self.ends.map(|e| e.bottom)
    }

    pub(crate) fn ends(&self) -> Option<StackEnds> {
        self.ends
    }
}

impl InvalidateCache for HorizonsStack {
    fn invalidate_cache(&mut self) {
        self.ends = None;
    }
}

impl DebugInvariants for HorizonsStack {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HorizonsStack");
    }

    fn validate_invariants(&self) -> Result<(), StrataError> {
        self.relations.validate_invariants()?;
        for (ends, _, _) in self.relations.edges() {
            for id in ends {
                if !self.has_horizon(id) && !self.has_stratigraphic_unit(id) {
                    return Err(StrataError::InvalidStack(format!(
                        "relation endpoint `{id}` is neither a registered horizon nor unit"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Sole mutation path of a [`HorizonsStack`].
pub struct HorizonsStackBuilder<'a> {
    stack: &'a mut HorizonsStack,
}

impl<'a> HorizonsStackBuilder<'a> {
    pub fn new(stack: &'a mut HorizonsStack) -> Self {
        Self { stack }
    }

    pub fn stack(&self) -> &HorizonsStack {
        self.stack
    }

    pub fn set_name(&mut self, name: &str) {
        self.stack.name = Some(name.to_owned());
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    pub fn add_horizon(&mut self) -> ComponentId {
        let id = ComponentId::generate();
        self.register_horizon(Horizon::new(id, None));
        id
    }

    /// Adds a horizon under a caller-chosen id (reopening a saved model).
    pub fn add_horizon_with_id(&mut self, id: ComponentId) -> Result<ComponentId, StrataError> {
        if self.stack.relations.is_registered(id) {
            return Err(StrataError::PreconditionViolated(format!(
                "id `{id}` is already used in this stack"
            )));
        }
        self.register_horizon(Horizon::new(id, None));
        Ok(id)
    }

    fn register_horizon(&mut self, horizon: Horizon) {
        let id = horizon.id();
        self.stack.relations.register_component(id, ComponentType::Horizon);
        // Fresh or checked ids: the registry cannot hold `id` yet.
        let _ = self.stack.horizons.insert(horizon);
    }

    pub fn add_stratigraphic_unit(&mut self) -> ComponentId {
        let id = ComponentId::generate();
        self.register_unit(StratigraphicUnit::new(id, None));
        id
    }

    pub fn add_stratigraphic_unit_with_id(
        &mut self,
        id: ComponentId,
    ) -> Result<ComponentId, StrataError> {
        if self.stack.relations.is_registered(id) {
            return Err(StrataError::PreconditionViolated(format!(
                "id `{id}` is already used in this stack"
            )));
        }
        self.register_unit(StratigraphicUnit::new(id, None));
        Ok(id)
    }

    fn register_unit(&mut self, unit: StratigraphicUnit) {
        let id = unit.id();
        self.stack
            .relations
            .register_component(id, ComponentType::StratigraphicUnit);
        let _ = self.stack.units.insert(unit);
    }

    pub fn set_horizon_name(&mut self, horizon: ComponentId, name: &str) -> Result<(), StrataError> {
        self.stack
            .horizons
            .get_mut(horizon)?
            .set_name(Some(name.to_owned()));
        Ok(())
    }

    pub fn set_stratigraphic_unit_name(
        &mut self,
        unit: ComponentId,
        name: &str,
    ) -> Result<(), StrataError> {
        self.stack.units.get_mut(unit)?.set_name(Some(name.to_owned()));
        Ok(())
    }

    /// Removes a horizon and every relation touching it.
    pub fn remove_horizon(&mut self, horizon: ComponentId) -> Result<(), StrataError> {
        self.stack.horizons.remove(horizon)?;
        self.stack.relations.remove_component(horizon);
        self.structure_changed();
        Ok(())
    }

    /// Removes a unit and every relation touching it.
    pub fn remove_stratigraphic_unit(&mut self, unit: ComponentId) -> Result<(), StrataError> {
        self.stack.units.remove(unit)?;
        self.stack.relations.remove_component(unit);
        self.structure_changed();
        Ok(())
    }

    /// Sets the contact type and records the unconformities it implies.
    ///
    /// Unconformities the horizon carried with its neighbour units are
    /// cleared first. Erosion and discontinuity erode the unit under the
    /// horizon; baselap and discontinuity are lapped onto by the unit above.
    /// A missing neighbour unit only logs a warning.
    pub fn set_horizon_contact_type(
        &mut self,
        horizon: ComponentId,
        contact_type: ContactType,
    ) -> Result<(), StrataError> {
        self.stack
            .horizons
            .get_mut(horizon)?
            .set_contact_type(contact_type);
        let neighbours = [self.stack.under(horizon)?, self.stack.above(horizon)?];
        for unit in neighbours.into_iter().flatten() {
            self.stack.relations.remove_unconformity_relation(horizon, unit);
        }
        if matches!(contact_type, ContactType::Erosion | ContactType::Discontinuity) {
            match self.stack.under(horizon)? {
                Some(unit) => self.stack.relations.add_erosion_relation(horizon, unit)?,
                None => log::warn!(
                    "[HorizonsStack] horizon `{}` set to {contact_type} but has no unit under it",
                    self.stack.display_name(horizon)
                ),
            }
        }
        if matches!(contact_type, ContactType::Baselap | ContactType::Discontinuity) {
            match self.stack.above(horizon)? {
                Some(unit) => self.stack.relations.add_baselap_relation(horizon, unit)?,
                None => log::warn!(
                    "[HorizonsStack] horizon `{}` set to {contact_type} but has no unit above it",
                    self.stack.display_name(horizon)
                ),
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    pub fn add_above_relation(&mut self, a: ComponentId, b: ComponentId) -> Result<(), StrataError> {
        self.stack.relations.add_above_relation(a, b)?;
        self.structure_changed();
        Ok(())
    }

    pub fn add_erosion_relation(
        &mut self,
        erosion: ComponentId,
        eroded: ComponentId,
    ) -> Result<(), StrataError> {
        self.stack.relations.add_erosion_relation(erosion, eroded)
    }

    pub fn add_baselap_relation(
        &mut self,
        baselap: ComponentId,
        baselap_top: ComponentId,
    ) -> Result<(), StrataError> {
        self.stack.relations.add_baselap_relation(baselap, baselap_top)
    }

    /// Places `horizon` directly above `unit_under`.
    pub fn set_horizon_above(
        &mut self,
        horizon: ComponentId,
        unit_under: ComponentId,
    ) -> Result<(), StrataError> {
        self.add_above_relation(horizon, unit_under)
    }

    /// Places `horizon` directly under `unit_above`.
    pub fn set_horizon_under(
        &mut self,
        horizon: ComponentId,
        unit_above: ComponentId,
    ) -> Result<(), StrataError> {
        self.add_above_relation(unit_above, horizon)
    }

    /// Removes the stacking relation between `a` and `b`; an unconformity
    /// on the same pair survives.
    pub fn remove_relation(&mut self, a: ComponentId, b: ComponentId) {
        self.remove_above_relation(a, b);
    }

    pub fn remove_above_relation(&mut self, a: ComponentId, b: ComponentId) {
        self.stack.relations.remove_above_relation(a, b);
        self.structure_changed();
    }

    pub fn remove_unconformity_relation(&mut self, a: ComponentId, b: ComponentId) {
        self.stack.relations.remove_unconformity_relation(a, b);
    }

    // -------------------------------------------------------------------------
    // Compound edits
    // -------------------------------------------------------------------------

    /// Splits `unit` in two with a new conformal horizon in between.
    ///
    /// The old unit is replaced by a unit above and a unit under the new
    /// horizon; its neighbours and the unconformities they carried on it are
    /// transferred to the matching half.
    pub fn add_horizon_in_stratigraphic_unit(
        &mut self,
        unit: ComponentId,
    ) -> Result<InsertedHorizonInfo, StrataError> {
        let old_name = self.stack.stratigraphic_unit(unit)?.name().map(str::to_owned);
        let horizon_above = self.stack.above(unit)?;
        let horizon_under = self.stack.under(unit)?;
        let unconformity_above =
            horizon_above.and_then(|h| self.stack.relations.unconformity_between(h, unit));
        let unconformity_under =
            horizon_under.and_then(|h| self.stack.relations.unconformity_between(h, unit));
        let had_ends = self.stack.ends.is_some();

        self.remove_stratigraphic_unit(unit)?;
        let new_horizon = self.add_horizon();
        let unit_above = self.add_stratigraphic_unit();
        let unit_under = self.add_stratigraphic_unit();
        if let Some(name) = old_name {
            self.set_stratigraphic_unit_name(unit_above, &format!("{name}_above"))?;
            self.set_stratigraphic_unit_name(unit_under, &format!("{name}_under"))?;
        }
        self.add_above_relation(unit_above, new_horizon)?;
        self.add_above_relation(new_horizon, unit_under)?;
        if let Some(h) = horizon_above {
            self.add_above_relation(h, unit_above)?;
            if let Some(u) = unconformity_above {
                self.restore_unconformity(u.kind, h, unit_above)?;
            }
        }
        if let Some(h) = horizon_under {
            self.add_above_relation(unit_under, h)?;
            if let Some(u) = unconformity_under {
                self.restore_unconformity(u.kind, h, unit_under)?;
            }
        }
        if had_ends {
            self.compute_top_and_bottom()?;
        }
        Ok(InsertedHorizonInfo {
            new_horizon,
            unit_above,
            unit_under,
        })
    }

    fn restore_unconformity(
        &mut self,
        kind: UnconformityKind,
        horizon: ComponentId,
        unit: ComponentId,
    ) -> Result<(), StrataError> {
        match kind {
            UnconformityKind::Erosion => self.add_erosion_relation(horizon, unit),
            UnconformityKind::Baselap => self.add_baselap_relation(horizon, unit),
        }
    }

    /// Copies `other` into this empty stack and returns the old -> new id map.
    pub fn copy(
        &mut self,
        other: &HorizonsStack,
    ) -> Result<BTreeMap<ComponentId, ComponentId>, StrataError> {
        if self.stack.nb_horizons() > 0 || self.stack.nb_stratigraphic_units() > 0 {
            return Err(StrataError::PreconditionViolated(format!(
                "cannot copy into a stack holding {} horizon(s) and {} unit(s)",
                self.stack.nb_horizons(),
                self.stack.nb_stratigraphic_units()
            )));
        }
        let mut mapping = BTreeMap::new();
        for horizon in other.horizons() {
            let id = self.add_horizon();
            let target = self.stack.horizons.get_mut(id)?;
            target.set_name(horizon.name().map(str::to_owned));
            target.set_contact_type(horizon.contact_type());
            mapping.insert(horizon.id(), id);
        }
        for unit in other.stratigraphic_units() {
            let id = self.add_stratigraphic_unit();
            self.stack
                .units
                .get_mut(id)?
                .set_name(unit.name().map(str::to_owned));
            mapping.insert(unit.id(), id);
        }
        let lookup = |old: ComponentId| {
            mapping.get(&old).copied().ok_or_else(|| {
                StrataError::InvalidStack(format!(
                    "relation endpoint `{old}` is not registered in the source stack"
                ))
            })
        };
        let mut above_edges = Vec::new();
        let mut unconformities = Vec::new();
        for ([a, b], above, unconformity) in other.relations.edges() {
            let (na, nb) = (lookup(a)?, lookup(b)?);
            if above {
                above_edges.push((na, nb));
            }
            if let Some(u) = unconformity {
                let unit = if u.horizon == a { nb } else { na };
                unconformities.push((u.kind, lookup(u.horizon)?, unit));
            }
        }
        for (a, b) in above_edges {
            self.add_above_relation(a, b)?;
        }
        for (kind, horizon, unit) in unconformities {
            self.restore_unconformity(kind, horizon, unit)?;
        }
        self.stack.name = other.name.clone();
        if other.ends.is_some() {
            self.compute_top_and_bottom()?;
        }
        Ok(mapping)
    }

    // -------------------------------------------------------------------------
    // Ordering
    // -------------------------------------------------------------------------

    /// Recomputes and caches the top and bottom horizons.
    pub fn compute_top_and_bottom(&mut self) -> Result<StackEnds, StrataError> {
        let ends = ordering::compute_top_and_bottom(self.stack)?;
        self.stack.ends = Some(ends);
        Ok(ends)
    }

    /// See [`ordering::repair_if_possible`].
    pub fn repair_if_possible(&mut self) -> Result<RepairReport, StrataError> {
        ordering::repair_if_possible(self)
    }

    fn structure_changed(&mut self) {
        self.stack.invalidate_cache();
        self.stack.debug_assert_invariants();
    }
}
