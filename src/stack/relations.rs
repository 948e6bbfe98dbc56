//! Stacking-order and unconformity relations between horizons and units.
//!
//! Each relation is an undirected horizon/unit pair stored in an edge slot.
//! Two independent attributes live in arrays parallel to the slots:
//!
//! - the *above* flag: when set, `ends[0]` lies geometrically above `ends[1]`;
//! - the *unconformity*: erosion or baselap, recorded with the horizon that
//!   carries it, so that re-orienting an edge for the above flag never changes
//!   its unconformity classification.
//!
//! Along the above flags the graph is a simple alternating path
//! unit-horizon-unit-... : every endpoint has at most one component above it
//! and at most one under it. Mutators enforce this and are crate-visible
//! only; [`HorizonsStackBuilder`](crate::stack::horizons_stack::HorizonsStackBuilder)
//! is the public way to edit relations.

use crate::debug_invariants::DebugInvariants;
use crate::strata_error::StrataError;
use crate::topology::component::ComponentType;
use crate::topology::component_id::ComponentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unconformity classification of a relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnconformityKind {
    Erosion,
    Baselap,
}

/// Unconformity carried by an edge, with the horizon that bears it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unconformity {
    pub kind: UnconformityKind,
    pub horizon: ComponentId,
}

type EdgeSlot = usize;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RelationGraph {
    kinds: HashMap<ComponentId, ComponentType>,
    adjacency: HashMap<ComponentId, Vec<EdgeSlot>>,
    ends: Vec<Option<[ComponentId; 2]>>,
    above: Vec<bool>,
    unconformity: Vec<Option<Unconformity>>,
    free: Vec<EdgeSlot>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    pub(crate) fn register_component(&mut self, id: ComponentId, kind: ComponentType) {
        self.kinds.insert(id, kind);
        self.adjacency.entry(id).or_default();
    }

    /// Unregisters `id` and deletes every edge touching it.
    pub(crate) fn remove_component(&mut self, id: ComponentId) {
        if let Some(slots) = self.adjacency.remove(&id) {
            for slot in slots {
                self.delete_edge(slot);
            }
        }
        self.kinds.remove(&id);
    }

    #[inline]
    pub fn is_registered(&self, id: ComponentId) -> bool {
        self.kinds.contains_key(&id)
    }

    pub fn nb_relations(&self) -> usize {
        self.ends.iter().filter(|e| e.is_some()).count()
    }

    // -------------------------------------------------------------------------
    // Edge storage
    // -------------------------------------------------------------------------

    fn edge_between(&self, a: ComponentId, b: ComponentId) -> Option<EdgeSlot> {
        self.adjacency.get(&a)?.iter().copied().find(|&slot| {
            self.ends[slot].is_some_and(|[x, y]| (x == a && y == b) || (x == b && y == a))
        })
    }

    fn create_edge(&mut self, a: ComponentId, b: ComponentId) -> EdgeSlot {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.ends[slot] = Some([a, b]);
                self.above[slot] = false;
                self.unconformity[slot] = None;
                slot
            }
            None => {
                self.ends.push(Some([a, b]));
                self.above.push(false);
                self.unconformity.push(None);
                self.ends.len() - 1
            }
        };
        self.adjacency.entry(a).or_default().push(slot);
        self.adjacency.entry(b).or_default().push(slot);
        slot
    }

    fn delete_edge(&mut self, slot: EdgeSlot) {
        let Some(ends) = self.ends[slot].take() else {
            return;
        };
        for end in ends {
            if let Some(slots) = self.adjacency.get_mut(&end) {
                slots.retain(|s| *s != slot);
            }
        }
        self.above[slot] = false;
        self.unconformity[slot] = None;
        self.free.push(slot);
    }

    /// Kind of a registered id; an unregistered one is reported as
    /// `expected`.
    fn kind_of(&self, id: ComponentId, expected: ComponentType) -> Result<ComponentType, StrataError> {
        self.kinds
            .get(&id)
            .copied()
            .ok_or(StrataError::NotFound { kind: expected, id })
    }

    fn check_pair(&self, a: ComponentId, b: ComponentId) -> Result<(), StrataError> {
        // A missing end is reported as the counterpart of the other one.
        let expected_a = self
            .kinds
            .get(&b)
            .map_or(ComponentType::Horizon, |&kb| counterpart(kb));
        let ka = self.kind_of(a, expected_a)?;
        let kb = self.kind_of(b, counterpart(ka))?;
        if ka == kb {
            return Err(StrataError::InvalidStack(format!(
                "relation `{a}`-`{b}` must link a horizon and a stratigraphic unit, both are {ka}"
            )));
        }
        Ok(())
    }

    fn check_unconformity_pair(
        &self,
        horizon: ComponentId,
        unit: ComponentId,
    ) -> Result<(), StrataError> {
        let kind = self.kind_of(horizon, ComponentType::Horizon)?;
        self.kind_of(unit, ComponentType::StratigraphicUnit)?;
        self.check_pair(horizon, unit)?;
        if kind != ComponentType::Horizon {
            return Err(StrataError::InvalidStack(format!(
                "unconformity `{horizon}`-`{unit}` must be carried by a horizon, `{horizon}` is a {}",
                ComponentType::StratigraphicUnit
            )));
        }
        Ok(())
    }

    fn reuse_or_create(&mut self, a: ComponentId, b: ComponentId) -> EdgeSlot {
        match self.edge_between(a, b) {
            Some(slot) => slot,
            None => self.create_edge(a, b),
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Marks `a` as directly above `b`. Idempotent.
    pub(crate) fn add_above_relation(
        &mut self,
        a: ComponentId,
        b: ComponentId,
    ) -> Result<(), StrataError> {
        self.check_pair(a, b)?;
        if let Some(existing) = self.under(a)? {
            if existing != b {
                return Err(StrataError::InvalidStack(format!(
                    "`{a}` already has `{existing}` under it, cannot also place `{b}` under it"
                )));
            }
        }
        if let Some(existing) = self.above(b)? {
            if existing != a {
                return Err(StrataError::InvalidStack(format!(
                    "`{b}` already has `{existing}` above it, cannot also place `{a}` above it"
                )));
            }
        }
        let slot = self.reuse_or_create(a, b);
        self.ends[slot] = Some([a, b]);
        self.above[slot] = true;
        Ok(())
    }

    /// Records that `erosion` erodes the unit `eroded`. Idempotent.
    pub(crate) fn add_erosion_relation(
        &mut self,
        erosion: ComponentId,
        eroded: ComponentId,
    ) -> Result<(), StrataError> {
        self.add_unconformity(erosion, eroded, UnconformityKind::Erosion)
    }

    /// Records that the unit `baselap_top` laps onto `baselap`. Idempotent.
    pub(crate) fn add_baselap_relation(
        &mut self,
        baselap: ComponentId,
        baselap_top: ComponentId,
    ) -> Result<(), StrataError> {
        self.add_unconformity(baselap, baselap_top, UnconformityKind::Baselap)
    }

    fn add_unconformity(
        &mut self,
        horizon: ComponentId,
        unit: ComponentId,
        kind: UnconformityKind,
    ) -> Result<(), StrataError> {
        self.check_unconformity_pair(horizon, unit)?;
        let slot = self.reuse_or_create(horizon, unit);
        self.unconformity[slot] = Some(Unconformity { kind, horizon });
        Ok(())
    }

    /// Removes the stacking relation between `a` and `b` (either orientation).
    ///
    /// The edge is deleted when it carries no unconformity; otherwise only the
    /// above flag is cleared. Missing relations are ignored.
    pub(crate) fn remove_above_relation(&mut self, a: ComponentId, b: ComponentId) {
        let Some(slot) = self.edge_between(a, b) else {
            return;
        };
        if self.unconformity[slot].is_none() {
            self.delete_edge(slot);
        } else {
            self.above[slot] = false;
        }
    }

    /// Removes the unconformity between `a` and `b` (either orientation).
    ///
    /// The edge is deleted when its above flag is unset; otherwise only the
    /// unconformity is cleared. Missing relations are ignored.
    pub(crate) fn remove_unconformity_relation(&mut self, a: ComponentId, b: ComponentId) {
        let Some(slot) = self.edge_between(a, b) else {
            return;
        };
        if self.above[slot] {
            self.unconformity[slot] = None;
        } else {
            self.delete_edge(slot);
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// `true` iff an edge `a`-`b` exists with its above flag set and `a` on top.
    pub fn is_above(&self, a: ComponentId, b: ComponentId) -> bool {
        self.edge_between(a, b)
            .is_some_and(|slot| self.above[slot] && self.ends[slot] == Some([a, b]))
    }

    /// `is_above(a, b)` on an edge without unconformity.
    pub fn is_conformal_above(&self, a: ComponentId, b: ComponentId) -> bool {
        self.edge_between(a, b).is_some_and(|slot| {
            self.above[slot] && self.ends[slot] == Some([a, b]) && self.unconformity[slot].is_none()
        })
    }

    /// `a` is conformally under `b`.
    pub fn is_conformal_under(&self, a: ComponentId, b: ComponentId) -> bool {
        self.is_conformal_above(b, a)
    }

    /// `true` iff the unit `eroded` is eroded by the horizon `erosion`.
    pub fn is_eroded_by(&self, eroded: ComponentId, erosion: ComponentId) -> bool {
        self.unconformity_between(eroded, erosion)
            .is_some_and(|u| u.kind == UnconformityKind::Erosion && u.horizon == erosion)
    }

    /// `true` iff the unit `baselap_top` laps onto the horizon `baselap`.
    pub fn is_baselap_of(&self, baselap: ComponentId, baselap_top: ComponentId) -> bool {
        self.unconformity_between(baselap, baselap_top)
            .is_some_and(|u| u.kind == UnconformityKind::Baselap && u.horizon == baselap)
    }

    pub fn unconformity_between(&self, a: ComponentId, b: ComponentId) -> Option<Unconformity> {
        self.edge_between(a, b).and_then(|slot| self.unconformity[slot])
    }

    /// Component directly above `x`, if any. An unknown `x` is reported as
    /// a horizon; use [`above_of`](Self::above_of) when the kind is known.
    pub fn above(&self, x: ComponentId) -> Result<Option<ComponentId>, StrataError> {
        self.oriented_neighbor(x, ComponentType::Horizon, 1, 0)
    }

    /// Component directly under `x`, if any. An unknown `x` is reported as
    /// a horizon; use [`under_of`](Self::under_of) when the kind is known.
    pub fn under(&self, x: ComponentId) -> Result<Option<ComponentId>, StrataError> {
        self.oriented_neighbor(x, ComponentType::Horizon, 0, 1)
    }

    /// [`above`](Self::above) for an `x` expected to be of `kind`.
    pub fn above_of(
        &self,
        x: ComponentId,
        kind: ComponentType,
    ) -> Result<Option<ComponentId>, StrataError> {
        self.oriented_neighbor(x, kind, 1, 0)
    }

    /// [`under`](Self::under) for an `x` expected to be of `kind`.
    pub fn under_of(
        &self,
        x: ComponentId,
        kind: ComponentType,
    ) -> Result<Option<ComponentId>, StrataError> {
        self.oriented_neighbor(x, kind, 0, 1)
    }

    fn oriented_neighbor(
        &self,
        x: ComponentId,
        expected: ComponentType,
        own_side: usize,
        other_side: usize,
    ) -> Result<Option<ComponentId>, StrataError> {
        self.kind_of(x, expected)?;
        let slots = self.adjacency.get(&x).map_or(&[][..], Vec::as_slice);
        Ok(slots.iter().find_map(|&slot| {
            let ends = self.ends[slot]?;
            (self.above[slot] && ends[own_side] == x).then_some(ends[other_side])
        }))
    }

    /// Every live edge as `(ends, above, unconformity)`, in slot order.
    pub(crate) fn edges(
        &self,
    ) -> impl Iterator<Item = ([ComponentId; 2], bool, Option<Unconformity>)> + '_ {
        self.ends
            .iter()
            .enumerate()
            .filter_map(|(slot, ends)| ends.map(|e| (e, self.above[slot], self.unconformity[slot])))
    }
}

fn counterpart(kind: ComponentType) -> ComponentType {
    match kind {
        ComponentType::Horizon => ComponentType::StratigraphicUnit,
        _ => ComponentType::Horizon,
    }
}

impl DebugInvariants for RelationGraph {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "RelationGraph");
    }

    fn validate_invariants(&self) -> Result<(), StrataError> {
        let n = self.ends.len();
        if self.above.len() != n || self.unconformity.len() != n {
            return Err(StrataError::InvalidStack(format!(
                "attribute arrays out of sync with {n} edge slots"
            )));
        }
        for (slot, ends) in self.ends.iter().enumerate() {
            let Some([a, b]) = *ends else {
                continue;
            };
            let ka = self.kind_of(a, ComponentType::Horizon)?;
            if ka == self.kind_of(b, counterpart(ka))? {
                return Err(StrataError::InvalidStack(format!(
                    "edge `{a}`-`{b}` links two components of the same kind"
                )));
            }
            for end in [a, b] {
                let listed = self
                    .adjacency
                    .get(&end)
                    .is_some_and(|slots| slots.contains(&slot));
                if !listed {
                    return Err(StrataError::InvalidStack(format!(
                        "edge `{a}`-`{b}` missing from adjacency of `{end}`"
                    )));
                }
            }
        }
        for (&id, slots) in &self.adjacency {
            let (mut nb_above, mut nb_under) = (0, 0);
            for &slot in slots {
                let Some(ends) = self.ends[slot] else {
                    return Err(StrataError::InvalidStack(format!(
                        "`{id}` references deleted edge slot {slot}"
                    )));
                };
                if self.above[slot] {
                    if ends[1] == id {
                        nb_above += 1;
                    } else {
                        nb_under += 1;
                    }
                }
            }
            if nb_above > 1 || nb_under > 1 {
                return Err(StrataError::InvalidStack(format!(
                    "`{id}` has {nb_above} component(s) above and {nb_under} under"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        graph: RelationGraph,
        h: ComponentId,
        up: ComponentId,
        down: ComponentId,
    }

    fn fixture() -> Fixture {
        let mut graph = RelationGraph::new();
        let h = ComponentId::generate();
        let up = ComponentId::generate();
        let down = ComponentId::generate();
        graph.register_component(h, ComponentType::Horizon);
        graph.register_component(up, ComponentType::StratigraphicUnit);
        graph.register_component(down, ComponentType::StratigraphicUnit);
        Fixture { graph, h, up, down }
    }

    #[test]
    fn above_and_under_are_mirrors() {
        let Fixture {
            mut graph,
            h,
            up,
            down,
        } = fixture();
        graph.add_above_relation(up, h).unwrap();
        graph.add_above_relation(h, down).unwrap();
        assert_eq!(graph.above(h).unwrap(), Some(up));
        assert_eq!(graph.under(up).unwrap(), Some(h));
        assert_eq!(graph.under(h).unwrap(), Some(down));
        assert_eq!(graph.above(down).unwrap(), Some(h));
        assert_eq!(graph.above(up).unwrap(), None);
        assert!(graph.is_above(up, h));
        assert!(!graph.is_above(h, up));
        graph.validate_invariants().unwrap();
    }

    #[test]
    fn add_above_is_idempotent_and_reorients() {
        let Fixture {
            mut graph, h, down, ..
        } = fixture();
        graph.add_above_relation(h, down).unwrap();
        graph.add_above_relation(h, down).unwrap();
        assert_eq!(graph.nb_relations(), 1);

        // An unconformity-only edge stored as (h, down) is reused and
        // reoriented when down is placed above h.
        graph.remove_above_relation(h, down);
        graph.add_erosion_relation(h, down).unwrap();
        graph.add_above_relation(down, h).unwrap();
        assert_eq!(graph.nb_relations(), 1);
        assert!(graph.is_above(down, h));
        assert!(graph.is_eroded_by(down, h));
    }

    #[test]
    fn second_unit_under_a_horizon_is_rejected() {
        let Fixture {
            mut graph,
            h,
            up,
            down,
        } = fixture();
        graph.add_above_relation(h, down).unwrap();
        let err = graph.add_above_relation(h, up).unwrap_err();
        assert!(matches!(err, StrataError::InvalidStack(ref m) if m.contains(&h.to_string())));
    }

    #[test]
    fn same_kind_relation_is_rejected() {
        let Fixture {
            mut graph, up, down, ..
        } = fixture();
        assert!(matches!(
            graph.add_above_relation(up, down),
            Err(StrataError::InvalidStack(_))
        ));
    }

    #[test]
    fn removing_above_keeps_unconformity() {
        let Fixture {
            mut graph, h, down, ..
        } = fixture();
        graph.add_above_relation(h, down).unwrap();
        graph.add_erosion_relation(h, down).unwrap();
        graph.remove_above_relation(h, down);
        assert!(!graph.is_above(h, down));
        assert!(graph.is_eroded_by(down, h));
        assert_eq!(graph.nb_relations(), 1);

        graph.remove_unconformity_relation(down, h);
        assert_eq!(graph.nb_relations(), 0, "edge without attributes is deleted");
    }

    #[test]
    fn removing_unconformity_keeps_above() {
        let Fixture {
            mut graph, h, up, ..
        } = fixture();
        graph.add_above_relation(up, h).unwrap();
        graph.add_baselap_relation(h, up).unwrap();
        assert!(graph.is_baselap_of(h, up));
        assert!(!graph.is_conformal_above(up, h));
        graph.remove_unconformity_relation(h, up);
        assert!(!graph.is_baselap_of(h, up));
        assert!(graph.is_conformal_above(up, h));
        assert!(graph.is_conformal_under(h, up));
    }

    #[test]
    fn removing_missing_relation_is_a_no_op() {
        let Fixture {
            mut graph, h, up, ..
        } = fixture();
        graph.remove_above_relation(h, up);
        graph.remove_unconformity_relation(h, ComponentId::generate());
        assert_eq!(graph.nb_relations(), 0);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let graph = RelationGraph::new();
        let x = ComponentId::generate();
        assert!(matches!(graph.above(x), Err(StrataError::NotFound { id, .. }) if id == x));
        assert!(matches!(graph.under(x), Err(StrataError::NotFound { .. })));
    }

    #[test]
    fn unknown_id_is_reported_with_its_expected_kind() {
        let Fixture { mut graph, h, down, .. } = fixture();
        let stray = ComponentId::generate();
        let unit_missing = StrataError::NotFound {
            kind: ComponentType::StratigraphicUnit,
            id: stray,
        };
        let horizon_missing = StrataError::NotFound {
            kind: ComponentType::Horizon,
            id: stray,
        };
        assert_eq!(graph.add_erosion_relation(h, stray).unwrap_err(), unit_missing);
        assert_eq!(graph.add_baselap_relation(stray, down).unwrap_err(), horizon_missing);
        assert_eq!(graph.add_above_relation(h, stray).unwrap_err(), unit_missing);
        assert_eq!(graph.add_above_relation(stray, down).unwrap_err(), horizon_missing);
        assert_eq!(
            graph.under_of(stray, ComponentType::StratigraphicUnit).unwrap_err(),
            unit_missing
        );
        assert_eq!(graph.above(stray).unwrap_err(), horizon_missing);
    }

    #[test]
    fn remove_component_cascades_and_recycles_slots() {
        let Fixture {
            mut graph,
            h,
            up,
            down,
        } = fixture();
        graph.add_above_relation(up, h).unwrap();
        graph.add_above_relation(h, down).unwrap();
        graph.remove_component(h);
        assert_eq!(graph.nb_relations(), 0);
        assert_eq!(graph.above(down).unwrap(), None);
        assert!(!graph.is_registered(h));

        let h2 = ComponentId::generate();
        graph.register_component(h2, ComponentType::Horizon);
        graph.add_above_relation(h2, down).unwrap();
        assert_eq!(graph.ends.len(), 2, "freed slots are reused");
        graph.validate_invariants().unwrap();
    }
}
