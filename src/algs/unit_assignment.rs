//! Propagation of stratigraphic-unit membership across block boundaries.
//!
//! Pending blocks are resolved from their boundaries: the horizon owning a
//! boundary, its contact type and the unit of the block across it decide
//! which side of the horizon the pending block lies on.
//!
//! | contact   | neighbour is        | block gets      |
//! |-----------|---------------------|-----------------|
//! | conformal | unit above horizon  | unit under      |
//! | conformal | unit under horizon  | unit above      |
//! | erosion   | unit under horizon  | unit above      |
//! | baselap   | unit above horizon  | unit under      |
//!
//! When no single boundary decides, the horizons met on the boundary are
//! combined: two conformal horizons bracketing one unit, or a conformal
//! horizon paired with an erosion/baselap horizon found by walking the
//! stack. Passes repeat until one makes no progress; the blocks still
//! pending are reported, never retried forever.

use crate::implicit::builder::ImplicitModelBuilder;
use crate::implicit::model::ImplicitModel;
use crate::strata_error::StrataError;
use crate::topology::component::{Component, ContactType};
use crate::topology::component_id::ComponentId;
use std::collections::BTreeSet;

/// Result of a propagation run; every block of the model is in exactly one
/// list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitAssignmentOutcome {
    pub already_assigned: Vec<ComponentId>,
    pub newly_assigned: Vec<ComponentId>,
    pub unassigned: Vec<ComponentId>,
}

impl UnitAssignmentOutcome {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty()
    }

    /// Turns leftover blocks into [`StrataError::Unresolvable`].
    pub fn into_result(self) -> Result<Self, StrataError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(StrataError::Unresolvable {
                unassigned: self.unassigned,
            })
        }
    }
}

/// One propagation run over a model.
///
/// Containers created for the run and still empty when the propagator is
/// dropped are deleted again, whether or not [`run`](Self::run) completed.
pub struct UnitAssignmentPropagator<'a, 'm, const D: usize> {
    builder: &'a mut ImplicitModelBuilder<'m, D>,
    created_containers: Vec<ComponentId>,
}

impl<'a, 'm, const D: usize> UnitAssignmentPropagator<'a, 'm, D> {
    /// Checks the stack and creates one container per stack unit.
    ///
    /// The stack needs at least one horizon, one unit and computed top and
    /// bottom horizons; otherwise fails with [`StrataError::InvalidStack`].
    pub fn new(builder: &'a mut ImplicitModelBuilder<'m, D>) -> Result<Self, StrataError> {
        let stack = builder.model().horizons_stack();
        if stack.nb_horizons() == 0 || stack.nb_stratigraphic_units() == 0 {
            return Err(StrataError::InvalidStack(format!(
                "unit assignment needs horizons and units, stack has {} and {}",
                stack.nb_horizons(),
                stack.nb_stratigraphic_units()
            )));
        }
        if stack.top_horizon().is_none() || stack.bottom_horizon().is_none() {
            return Err(StrataError::InvalidStack(
                "unit assignment needs computed top and bottom horizons".into(),
            ));
        }
        let units: Vec<ComponentId> = stack.stratigraphic_units().map(|u| u.id()).collect();
        let mut propagator = Self {
            builder,
            created_containers: Vec::new(),
        };
        for unit in units {
            if propagator.builder.add_stratigraphic_unit_container(unit)? {
                propagator.created_containers.push(unit);
            }
        }
        Ok(propagator)
    }

    pub fn run(mut self) -> Result<UnitAssignmentOutcome, StrataError> {
        let model = self.builder.model();
        let (already_assigned, mut pending): (Vec<_>, Vec<_>) = model
            .blocks()
            .partition(|&block| model.stratigraphic_unit_of_block(block).is_some());
        let mut outcome = UnitAssignmentOutcome {
            already_assigned,
            ..Default::default()
        };

        let mut pass = 0;
        while !pending.is_empty() {
            pass += 1;
            let mut still_pending = Vec::with_capacity(pending.len());
            let before = outcome.newly_assigned.len();
            for block in pending {
                match resolve_block(self.builder.model(), block)? {
                    Some(unit) => {
                        self.builder.add_block_in_stratigraphic_unit(block, unit)?;
                        outcome.newly_assigned.push(block);
                    }
                    None => still_pending.push(block),
                }
            }
            let resolved = outcome.newly_assigned.len() - before;
            log::debug!(
                "[UnitAssignment] pass {pass}: {resolved} block(s) resolved, {} pending",
                still_pending.len()
            );
            pending = still_pending;
            if resolved == 0 {
                break;
            }
        }
        outcome.unassigned = pending;

        if !outcome.unassigned.is_empty() {
            log::warn!(
                "[UnitAssignment] {} block(s) left without a stratigraphic unit: {:?}",
                outcome.unassigned.len(),
                outcome.unassigned
            );
        }
        log::info!(
            "[UnitAssignment] {} already assigned, {} newly assigned, {} unassigned after {pass} pass(es)",
            outcome.already_assigned.len(),
            outcome.newly_assigned.len(),
            outcome.unassigned.len()
        );
        Ok(outcome)
    }
}

impl<const D: usize> Drop for UnitAssignmentPropagator<'_, '_, D> {
    fn drop(&mut self) {
        for unit in std::mem::take(&mut self.created_containers) {
            if self.builder.model().nb_blocks_in_stratigraphic_unit(unit) == 0 {
                // Created by `new`, so the container exists.
                let _ = self.builder.remove_stratigraphic_unit_container(unit);
            }
        }
    }
}

/// Assigns every pending block of the model it can; see the module docs.
pub fn assign_stratigraphic_units<const D: usize>(
    builder: &mut ImplicitModelBuilder<'_, D>,
) -> Result<UnitAssignmentOutcome, StrataError> {
    UnitAssignmentPropagator::new(builder)?.run()
}

/// Unit of `block` deduced from its boundaries, if any.
pub fn resolve_block<const D: usize>(
    model: &ImplicitModel<D>,
    block: ComponentId,
) -> Result<Option<ComponentId>, StrataError> {
    let stack = model.horizons_stack();
    let mut conformal = BTreeSet::new();
    let mut unconformities = BTreeSet::new();

    for &boundary in model.topology().boundaries(block)? {
        let Some(horizon) = model.horizon_of_boundary(boundary) else {
            continue;
        };
        let Ok(contact) = stack.horizon(horizon).map(|h| h.contact_type()) else {
            continue;
        };
        let neighbor_unit = model
            .topology()
            .neighbor_across(block, boundary)?
            .and_then(|n| model.stratigraphic_unit_of_block(n));
        let (above, under) = (stack.above(horizon)?, stack.under(horizon)?);
        match contact {
            ContactType::Conformal => {
                conformal.insert(horizon);
                if let Some(unit) = neighbor_unit {
                    if above == Some(unit) && under.is_some() {
                        return Ok(under);
                    }
                    if under == Some(unit) && above.is_some() {
                        return Ok(above);
                    }
                }
            }
            ContactType::Erosion => {
                unconformities.insert(horizon);
                if neighbor_unit.is_some() && neighbor_unit == under && above.is_some() {
                    return Ok(above);
                }
            }
            ContactType::Baselap => {
                unconformities.insert(horizon);
                if neighbor_unit.is_some() && neighbor_unit == above && under.is_some() {
                    return Ok(under);
                }
            }
            _ => {}
        }
    }

    for &c0 in &conformal {
        for &c1 in &conformal {
            if c0 == c1 {
                continue;
            }
            let between = stack.above(c0)?;
            if between.is_some() && between == stack.under(c1)? {
                return Ok(between);
            }
        }
    }
    for &c in &conformal {
        for &u in &unconformities {
            if stack.is_above_in_stack(u, c)? {
                if let Some(unit) = stack.above(c)? {
                    return Ok(Some(unit));
                }
            } else if stack.is_above_in_stack(c, u)? {
                if let Some(unit) = stack.under(c)? {
                    return Ok(Some(unit));
                }
            }
        }
    }
    Ok(None)
}
