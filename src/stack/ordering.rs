//! Stack ordering: top/bottom discovery, ordered traversal and repair.
//!
//! Every walk over the relation graph is bounded by
//! [`HorizonsStack::hop_limit`] (`nb_horizons + nb_units + 1`) so that a
//! malformed, cyclic graph fails instead of looping.

use crate::stack::horizons_stack::{HorizonsStack, HorizonsStackBuilder};
use crate::strata_error::StrataError;
use crate::topology::component::Component;
use crate::topology::component_id::ComponentId;
use std::fmt;
use std::iter::FusedIterator;

/// Cached top and bottom horizons of a stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackEnds {
    pub top: ComponentId,
    pub bottom: ComponentId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

fn step(
    stack: &HorizonsStack,
    from: ComponentId,
    direction: Direction,
) -> Result<Option<ComponentId>, StrataError> {
    match direction {
        Direction::Up => stack.above(from),
        Direction::Down => stack.under(from),
    }
}

/// Next component of the same kind, two hops away.
fn two_hops(
    stack: &HorizonsStack,
    from: ComponentId,
    direction: Direction,
) -> Result<Option<ComponentId>, StrataError> {
    match step(stack, from, direction)? {
        Some(mid) => step(stack, mid, direction),
        None => Ok(None),
    }
}

/// Last horizon reached from `start` hopping horizon -> unit -> horizon.
fn walk_to_end(
    stack: &HorizonsStack,
    start: ComponentId,
    direction: Direction,
) -> Result<(ComponentId, usize), StrataError> {
    let limit = stack.hop_limit();
    let mut current = start;
    let mut hops = 0;
    while let Some(next) = two_hops(stack, current, direction)? {
        hops += 2;
        if hops > limit {
            return Err(StrataError::RelationCycle { start, hops: limit });
        }
        current = next;
    }
    Ok((current, hops))
}

/// Starting from any horizon, hops up to the top and down to the bottom.
pub(crate) fn compute_top_and_bottom(stack: &HorizonsStack) -> Result<StackEnds, StrataError> {
    let start = stack
        .horizons()
        .next()
        .map(Component::id)
        .ok_or_else(|| StrataError::InvalidStack("stack has no horizon".into()))?;
    let (top, _) = walk_to_end(stack, start, Direction::Up)?;
    let (bottom, _) = walk_to_end(stack, start, Direction::Down)?;
    Ok(StackEnds { top, bottom })
}

// -----------------------------------------------------------------------------
// Ordered traversal
// -----------------------------------------------------------------------------

/// Lazy walk over the horizons (or units) of a stack in stacking order.
///
/// A clone resumes from the current position; call the constructor on
/// [`HorizonsStack`] again to restart from the anchor.
#[derive(Clone, Debug)]
pub struct StackWalk<'a> {
    stack: &'a HorizonsStack,
    next: Option<ComponentId>,
    direction: Direction,
    hops_left: usize,
}

impl<'a> StackWalk<'a> {
    fn new(stack: &'a HorizonsStack, first: Option<ComponentId>, direction: Direction) -> Self {
        Self {
            stack,
            next: first,
            direction,
            hops_left: stack.hop_limit(),
        }
    }

    fn empty(stack: &'a HorizonsStack, what: &str) -> Self {
        log::warn!(
            "[HorizonsStack] {what} traversal requested before compute_top_and_bottom; \
             the sequence is empty"
        );
        Self::new(stack, None, Direction::Up)
    }
}

impl Iterator for StackWalk<'_> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<ComponentId> {
        let current = self.next.take()?;
        let following = match two_hops(self.stack, current, self.direction) {
            Ok(following) => following,
            Err(err) => {
                log::error!("[HorizonsStack] traversal stopped at `{current}`: {err}");
                None
            }
        };
        if let Some(following) = following {
            if self.hops_left < 2 {
                log::error!(
                    "[HorizonsStack] traversal stopped at `{current}`: hop limit {} exceeded",
                    self.stack.hop_limit()
                );
            } else {
                self.hops_left -= 2;
                self.next = Some(following);
            }
        }
        Some(current)
    }
}

impl FusedIterator for StackWalk<'_> {}

impl HorizonsStack {
    pub fn bottom_to_top_horizons(&self) -> StackWalk<'_> {
        match self.ends() {
            Some(ends) => StackWalk::new(self, Some(ends.bottom), Direction::Up),
            None => StackWalk::empty(self, "bottom_to_top_horizons"),
        }
    }

    pub fn top_to_bottom_horizons(&self) -> StackWalk<'_> {
        match self.ends() {
            Some(ends) => StackWalk::new(self, Some(ends.top), Direction::Down),
            None => StackWalk::empty(self, "top_to_bottom_horizons"),
        }
    }

    /// Units from the lowest one (under the bottom horizon, if any) upward.
    pub fn bottom_to_top_units(&self) -> StackWalk<'_> {
        match self.ends() {
            Some(ends) => {
                let first = self
                    .under(ends.bottom)
                    .ok()
                    .flatten()
                    .or_else(|| self.above(ends.bottom).ok().flatten());
                StackWalk::new(self, first, Direction::Up)
            }
            None => StackWalk::empty(self, "bottom_to_top_units"),
        }
    }

    /// Units from the highest one (above the top horizon, if any) downward.
    pub fn top_to_bottom_units(&self) -> StackWalk<'_> {
        match self.ends() {
            Some(ends) => {
                let first = self
                    .above(ends.top)
                    .ok()
                    .flatten()
                    .or_else(|| self.under(ends.top).ok().flatten());
                StackWalk::new(self, first, Direction::Down)
            }
            None => StackWalk::empty(self, "top_to_bottom_units"),
        }
    }

    /// Horizon names from bottom to top, ids standing in for missing names.
    pub fn bottom_to_top_names(&self) -> Vec<String> {
        self.bottom_to_top_horizons()
            .map(|h| self.display_name(h))
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Repair
// -----------------------------------------------------------------------------

/// Units synthesized by [`repair_if_possible`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub bottom_unit: Option<ComponentId>,
    pub top_unit: Option<ComponentId>,
}

impl RepairReport {
    pub fn nb_created(&self) -> usize {
        usize::from(self.bottom_unit.is_some()) + usize::from(self.top_unit.is_some())
    }
}

/// Closes a stack with sentinel units at its bottom and top when missing.
///
/// Requires `|#horizons - #units| <= 1` and a single chain linking every
/// horizon; otherwise fails with [`StrataError::InvalidStack`] before any
/// mutation. A second call creates nothing.
pub fn repair_if_possible(
    builder: &mut HorizonsStackBuilder<'_>,
) -> Result<RepairReport, StrataError> {
    let (nb_horizons, nb_units) = (
        builder.stack().nb_horizons(),
        builder.stack().nb_stratigraphic_units(),
    );
    if nb_horizons.abs_diff(nb_units) > 1 {
        return Err(StrataError::InvalidStack(format!(
            "{nb_horizons} horizon(s) and {nb_units} unit(s): counts must differ by at most one"
        )));
    }
    let ends = builder.compute_top_and_bottom()?;
    let (_, hops) = walk_to_end(builder.stack(), ends.bottom, Direction::Up)?;
    let reached = hops / 2 + 1;
    if reached != nb_horizons {
        return Err(StrataError::InvalidStack(format!(
            "walking up from bottom horizon `{}` reaches {reached} of {nb_horizons} horizons",
            builder.stack().display_name(ends.bottom)
        )));
    }

    let mut report = RepairReport::default();
    if builder.stack().under(ends.bottom)?.is_none() {
        let unit = builder.add_stratigraphic_unit();
        let name = format!("under_{}", builder.stack().display_name(ends.bottom));
        builder.set_stratigraphic_unit_name(unit, &name)?;
        builder.set_horizon_above(ends.bottom, unit)?;
        log::info!("[HorizonsStack] repair added bottom unit `{name}`");
        report.bottom_unit = Some(unit);
    }
    if builder.stack().above(ends.top)?.is_none() {
        let unit = builder.add_stratigraphic_unit();
        let name = format!("above_{}", builder.stack().display_name(ends.top));
        builder.set_stratigraphic_unit_name(unit, &name)?;
        builder.set_horizon_under(ends.top, unit)?;
        log::info!("[HorizonsStack] repair added top unit `{name}`");
        report.top_unit = Some(unit);
    }
    builder.compute_top_and_bottom()?;
    Ok(report)
}

// -----------------------------------------------------------------------------
// Construction from names
// -----------------------------------------------------------------------------

/// Builds a stack from horizon and unit names listed bottom to top.
///
/// With one more unit than horizons the first unit lies under the first
/// horizon; otherwise unit `i` lies directly above horizon `i`. Missing
/// bottom/top units are synthesized by [`repair_if_possible`].
pub fn horizons_stack_from_bottom_to_top_names<H: AsRef<str>, U: AsRef<str>>(
    horizons: &[H],
    units: &[U],
) -> Result<HorizonsStack, StrataError> {
    let (nh, nu) = (horizons.len(), units.len());
    if nh == 0 || nh.abs_diff(nu) > 1 {
        return Err(StrataError::InvalidStack(format!(
            "cannot stack {nh} horizon name(s) with {nu} unit name(s)"
        )));
    }
    let offset = usize::from(nu == nh + 1);
    let mut stack = HorizonsStack::new();
    let mut builder = HorizonsStackBuilder::new(&mut stack);
    let mut horizon_ids = Vec::with_capacity(nh);
    for name in horizons {
        let id = builder.add_horizon();
        builder.set_horizon_name(id, name.as_ref())?;
        horizon_ids.push(id);
    }
    for (j, name) in units.iter().enumerate() {
        let unit = builder.add_stratigraphic_unit();
        builder.set_stratigraphic_unit_name(unit, name.as_ref())?;
        // Unit j sits above horizon j - offset and under horizon j - offset + 1.
        if let Some(&h) = (j + 1)
            .checked_sub(offset + 1)
            .and_then(|i| horizon_ids.get(i))
        {
            builder.set_horizon_under(h, unit)?;
        }
        if let Some(&h) = (j + 1).checked_sub(offset).and_then(|i| horizon_ids.get(i)) {
            builder.set_horizon_above(h, unit)?;
        }
    }
    repair_if_possible(&mut builder)?;
    Ok(stack)
}

/// Same as [`horizons_stack_from_bottom_to_top_names`] with top-to-bottom lists.
pub fn horizons_stack_from_top_to_bottom_names<H: AsRef<str>, U: AsRef<str>>(
    horizons: &[H],
    units: &[U],
) -> Result<HorizonsStack, StrataError> {
    let horizons: Vec<&str> = horizons.iter().rev().map(AsRef::as_ref).collect();
    let units: Vec<&str> = units.iter().rev().map(AsRef::as_ref).collect();
    horizons_stack_from_bottom_to_top_names(&horizons, &units)
}

// -----------------------------------------------------------------------------
// Human-readable dump
// -----------------------------------------------------------------------------

impl fmt::Display for HorizonsStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "HorizonsStack `{}`: {} horizon(s), {} unit(s)",
            self.name().unwrap_or("unnamed"),
            self.nb_horizons(),
            self.nb_stratigraphic_units()
        )?;
        let Some(ends) = self.ends() else {
            return writeln!(f, "  (top and bottom not computed)");
        };
        let first = self.above(ends.top).ok().flatten().unwrap_or(ends.top);
        let mut current = Some(first);
        let mut remaining = self.hop_limit();
        while let Some(id) = current {
            if remaining == 0 {
                return writeln!(f, "  ... (hop limit reached)");
            }
            remaining -= 1;
            match self.horizon(id) {
                Ok(h) => writeln!(
                    f,
                    "  -- horizon {} [{}]",
                    self.display_name(id),
                    h.contact_type()
                )?,
                Err(_) => writeln!(f, "     unit {}", self.display_name(id))?,
            }
            current = self.under(id).ok().flatten();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::component::ContactType;

    fn names_stack() -> HorizonsStack {
        horizons_stack_from_bottom_to_top_names(&["h1", "h2", "h3", "h4"], &["su1", "su2", "su3"])
            .unwrap()
    }

    #[test]
    fn walk_from_an_unknown_id_stops_after_it() {
        let stack = names_stack();
        let stray = ComponentId::generate();
        let walk: Vec<_> = StackWalk::new(&stack, Some(stray), Direction::Up).collect();
        assert_eq!(walk, vec![stray]);
    }

    #[test]
    fn from_names_synthesizes_sentinel_units() {
        let stack = names_stack();
        let id = |n: &str| stack.horizon_id_from_name(n).unwrap();
        let su1 = stack.stratigraphic_unit_id_from_name("su1").unwrap();
        assert_eq!(stack.nb_horizons(), 4);
        assert_eq!(stack.nb_stratigraphic_units(), 5);
        assert_eq!(stack.bottom_horizon(), Some(id("h1")));
        assert_eq!(stack.top_horizon(), Some(id("h4")));
        assert_eq!(stack.above(su1).unwrap(), Some(id("h2")));
        assert_eq!(stack.bottom_to_top_names(), ["h1", "h2", "h3", "h4"]);
    }

    #[test]
    fn one_extra_unit_goes_under_first_horizon() {
        let stack =
            horizons_stack_from_bottom_to_top_names(&["h1", "h2"], &["base", "mid", "cap"]).unwrap();
        let base = stack.stratigraphic_unit_id_from_name("base").unwrap();
        let cap = stack.stratigraphic_unit_id_from_name("cap").unwrap();
        assert_eq!(stack.nb_stratigraphic_units(), 3, "nothing to repair");
        assert_eq!(stack.above(base).unwrap(), stack.horizon_id_from_name("h1"));
        assert_eq!(stack.under(cap).unwrap(), stack.horizon_id_from_name("h2"));
    }

    #[test]
    fn top_to_bottom_names_mirror_bottom_to_top() {
        let stack =
            horizons_stack_from_top_to_bottom_names(&["h4", "h3", "h2", "h1"], &["su3", "su2", "su1"])
                .unwrap();
        assert_eq!(stack.bottom_to_top_names(), ["h1", "h2", "h3", "h4"]);
    }

    #[test]
    fn traversals_are_mirrors() {
        let stack = names_stack();
        let mut up: Vec<_> = stack.bottom_to_top_horizons().collect();
        up.reverse();
        assert_eq!(up, stack.top_to_bottom_horizons().collect::<Vec<_>>());
        let mut units_up: Vec<_> = stack.bottom_to_top_units().collect();
        assert_eq!(units_up.len(), 5);
        units_up.reverse();
        assert_eq!(units_up, stack.top_to_bottom_units().collect::<Vec<_>>());
    }

    #[test]
    fn traversal_before_compute_is_empty() {
        let mut stack = HorizonsStack::new();
        let mut b = HorizonsStackBuilder::new(&mut stack);
        let h = b.add_horizon();
        let u = b.add_stratigraphic_unit();
        b.set_horizon_above(h, u).unwrap();
        assert_eq!(stack.bottom_to_top_horizons().count(), 0);
        assert_eq!(stack.top_to_bottom_units().count(), 0);
    }

    #[test]
    fn repair_is_idempotent() {
        let mut stack = names_stack();
        let report = HorizonsStackBuilder::new(&mut stack)
            .repair_if_possible()
            .unwrap();
        assert_eq!(report.nb_created(), 0);
        assert_eq!(stack.nb_stratigraphic_units(), 5);
    }

    #[test]
    fn repair_rejects_count_mismatch() {
        let mut stack = HorizonsStack::new();
        let mut b = HorizonsStackBuilder::new(&mut stack);
        b.add_horizon();
        b.add_horizon();
        b.add_horizon();
        let err = b.repair_if_possible().unwrap_err();
        assert!(matches!(err, StrataError::InvalidStack(_)));
        assert_eq!(stack.nb_stratigraphic_units(), 0, "no mutation on failure");
    }

    #[test]
    fn repair_rejects_disconnected_horizons() {
        let mut stack = HorizonsStack::new();
        let mut b = HorizonsStackBuilder::new(&mut stack);
        let h1 = b.add_horizon();
        let _h2 = b.add_horizon();
        let u = b.add_stratigraphic_unit();
        b.set_horizon_above(h1, u).unwrap();
        let err = b.repair_if_possible().unwrap_err();
        assert!(matches!(err, StrataError::InvalidStack(ref m) if m.contains("reaches 1 of 2")));
    }

    #[test]
    fn dump_lists_stack_top_down() {
        let mut stack = names_stack();
        let h4 = stack.horizon_id_from_name("h4").unwrap();
        HorizonsStackBuilder::new(&mut stack)
            .set_horizon_contact_type(h4, ContactType::Erosion)
            .unwrap();
        let dump = stack.to_string();
        let h4_at = dump.find("horizon h4 [erosion]").unwrap();
        let h1_at = dump.find("horizon h1 [conformal]").unwrap();
        assert!(h4_at < h1_at, "dump runs top to bottom:\n{dump}");
        assert!(dump.contains("unit above_h4"));
        assert!(dump.contains("unit under_h1"));
    }
}
