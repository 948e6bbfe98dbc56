//! Algorithms over a whole implicit model.

pub mod rescale;
pub mod unit_assignment;

pub use unit_assignment::{UnitAssignmentOutcome, UnitAssignmentPropagator, assign_stratigraphic_units};
