//! Stratigraphic stacking order.
//!
//! - [`relations`]: the horizon/unit relation graph with above and
//!   unconformity attributes.
//! - [`horizons_stack`]: the stack aggregate and its builder.
//! - [`ordering`]: top/bottom discovery, ordered traversal, repair and
//!   construction from ordered names.

pub mod horizons_stack;
pub mod ordering;
pub mod relations;

pub use horizons_stack::{HorizonsStack, HorizonsStackBuilder, InsertedHorizonInfo};
pub use ordering::{RepairReport, StackEnds, StackWalk};
pub use relations::{RelationGraph, Unconformity, UnconformityKind};
