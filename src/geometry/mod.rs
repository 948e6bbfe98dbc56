//! Geometry kernel: boxes, simplex primitives and the element tree.

pub mod aabb;
pub mod bbox;
pub mod simplex;

pub use aabb::{AabbTree, ClosestElement, ElementDistance};
pub use bbox::BoundingBox;
