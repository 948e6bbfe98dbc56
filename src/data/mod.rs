//! Per-vertex attribute storage.

pub mod attribute;

pub use attribute::{AttributeManager, VertexSection};
