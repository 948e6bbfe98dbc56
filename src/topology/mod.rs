//! Component identity and model topology.
//!
//! This module provides:
//! - [`ComponentId`](component_id::ComponentId), the opaque non-zero id
//!   shared by horizons, units, blocks and boundaries
//! - component kinds and their registries
//! - block/boundary incidence ([`ModelTopology`](model_topology::ModelTopology))
//! - collection membership (horizon -> boundaries, unit -> blocks)

pub mod cache;
pub mod collections;
pub mod component;
pub mod component_id;
pub mod model_topology;
pub mod registry;

pub use cache::InvalidateCache;
pub use component_id::ComponentId;
