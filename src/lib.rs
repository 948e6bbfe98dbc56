#![cfg_attr(docsrs, feature(doc_cfg))]
//! # strata-sieve
//!
//! strata-sieve models the stacking order of stratigraphic units separated by
//! horizons, and answers spatial queries against simplicial block meshes
//! carrying an implicit (restored) scalar field: which unit a point lies in,
//! what its restored coordinate is, and which geometric point a restored
//! coordinate maps back to.
//!
//! ## Parts
//! - [`stack`]: the horizon/unit [`RelationGraph`](stack::relations::RelationGraph),
//!   the [`HorizonsStack`](stack::horizons_stack::HorizonsStack) aggregate and
//!   its builder, top/bottom discovery, ordered traversal and repair.
//! - [`implicit`]: AABB-accelerated point location and barycentric
//!   interpolation ([`ScalarFieldQuery`](implicit::scalar_field::ScalarFieldQuery)),
//!   the geometric <-> restored mapping
//!   ([`CoordinateTransform`](implicit::coordinate_transform::CoordinateTransform))
//!   and the [`ImplicitModel`](implicit::model::ImplicitModel) aggregate.
//! - [`algs`]: unit-assignment propagation over block adjacency and bulk
//!   rescaling helpers.
//! - [`topology`], [`mesh`], [`data`], [`geometry`]: the small collaborators
//!   the above are built on (ids, registries, block/boundary incidence,
//!   simplex meshes, per-vertex attributes, simplex kernel, element trees).
//!
//! ## Usage
//!
//! ```rust
//! use strata_sieve::prelude::*;
//!
//! let stack = horizons_stack_from_bottom_to_top_names(
//!     &["h1", "h2", "h3", "h4"],
//!     &["su1", "su2", "su3"],
//! )?;
//! assert_eq!(stack.nb_horizons(), 4);
//! assert_eq!(stack.nb_stratigraphic_units(), 5);
//! let h1 = stack.horizon_id_from_name("h1");
//! assert_eq!(stack.bottom_horizon(), h1);
//! # Ok::<(), strata_sieve::strata_error::StrataError>(())
//! ```
//!
//! ## Concurrency
//!
//! Structural edits go through builders taking `&mut`, so writers are
//! serialized by the borrow checker. Read-only queries may run from many
//! threads; the lazy first build of an element tree sits behind a
//! compute-once cell. With the `rayon` feature (default) element boxes are
//! computed in parallel.
//!
//! ## Invariant checking
//!
//! Debug builds, or release builds with `strict-invariants` /
//! `check-invariants`, validate the relation graph after every structural
//! edit and panic with the first violation.

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod implicit;
pub mod mesh;
pub mod stack;
pub mod strata_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::unit_assignment::{
        UnitAssignmentOutcome, UnitAssignmentPropagator, assign_stratigraphic_units,
    };
    pub use crate::data::attribute::{AttributeManager, VertexSection};
    pub use crate::geometry::bbox::BoundingBox;
    pub use crate::implicit::builder::ImplicitModelBuilder;
    pub use crate::implicit::model::{
        ImplicitModel, IsovalueDirection, StratigraphicModel, StratigraphicSection,
    };
    pub use crate::implicit::scalar_field::QueryConfig;
    pub use crate::implicit::stratigraphic_point::{
        StratigraphicPoint, StratigraphicPoint2D, StratigraphicPoint3D,
    };
    pub use crate::mesh::simplex_mesh::SimplexMesh;
    pub use crate::stack::horizons_stack::{HorizonsStack, HorizonsStackBuilder};
    pub use crate::stack::ordering::{
        horizons_stack_from_bottom_to_top_names, horizons_stack_from_top_to_bottom_names,
    };
    pub use crate::strata_error::StrataError;
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::component::{Component, ContactType};
    pub use crate::topology::component_id::ComponentId;
}
