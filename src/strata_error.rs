//! Unified error type for strata-sieve.
//!
//! Every fallible operation in the crate returns `Result<_, StrataError>`.
//! Structural violations name the offending component ids so the caller can
//! trace them back to the upstream data.

use crate::topology::component::ComponentType;
use crate::topology::component_id::ComponentId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrataError {
    /// A raw id of zero was supplied; zero is reserved as the invalid sentinel.
    #[error("ComponentId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidComponentId,

    /// An id is unknown to the graph or registry that was queried.
    #[error("{kind} `{id}` not found")]
    NotFound { kind: ComponentType, id: ComponentId },

    /// The stack violates a structural rule (±1 count rule, alternation,
    /// duplicate above/under neighbour, missing ends after repair).
    #[error("invalid horizons stack: {0}")]
    InvalidStack(String),

    /// A hop-until-none walk exceeded its hop ceiling.
    #[error("relation walk from `{start}` exceeded {hops} hops; the relation graph has a cycle")]
    RelationCycle { start: ComponentId, hops: usize },

    /// The operation was called in a state it does not support.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    /// Unit assignment reached a fixed point with elements still pending.
    #[error("{} block(s) could not be assigned to a stratigraphic unit: {unassigned:?}", unassigned.len())]
    Unresolvable { unassigned: Vec<ComponentId> },

    #[error("vertex {vertex} out of range (mesh has {nb_vertices} vertices)")]
    VertexOutOfRange { vertex: usize, nb_vertices: usize },

    #[error("cell {cell} out of range (mesh has {nb_cells} cells)")]
    CellOutOfRange { cell: usize, nb_cells: usize },

    /// A per-vertex attribute was reopened or written with the wrong width.
    #[error("attribute `{name}` has width {found}, expected {expected}")]
    AttributeWidthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl StrataError {
    pub(crate) fn horizon_not_found(id: ComponentId) -> Self {
        StrataError::NotFound {
            kind: ComponentType::Horizon,
            id,
        }
    }

    pub(crate) fn unit_not_found(id: ComponentId) -> Self {
        StrataError::NotFound {
            kind: ComponentType::StratigraphicUnit,
            id,
        }
    }

    pub(crate) fn block_not_found(id: ComponentId) -> Self {
        StrataError::NotFound {
            kind: ComponentType::Block,
            id,
        }
    }
}
