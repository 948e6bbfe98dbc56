//! `ComponentId`: a strong, zero-cost handle for model components
//!
//! Every horizon, stratigraphic unit, block and boundary of a model is
//! addressed through an opaque identifier. `ComponentId` wraps a nonzero
//! `u64` so that 0 stays reserved as an invalid or sentinel value.
//!
//! Fresh ids come from a process-wide counter: two stacks or models created
//! in the same process never hand out the same id, which keeps the
//! old -> new mapping of a stack copy unambiguous.

use crate::strata_error::StrataError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, num::NonZeroU64};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a horizon, unit, block or boundary.
///
/// # Memory layout
/// This type is `repr(transparent)` over `NonZeroU64`, so `Option<ComponentId>`
/// is the size of a `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ComponentId(NonZeroU64);

impl ComponentId {
    /// Creates a `ComponentId` from a raw `u64` value.
    ///
    /// Fails with [`StrataError::InvalidComponentId`] if `raw == 0`.
    ///
    /// ```rust
    /// # use strata_sieve::topology::component_id::ComponentId;
    /// let id = ComponentId::new(1).unwrap();
    /// assert_eq!(id.get(), 1);
    /// assert!(ComponentId::new(0).is_err());
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, StrataError> {
        NonZeroU64::new(raw)
            .map(ComponentId)
            .ok_or(StrataError::InvalidComponentId)
    }

    /// Issues a fresh id, unique for the lifetime of the process.
    pub fn generate() -> Self {
        loop {
            let raw = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            if let Some(nz) = NonZeroU64::new(raw) {
                return ComponentId(nz);
            }
        }
    }

    /// Returns the inner `u64` value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentId").field(&self.get()).finish()
    }
}

/// Prints only the raw integer.
impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_zero_is_rejected() {
        assert_eq!(ComponentId::new(0), Err(StrataError::InvalidComponentId));
    }

    #[test]
    fn new_and_get() {
        let id = ComponentId::new(42).unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(ComponentId::new(u64::MAX).unwrap().get(), u64::MAX);
    }

    #[test]
    fn debug_and_display() {
        let id = ComponentId::new(7).unwrap();
        assert_eq!(format!("{:?}", id), "ComponentId(7)");
        assert_eq!(format!("{}", id), "7");
    }

    #[test]
    fn generated_ids_are_distinct_and_increasing() {
        let a = ComponentId::generate();
        let b = ComponentId::generate();
        assert_ne!(a, b);
        assert!(a < b, "ids come from a monotonic counter");
    }
}
