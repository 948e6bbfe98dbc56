//! Cache invalidation shared by everything that memoizes derived data.

/// Anything caching data derived from mutable state (stack ends, element
/// trees) implements this. Mutators call it; readers never do.
pub trait InvalidateCache {
    /// Drop every cached value so the next query recomputes it.
    fn invalidate_cache(&mut self);
}

