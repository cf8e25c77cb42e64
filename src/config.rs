/// Bucket count a fresh table starts with.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Load factor threshold as a fraction: resize once `len / capacity >= 3/4`.
pub const LOAD_FACTOR_NUM: usize = 3;
pub const LOAD_FACTOR_DEN: usize = 4;

/// Configuration for a [`PathTree`](crate::PathTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Number of buckets allocated up front, and again after [`clear`](crate::PathTree::clear).
    pub initial_capacity: usize,
}

impl TreeConfig {
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity.max(1);
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}
