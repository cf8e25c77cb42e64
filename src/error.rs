use thiserror::Error;

/// Errors reported by [`PathTree`](crate::PathTree) and its [`PathTable`](crate::PathTable).
///
/// Every variant is recoverable: the structure that reported it is left exactly as it was
/// before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Growing the bucket array, a bucket chain, or a traversal buffer failed.
    #[error("allocation failure while reserving {requested} slots")]
    AllocationFailure {
        /// Number of slots that could not be reserved.
        requested: usize,
    },

    /// The key is not present in the tree.
    #[error("key not found")]
    NotFound,

    /// The operation needs at least one entry.
    #[error("tree is empty")]
    EmptyTree,

    /// The iterator has already yielded every entry.
    #[error("iterator is exhausted")]
    InvalidIteratorState,

    /// The node would sit deeper than a [`Path`](crate::Path) can encode.
    #[error("path depth {depth} exceeds the 64 bit encoding")]
    DepthExceeded {
        /// Depth the insertion would have needed.
        depth: usize,
    },
}

impl Error {
    pub(crate) fn alloc(requested: usize) -> Self {
        tracing::warn!(requested, "allocation failure");
        Error::AllocationFailure { requested }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
