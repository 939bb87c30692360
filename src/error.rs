//! Error type for table construction.

/// Errors returned by `ChainTable` constructors.
///
/// Lookups never fail: a missing key is `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The requested bucket capacity was zero, negative, did not fit in
    /// `usize`, or could not be allocated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl TableError {
    pub(crate) fn capacity<C: core::fmt::Debug>(capacity: C) -> Self {
        TableError::InvalidArgument(format!(
            "bucket capacity must be a positive integer, got {capacity:?}"
        ))
    }

    pub(crate) fn allocation<C: core::fmt::Debug>(capacity: C) -> Self {
        TableError::InvalidArgument(format!(
            "cannot allocate {capacity:?} buckets"
        ))
    }
}
