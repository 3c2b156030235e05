/// Errors reported by the fallible (`try_*`) accessors of [`TwoFourTree`](crate::TwoFourTree)
/// and [`ValueList`](crate::ValueList).
///
/// The primary query API returns [`Option`] instead; these variants exist for callers that want
/// to know *why* a lookup produced nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The requested key is not stored in the tree.
    #[error("key not found")]
    KeyNotFound,
    /// An order-statistic query was made against a tree with no values.
    #[error("tree is empty")]
    EmptyTree,
    /// A positional access fell outside `1..=len` (tree positions) or `0..len` (list indices).
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The index or position that was requested.
        index: usize,
        /// The number of addressable items at the time of the request.
        len: usize,
    },
}

/// Shorthand for results carrying this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
