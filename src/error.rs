//! Error types for the column collection family.
//!
//! This module provides [`CollectionError`], the failure taxonomy shared by
//! every collection variant. All failures are synchronous and are reported
//! before any internal structure is touched, so a failed operation never
//! leaves a collection partially updated.

/// Represents a failure raised by a column collection operation.
///
/// Two failure modes of the collection family never appear here because the
/// type system rules them out: membership probes take `&str` (a non-string
/// key cannot be expressed), and the immutable view type has no mutating
/// methods (a mutation through a view does not compile).
///
/// # Examples
///
/// ```rust
/// use colonnade::error::CollectionError;
///
/// let error = CollectionError::UnknownKey {
///     key: "user_id".to_string(),
/// };
/// assert_eq!(
///     format!("{}", error),
///     "no column is stored under key \"user_id\""
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A deduplicating collection was given an explicit key that differs
    /// from the column's own key.
    KeyMismatch {
        /// The explicit key the caller tried to store the column under.
        key: String,
        /// The key the column itself declares.
        column_key: String,
    },
    /// A keyed lookup found no column stored under the requested key.
    UnknownKey {
        /// The key that was probed.
        key: String,
    },
    /// A positional lookup reached past the end of the entry sequence.
    PositionOutOfRange {
        /// The position that was probed.
        position: usize,
        /// The number of entries in the collection at probe time.
        len: usize,
    },
    /// A removal referenced a column that is not a member of the collection.
    AbsentColumn {
        /// The declared key of the column that was not found.
        key: String,
    },
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyMismatch { key, column_key } => write!(
                formatter,
                "cannot store a column declaring key {column_key:?} under key {key:?}: \
                 a deduplicating collection requires columns to be stored under their own key"
            ),
            Self::UnknownKey { key } => {
                write!(formatter, "no column is stored under key {key:?}")
            }
            Self::PositionOutOfRange { position, len } => write!(
                formatter,
                "position {position} is out of range for a collection of {len} columns"
            ),
            Self::AbsentColumn { key } => write!(
                formatter,
                "column with key {key:?} is not a member of this collection"
            ),
        }
    }
}

impl std::error::Error for CollectionError {}
