//! Read-only views over live collection storage.
//!
//! [`ImmutableColumnCollection`] is produced by freezing a mutable
//! collection through [`Freezable::as_immutable`]. A view holds the *same*
//! storage allocation as its source rather than a copy, so every mutation
//! made through the source afterwards is immediately observable through
//! the view. What the view cannot do is mutate: the type carries no
//! mutating methods at all.
//!
//! # Examples
//!
//! ```rust
//! use colonnade::collection::UniqueColumnCollection;
//! use colonnade::column::column;
//!
//! let collection = UniqueColumnCollection::new();
//! collection.add(column("id"));
//!
//! let view = collection.as_immutable();
//! collection.add(column("email"));
//!
//! assert_eq!(view.keys(), ["id", "email"]); // the view is live
//! assert!(view.is_view_of(&collection));
//! ```

use std::rc::Rc;

use crate::collection::state::{ColumnIterator, SharedState};
use crate::column::ColumnRef;
use crate::error::CollectionError;

/// The freeze seam of the collection family.
///
/// Both mutable collection variants implement this trait; generic code can
/// accept any of them and derive a read-only view without caring which
/// variant it was handed.
pub trait Freezable {
    /// The column type carried by the frozen view.
    type Column;

    /// Freezes a read-only view aliasing this collection's storage.
    fn as_immutable(&self) -> ImmutableColumnCollection<Self::Column>;
}

/// A read-only view aliasing a mutable collection's storage.
///
/// All keyed, positional, and membership reads of the mutable variants are
/// available and consult the shared structures directly. Mutation is not
/// part of the type's surface, so it cannot compile:
///
/// ```compile_fail
/// use colonnade::collection::ColumnCollection;
/// use colonnade::column::column;
///
/// let collection = ColumnCollection::new();
/// let view = collection.as_immutable();
/// view.add(column("nope")); // no mutating methods on a view
/// ```
///
/// Like its sources, a view is neither [`Send`] nor [`Sync`], and [`Clone`]
/// produces another view over the same storage.
pub struct ImmutableColumnCollection<C> {
    state: SharedState<C>,
}

// Static assertions to verify ImmutableColumnCollection is not Send/Sync
static_assertions::assert_not_impl_any!(ImmutableColumnCollection<crate::column::SimpleColumn>: Send, Sync);
static_assertions::assert_not_impl_any!(ImmutableColumnCollection<String>: Send, Sync);

impl<C> ImmutableColumnCollection<C> {
    pub(crate) fn from_shared(state: SharedState<C>) -> Self {
        Self { state }
    }

    /// Number of entries visible through the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Returns `true` when the underlying collection holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column the key resolves to, or `None` for an unknown key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ColumnRef<C>> {
        self.state.borrow().get(key)
    }

    /// Like [`get`](Self::get), but an unknown key is a
    /// [`CollectionError::UnknownKey`].
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownKey`] when no column is stored
    /// under `key`.
    pub fn try_get(&self, key: &str) -> Result<ColumnRef<C>, CollectionError> {
        self.get(key).ok_or_else(|| CollectionError::UnknownKey {
            key: key.to_string(),
        })
    }

    /// Column at `position`, or `None` past the end.
    #[must_use]
    pub fn get_index(&self, position: usize) -> Option<ColumnRef<C>> {
        self.state.borrow().get_index(position)
    }

    /// Like [`get_index`](Self::get_index), but a position past the end is
    /// a [`CollectionError::PositionOutOfRange`].
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::PositionOutOfRange`] when `position` is
    /// not below [`len`](Self::len).
    pub fn try_get_index(&self, position: usize) -> Result<ColumnRef<C>, CollectionError> {
        let state = self.state.borrow();
        state
            .get_index(position)
            .ok_or_else(|| CollectionError::PositionOutOfRange {
                position,
                len: state.len(),
            })
    }

    /// Returns `true` when some column is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.borrow().contains_key(key)
    }

    /// Returns `true` when `column` (this exact instance) is a member.
    #[must_use]
    pub fn contains_column(&self, column: &ColumnRef<C>) -> bool {
        self.state.borrow().contains_column(column)
    }

    /// Entry keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().keys()
    }

    /// Column handles in order.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnRef<C>> {
        self.state.borrow().columns()
    }

    /// Ordered `(key, column)` entries.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, ColumnRef<C>)> {
        self.state.borrow().entry_pairs()
    }

    /// Snapshot iterator over the columns (see [`ColumnIterator`]).
    #[must_use]
    pub fn iter(&self) -> ColumnIterator<C> {
        ColumnIterator::new(self.state.borrow().columns())
    }

    /// Ordered structural equality between two views. `PartialEq`
    /// delegates here.
    #[must_use]
    pub fn compare(&self, other: &Self) -> bool {
        self.state.borrow().compare(&other.state.borrow())
    }

    /// Returns `true` when this view aliases `source`'s storage.
    ///
    /// Handles cloned from the same collection share storage, so a view is
    /// a view of every such handle, not only the one it was frozen from.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::SimpleColumn;
    ///
    /// let collection: ColumnCollection<SimpleColumn> = ColumnCollection::new();
    /// let detached: ColumnCollection<SimpleColumn> = ColumnCollection::new();
    ///
    /// let view = collection.as_immutable();
    /// assert!(view.is_view_of(&collection));
    /// assert!(view.is_view_of(&collection.clone()));
    /// assert!(!view.is_view_of(&detached));
    /// ```
    #[must_use]
    pub fn is_view_of<S>(&self, source: &S) -> bool
    where
        S: Freezable<Column = C>,
    {
        Rc::ptr_eq(&self.state, &source.as_immutable().state)
    }
}

impl<C> Clone for ImmutableColumnCollection<C> {
    /// Returns another view over the same storage.
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C> PartialEq for ImmutableColumnCollection<C> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl<C> Eq for ImmutableColumnCollection<C> {}

impl<C: std::fmt::Debug> std::fmt::Debug for ImmutableColumnCollection<C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        formatter
            .debug_map()
            .entries(state.entries.iter().map(|entry| (&entry.key, &entry.column)))
            .finish()
    }
}

impl<'a, C> IntoIterator for &'a ImmutableColumnCollection<C> {
    type Item = ColumnRef<C>;
    type IntoIter = ColumnIterator<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<C> IntoIterator for ImmutableColumnCollection<C> {
    type Item = ColumnRef<C>;
    type IntoIter = ColumnIterator<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

// A view serializes exactly like its source. There is deliberately no
// `Deserialize`: a view cannot exist without a source, so round trips go
// through `CollectionWithView`.
#[cfg(feature = "serde")]
impl<C: serde::Serialize> serde::Serialize for ImmutableColumnCollection<C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        crate::collection::state::serde_support::serialize_entries(&self.state.borrow(), serializer)
    }
}

// =============================================================================
// Tests
// =============================================================================
