//! Deduplicating column collection.
//!
//! This module provides [`UniqueColumnCollection`], the strict member of
//! the collection family: at most one active column per key. Adding a
//! foreign column under an occupied key replaces the previous holder in
//! place, and [`replace`](UniqueColumnCollection::replace) resolves
//! existing entries by the incoming column's key *and* name before
//! inserting it at the earliest vacated slot.
//!
//! # Overview
//!
//! - `add` is infallible: re-adding the same instance is a no-op, and an
//!   occupied key is taken over in place, so positions of unrelated
//!   entries never move
//! - `add_keyed` and `from_entries` validate that the explicit key equals
//!   the column's own key and fail with
//!   [`CollectionError::KeyMismatch`] otherwise
//! - `remove` drops an entry by instance identity; later entries shift
//!   down one position
//! - `replace` may collapse two entries (one matched by key, one matched
//!   by name) into a single new one, shrinking the collection
//!
//! # Time Complexity
//!
//! | Operation                   | Cost           |
//! |-----------------------------|----------------|
//! | `add` (free key)            | O(1) amortized |
//! | `add` (occupied key)        | O(n)           |
//! | `get` / `contains_key`      | O(1)           |
//! | `get_index`                 | O(1)           |
//! | `contains_column`           | O(1)           |
//! | `remove` / `replace`        | O(n)           |
//! | `iter` / `keys` / `columns` | O(n)           |
//!
//! `remove` and `replace` rewrite the entry sequence because positions
//! shift, mirroring list-backed storage.
//!
//! # Examples
//!
//! ```rust
//! use colonnade::collection::UniqueColumnCollection;
//! use colonnade::column::column;
//!
//! let c2a = column("c2");
//! let c2b = column("c2");
//!
//! let collection = UniqueColumnCollection::new();
//! collection.add(column("c1"));
//! collection.add(c2a.clone());
//! collection.add(column("c3"));
//! collection.add(c2b.clone()); // takes over the "c2" slot in place
//!
//! assert_eq!(collection.len(), 3);
//! assert_eq!(collection.keys(), ["c1", "c2", "c3"]);
//! assert_eq!(collection.get_index(1), Some(c2b));
//! assert!(!collection.contains_column(&c2a));
//! ```

use std::rc::Rc;

use crate::collection::immutable::{Freezable, ImmutableColumnCollection};
use crate::collection::state::{CollectionState, ColumnIterator, SharedState};
use crate::column::{ColumnRef, Keyed};
use crate::error::CollectionError;

/// An ordered, key-addressable collection holding one active column per
/// key.
///
/// Like [`ColumnCollection`](crate::collection::ColumnCollection), this is
/// a handle to shared, interior-mutable storage: mutators take `&self`,
/// [`Clone`] aliases the storage, and
/// [`as_immutable`](UniqueColumnCollection::as_immutable) freezes a
/// read-only view over it. `UniqueColumnCollection` is neither [`Send`]
/// nor [`Sync`].
///
/// # Examples
///
/// ```rust
/// use colonnade::collection::UniqueColumnCollection;
/// use colonnade::column::column;
///
/// let collection = UniqueColumnCollection::new();
/// collection.add(column("id"));
/// collection.add(column("name"));
///
/// assert_eq!(collection.keys(), ["id", "name"]);
/// ```
pub struct UniqueColumnCollection<C> {
    state: SharedState<C>,
}

// Static assertions to verify UniqueColumnCollection is not Send/Sync
static_assertions::assert_not_impl_any!(UniqueColumnCollection<crate::column::SimpleColumn>: Send, Sync);
static_assertions::assert_not_impl_any!(UniqueColumnCollection<String>: Send, Sync);

impl<C> UniqueColumnCollection<C> {
    /// Creates an empty collection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::SimpleColumn;
    ///
    /// let collection: UniqueColumnCollection<SimpleColumn> = UniqueColumnCollection::new();
    /// assert!(collection.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CollectionState::new_shared(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Returns `true` when the collection holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active column under `key`, or `None` for an unknown key.
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
    /// not below [`len`](Self::len). A position that was valid before a
    /// `remove` or a collapsing `replace` may be out of range afterwards.
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
    ///
    /// Because the iterator owns its snapshot, removing elements while
    /// iterating neither skips nor repeats the remaining ones.
    #[must_use]
    pub fn iter(&self) -> ColumnIterator<C> {
        ColumnIterator::new(self.state.borrow().columns())
    }

    /// Ordered structural equality: same length and, per position, the
    /// same key with the identical column instance. `PartialEq` delegates
    /// here.
    #[must_use]
    pub fn compare(&self, other: &Self) -> bool {
        self.state.borrow().compare(&other.state.borrow())
    }

    /// Freezes a read-only view that aliases this collection's storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let collection = UniqueColumnCollection::new();
    /// let view = collection.as_immutable();
    ///
    /// collection.add(column("late"));
    /// assert_eq!(view.len(), 1);
    /// ```
    #[must_use]
    pub fn as_immutable(&self) -> ImmutableColumnCollection<C> {
        ImmutableColumnCollection::from_shared(Rc::clone(&self.state))
    }
}

impl<C: Keyed> UniqueColumnCollection<C> {
    /// Builds a collection from ordered `(key, column)` entries, applying
    /// the same validation and deduplication as repeated
    /// [`add_keyed`](Self::add_keyed).
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::KeyMismatch`] when an entry's key
    /// differs from its column's own key. Nothing is built in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let collection = UniqueColumnCollection::from_entries([
    ///     ("a", column("a")),
    ///     ("b", column("b")),
    /// ])
    /// .unwrap();
    /// assert_eq!(collection.keys(), ["a", "b"]);
    ///
    /// let mismatched = UniqueColumnCollection::from_entries([("x", column("a"))]);
    /// assert!(mismatched.is_err());
    /// ```
    pub fn from_entries<K, I>(entries: I) -> Result<Self, CollectionError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ColumnRef<C>)>,
    {
        let collection = Self::new();
        for (key, column) in entries {
            collection.add_keyed(key, column)?;
        }
        Ok(collection)
    }

    /// Adds `column` under its own key.
    ///
    /// Re-adding the same instance is a no-op. When a different column
    /// already holds the key, it is replaced in place through the
    /// [`replace`](Self::replace) mechanism, so the slot keeps its
    /// position. Otherwise the column is appended.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let first = column("c2");
    /// let second = column("c2");
    ///
    /// let collection = UniqueColumnCollection::new();
    /// collection.add(first.clone());
    /// collection.add(first.clone()); // no-op
    /// collection.add(second.clone()); // takes the slot over
    ///
    /// assert_eq!(collection.len(), 1);
    /// assert_eq!(collection.get("c2"), Some(second));
    /// assert!(!collection.contains_column(&first));
    /// ```
    pub fn add(&self, column: ColumnRef<C>) {
        self.state.borrow_mut().add_dedup(column);
    }

    /// Adds `column` under an explicit key, which must equal the column's
    /// own key.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::KeyMismatch`] when `key` differs from
    /// `column.key()`; the collection is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    /// use colonnade::error::CollectionError;
    ///
    /// let collection = UniqueColumnCollection::new();
    /// collection.add_keyed("c1", column("c1")).unwrap();
    ///
    /// let error = collection.add_keyed("other", column("c2")).unwrap_err();
    /// assert_eq!(
    ///     error,
    ///     CollectionError::KeyMismatch {
    ///         key: "other".to_string(),
    ///         column_key: "c2".to_string(),
    ///     }
    /// );
    /// assert_eq!(collection.len(), 1);
    /// ```
    pub fn add_keyed(
        &self,
        key: impl Into<String>,
        column: ColumnRef<C>,
    ) -> Result<(), CollectionError> {
        let key = key.into();
        if key != column.key() {
            return Err(CollectionError::KeyMismatch {
                key,
                column_key: column.key().to_string(),
            });
        }
        self.state.borrow_mut().add_dedup(column);
        Ok(())
    }

    /// Adds every column in `columns` in order, each under its own key.
    ///
    /// Columns whose key is already held collapse into the existing slot,
    /// so extending with known columns never reorders the collection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let c1 = column("c1");
    /// let collection = UniqueColumnCollection::new();
    /// collection.extend([c1.clone(), column("c2")]);
    /// collection.extend([c1, column("c3")]); // c1 is already present
    ///
    /// assert_eq!(collection.keys(), ["c1", "c2", "c3"]);
    /// ```
    pub fn extend(&self, columns: impl IntoIterator<Item = ColumnRef<C>>) {
        for column in columns {
            self.add(column);
        }
    }

    /// Removes `column` by instance identity; later entries shift down one
    /// position.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::AbsentColumn`] when `column` is not a
    /// member, including when only a different instance with the same key
    /// is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let b = column("b");
    /// let collection = UniqueColumnCollection::new();
    /// collection.extend([column("a"), b.clone(), column("c")]);
    ///
    /// collection.remove(&b).unwrap();
    /// assert_eq!(collection.keys(), ["a", "c"]);
    ///
    /// assert!(collection.remove(&b).is_err()); // already gone
    /// ```
    pub fn remove(&self, column: &ColumnRef<C>) -> Result<(), CollectionError> {
        let mut state = self.state.borrow_mut();
        match state.position_of(column) {
            Some(position) => {
                state.remove_at(position);
                Ok(())
            }
            None => Err(CollectionError::AbsentColumn {
                key: column.key().to_string(),
            }),
        }
    }

    /// Inserts `column`, first resolving what it supersedes.
    ///
    /// Up to two existing entries are removed before insertion:
    ///
    /// 1. the entry under the column's *name*, consulted only when the
    ///    name differs from the column's key and the matched entry's own
    ///    name equals its key
    /// 2. the entry under the column's *key*
    ///
    /// The new column lands at the position of the earliest removed entry,
    /// or at the end when nothing matched. When both probes hit, the
    /// collection shrinks by one. Replacing with the same column twice
    /// leaves the same state as replacing once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let collection = UniqueColumnCollection::new();
    /// collection.extend([column("c1"), column("c2"), column("c3")]);
    ///
    /// let replacement = column("c2");
    /// collection.replace(replacement.clone());
    ///
    /// assert_eq!(collection.keys(), ["c1", "c2", "c3"]);
    /// assert_eq!(collection.get_index(1), Some(replacement));
    /// ```
    ///
    /// A column whose name and key point at two different entries
    /// collapses both:
    ///
    /// ```rust
    /// use colonnade::collection::UniqueColumnCollection;
    /// use colonnade::column::{ColumnRef, SimpleColumn, column};
    ///
    /// let collection = UniqueColumnCollection::new();
    /// collection.extend([column("id"), column("street"), column("user_id")]);
    ///
    /// // named "id", stored under "street"
    /// let merged = ColumnRef::new(SimpleColumn::new("id").under_key("street"));
    /// collection.replace(merged.clone());
    ///
    /// assert_eq!(collection.keys(), ["street", "user_id"]);
    /// assert_eq!(collection.get_index(0), Some(merged));
    /// ```
    pub fn replace(&self, column: ColumnRef<C>) {
        self.state.borrow_mut().replace_strict(column);
    }
}

impl<C> Freezable for UniqueColumnCollection<C> {
    type Column = C;

    fn as_immutable(&self) -> ImmutableColumnCollection<C> {
        Self::as_immutable(self)
    }
}

impl<C> Clone for UniqueColumnCollection<C> {
    /// Returns another handle to the same storage, not a copy.
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C> Default for UniqueColumnCollection<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PartialEq for UniqueColumnCollection<C> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl<C> Eq for UniqueColumnCollection<C> {}

impl<C: std::fmt::Debug> std::fmt::Debug for UniqueColumnCollection<C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        formatter
            .debug_map()
            .entries(state.entries.iter().map(|entry| (&entry.key, &entry.column)))
            .finish()
    }
}

impl<C: Keyed> FromIterator<ColumnRef<C>> for UniqueColumnCollection<C> {
    fn from_iter<I: IntoIterator<Item = ColumnRef<C>>>(iter: I) -> Self {
        let collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl<'a, C> IntoIterator for &'a UniqueColumnCollection<C> {
    type Item = ColumnRef<C>;
    type IntoIter = ColumnIterator<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<C> IntoIterator for UniqueColumnCollection<C> {
    type Item = ColumnRef<C>;
    type IntoIter = ColumnIterator<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
use crate::collection::state::serde_support;

#[cfg(feature = "serde")]
impl<C: serde::Serialize> serde::Serialize for UniqueColumnCollection<C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde_support::serialize_entries(&self.state.borrow(), serializer)
    }
}

#[cfg(feature = "serde")]
struct UniqueColumnCollectionVisitor<C> {
    marker: std::marker::PhantomData<C>,
}

#[cfg(feature = "serde")]
impl<'de, C> serde::de::Visitor<'de> for UniqueColumnCollectionVisitor<C>
where
    C: serde::Deserialize<'de> + Keyed,
{
    type Value = UniqueColumnCollection<C>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a sequence of (key, share, column) entries with matching keys")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let capacity = seq
            .size_hint()
            .unwrap_or(0)
            .min(serde_support::MAX_PREALLOCATE);
        let mut handles: Vec<ColumnRef<C>> = Vec::with_capacity(capacity);

        let collection = UniqueColumnCollection::new();
        while let Some((key, share, column)) = seq.next_element::<(String, usize, ColumnRef<C>)>()?
        {
            let handle = serde_support::resolve_share(&mut handles, share, column)?;
            collection
                .add_keyed(key, handle)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(collection)
    }
}

#[cfg(feature = "serde")]
impl<'de, C> serde::Deserialize<'de> for UniqueColumnCollection<C>
where
    C: serde::Deserialize<'de> + Keyed,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(UniqueColumnCollectionVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
