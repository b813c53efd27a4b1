//! Duplicate-keeping column collection.
//!
//! This module provides [`ColumnCollection`], the lenient member of the
//! collection family: it stores every column it is given, in insertion
//! order, even when keys repeat or the very same column instance is added
//! twice.
//!
//! # Overview
//!
//! The lenient collection is deliberately asymmetric:
//! - **Iteration, positions, and length** always reflect the full entry
//!   sequence, duplicates included
//! - **Keyed lookup** resolves to the *first* column ever stored under a
//!   key; later entries under the same key stay visible to iteration but
//!   never shadow the key
//!
//! Collections are handles to shared storage: [`Clone`] produces another
//! handle to the *same* entries (mutations through either handle are
//! visible through both), and
//! [`as_immutable`](ColumnCollection::as_immutable) produces a read-only
//! view over that storage.
//!
//! # Time Complexity
//!
//! | Operation                        | Cost           |
//! |----------------------------------|----------------|
//! | `add` / `add_keyed`              | O(1) amortized |
//! | `get` / `contains_key`           | O(1)           |
//! | `get_index`                      | O(1)           |
//! | `contains_column`                | O(1)           |
//! | `len` / `is_empty`               | O(1)           |
//! | `iter` / `keys` / `columns`      | O(n)           |
//! | `compare`                        | O(n)           |
//!
//! # Examples
//!
//! ```rust
//! use colonnade::collection::ColumnCollection;
//! use colonnade::column::column;
//!
//! let c2a = column("c2");
//! let c2b = column("c2");
//!
//! let collection = ColumnCollection::new();
//! collection.add(column("c1"));
//! collection.add(c2a.clone());
//! collection.add(column("c3"));
//! collection.add(c2b.clone());
//!
//! assert_eq!(collection.len(), 4);
//! assert_eq!(collection.get("c2"), Some(c2a)); // first occurrence wins
//! assert!(collection.contains_column(&c2b)); // the later duplicate is still a member
//! ```

use std::rc::Rc;

use crate::collection::immutable::{Freezable, ImmutableColumnCollection};
use crate::collection::state::{CollectionState, ColumnIterator, SharedState};
use crate::column::{ColumnRef, Keyed};
use crate::error::CollectionError;

/// An ordered, key-addressable collection that keeps duplicates.
///
/// Columns are held through [`ColumnRef`] handles; membership and
/// comparison are identity-based, so two handles wrapping equal values are
/// distinct members. Keyed lookup favors the first column stored under a
/// key, while every other read reflects the full sequence.
///
/// The collection is a handle to shared, interior-mutable storage, which
/// is why the mutating operations take `&self`. `ColumnCollection` is
/// neither [`Send`] nor [`Sync`].
///
/// # Examples
///
/// ```rust
/// use colonnade::collection::ColumnCollection;
/// use colonnade::column::{Keyed, column};
///
/// let collection = ColumnCollection::new();
/// collection.add(column("total"));
///
/// let alias = collection.clone(); // same storage, not a copy
/// alias.add(column("count"));
///
/// assert_eq!(collection.len(), 2);
/// assert_eq!(collection.keys(), ["total", "count"]);
/// ```
pub struct ColumnCollection<C> {
    state: SharedState<C>,
}

// Static assertions to verify ColumnCollection is not Send/Sync
static_assertions::assert_not_impl_any!(ColumnCollection<crate::column::SimpleColumn>: Send, Sync);
static_assertions::assert_not_impl_any!(ColumnCollection<String>: Send, Sync);

impl<C> ColumnCollection<C> {
    /// Creates an empty collection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::SimpleColumn;
    ///
    /// let collection: ColumnCollection<SimpleColumn> = ColumnCollection::new();
    /// assert!(collection.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CollectionState::new_shared(),
        }
    }

    /// Builds a collection from ordered `(key, column)` entries, exactly as
    /// if each pair had been passed to [`add_keyed`](Self::add_keyed).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let a = column("a");
    /// let collection = ColumnCollection::from_entries([
    ///     ("a", a.clone()),
    ///     ("b", column("b")),
    /// ]);
    ///
    /// assert_eq!(collection.len(), 2);
    /// assert_eq!(collection.get("a"), Some(a));
    /// ```
    #[must_use]
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ColumnRef<C>)>,
    {
        let collection = Self::new();
        {
            let mut state = collection.state.borrow_mut();
            for (key, column) in entries {
                state.push_entry(key.into(), column);
            }
        }
        collection
    }

    /// Appends `column` under an explicit key.
    ///
    /// The key may legitimately differ from the column's own key. If the
    /// key is already indexed, the earlier column keeps it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let total = column("total");
    /// let collection = ColumnCollection::new();
    /// collection.add_keyed("sum", total.clone());
    ///
    /// assert_eq!(collection.get("sum"), Some(total));
    /// assert_eq!(collection.get("total"), None);
    /// ```
    pub fn add_keyed(&self, key: impl Into<String>, column: ColumnRef<C>) {
        self.state.borrow_mut().push_entry(key.into(), column);
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Returns `true` when the collection holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the column the key resolves to, or `None` for an unknown
    /// key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let c1 = column("c1");
    /// let collection = ColumnCollection::new();
    /// collection.add(c1.clone());
    ///
    /// assert_eq!(collection.get("c1"), Some(c1));
    /// assert_eq!(collection.get("missing"), None);
    /// ```
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

    /// Entry keys in order, duplicates included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let collection = ColumnCollection::new();
    /// collection.add(column("c1"));
    /// collection.add(column("c2"));
    /// collection.add(column("c2"));
    ///
    /// assert_eq!(collection.keys(), ["c1", "c2", "c2"]);
    /// ```
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().keys()
    }

    /// Column handles in order, duplicates included.
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

    /// Ordered structural equality: same length and, per position, the
    /// same key with the identical column instance.
    ///
    /// `PartialEq` delegates here.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let c1 = column("c1");
    /// let left = ColumnCollection::from_entries([("c1", c1.clone())]);
    /// let right = ColumnCollection::from_entries([("c1", c1)]);
    /// let other = ColumnCollection::from_entries([("c1", column("c1"))]);
    ///
    /// assert!(left.compare(&right));
    /// assert!(!left.compare(&other)); // equal value, different instance
    /// ```
    #[must_use]
    pub fn compare(&self, other: &Self) -> bool {
        self.state.borrow().compare(&other.state.borrow())
    }

    /// Freezes a read-only view that aliases this collection's storage.
    ///
    /// The view observes every later mutation made through this handle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let collection = ColumnCollection::new();
    /// let view = collection.as_immutable();
    ///
    /// collection.add(column("late"));
    /// assert_eq!(view.len(), 1);
    /// assert!(view.is_view_of(&collection));
    /// ```
    #[must_use]
    pub fn as_immutable(&self) -> ImmutableColumnCollection<C> {
        ImmutableColumnCollection::from_shared(Rc::clone(&self.state))
    }
}

impl<C: Keyed> ColumnCollection<C> {
    /// Appends `column` under its own key.
    ///
    /// Duplicate keys and duplicate instances are kept; an already-indexed
    /// key stays bound to its first column.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let first = column("c2");
    /// let collection = ColumnCollection::new();
    /// collection.add(first.clone());
    /// collection.add(column("c2"));
    ///
    /// assert_eq!(collection.len(), 2);
    /// assert_eq!(collection.get("c2"), Some(first));
    /// ```
    pub fn add(&self, column: ColumnRef<C>) {
        let key = column.key().to_string();
        self.state.borrow_mut().push_entry(key, column);
    }

    /// Appends every column in `columns`, each under its own key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::collection::ColumnCollection;
    /// use colonnade::column::column;
    ///
    /// let collection = ColumnCollection::new();
    /// collection.extend([column("a"), column("b")]);
    ///
    /// assert_eq!(collection.keys(), ["a", "b"]);
    /// ```
    pub fn extend(&self, columns: impl IntoIterator<Item = ColumnRef<C>>) {
        for column in columns {
            self.add(column);
        }
    }
}

impl<C> Freezable for ColumnCollection<C> {
    type Column = C;

    fn as_immutable(&self) -> ImmutableColumnCollection<C> {
        Self::as_immutable(self)
    }
}

impl<C> Clone for ColumnCollection<C> {
    /// Returns another handle to the same storage, not a copy.
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C> Default for ColumnCollection<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PartialEq for ColumnCollection<C> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl<C> Eq for ColumnCollection<C> {}

impl<C: std::fmt::Debug> std::fmt::Debug for ColumnCollection<C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        formatter
            .debug_map()
            .entries(state.entries.iter().map(|entry| (&entry.key, &entry.column)))
            .finish()
    }
}

impl<C: Keyed> FromIterator<ColumnRef<C>> for ColumnCollection<C> {
    fn from_iter<I: IntoIterator<Item = ColumnRef<C>>>(iter: I) -> Self {
        let collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl<'a, C> IntoIterator for &'a ColumnCollection<C> {
    type Item = ColumnRef<C>;
    type IntoIter = ColumnIterator<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<C> IntoIterator for ColumnCollection<C> {
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
impl<C: serde::Serialize> serde::Serialize for ColumnCollection<C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde_support::serialize_entries(&self.state.borrow(), serializer)
    }
}

#[cfg(feature = "serde")]
struct ColumnCollectionVisitor<C> {
    marker: std::marker::PhantomData<C>,
}

#[cfg(feature = "serde")]
impl<'de, C: serde::Deserialize<'de>> serde::de::Visitor<'de> for ColumnCollectionVisitor<C> {
    type Value = ColumnCollection<C>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a sequence of (key, share, column) entries")
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

        let collection = ColumnCollection::new();
        while let Some((key, share, column)) = seq.next_element::<(String, usize, ColumnRef<C>)>()?
        {
            let handle = serde_support::resolve_share(&mut handles, share, column)?;
            collection.add_keyed(key, handle);
        }
        Ok(collection)
    }
}

#[cfg(feature = "serde")]
impl<'de, C: serde::Deserialize<'de>> serde::Deserialize<'de> for ColumnCollection<C> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(ColumnCollectionVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
