//! Column handles and the item model for the collection family.
//!
//! # Overview
//!
//! Collections in this crate store opaque, caller-supplied items
//! ("columns") that expose two string attributes through the [`Keyed`]
//! trait: a storage `key` and a display `name`. Items are held through
//! [`ColumnRef`], a shared handle carrying a unique instance id: cloning a
//! handle preserves identity, constructing a new handle always mints a
//! fresh one. Identity equality is the foundation the collections'
//! membership and deduplication logic is built on, so two handles wrapping
//! equal values are still distinct members.
//!
//! [`SimpleColumn`] is a ready-made column for callers that do not bring
//! their own column type, and [`column`] builds a handle around one in a
//! single call.
//!
//! # Examples
//!
//! ```rust
//! use colonnade::column::{Keyed, column};
//!
//! let c1 = column("c1");
//! let alias = c1.clone();
//!
//! assert_eq!(c1, alias); // clones share identity
//! assert_ne!(c1, column("c1")); // fresh handles never do
//! assert_eq!(c1.key(), "c1");
//! assert_eq!(c1.name(), "c1");
//! ```

use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic source of instance ids for [`ColumnRef`].
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

fn next_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

// =============================================================================
// Keyed
// =============================================================================

/// Trait for items storable in the column collections.
///
/// A column exposes a storage `key` (the identifier collections address it
/// by when no explicit key is given) and a display `name`, which defaults
/// to the key. The two may legitimately differ; the deduplicating
/// collection's [`replace`](crate::collection::UniqueColumnCollection::replace)
/// operation probes by both.
///
/// Implementations should be cheap, side-effect-free accessors. Collections
/// call them while internal bookkeeping is in progress.
///
/// # Examples
///
/// ```rust
/// use colonnade::column::Keyed;
///
/// struct Numbered(u32);
///
/// impl Keyed for Numbered {
///     fn key(&self) -> &str {
///         match self.0 {
///             0 => "zero",
///             _ => "other",
///         }
///     }
/// }
///
/// assert_eq!(Numbered(0).key(), "zero");
/// assert_eq!(Numbered(0).name(), "zero"); // name defaults to key
/// ```
pub trait Keyed {
    /// Returns the key this column is stored under by default.
    fn key(&self) -> &str;

    /// Returns the column's display name.
    ///
    /// Defaults to [`key`](Keyed::key).
    fn name(&self) -> &str {
        self.key()
    }
}

// =============================================================================
// ColumnRef
// =============================================================================

struct ColumnCell<C> {
    id: u64,
    value: C,
}

/// A shared, identity-carrying handle to a column value.
///
/// `ColumnRef` is the currency of the collection family: collections store,
/// index, and compare handles rather than bare values. Every call to
/// [`ColumnRef::new`] mints a unique instance id; [`Clone`] shares it.
/// [`PartialEq`], [`Eq`], and [`Hash`] all operate on the id, never on the
/// wrapped value, so a `HashSet<ColumnRef<C>>` is a set of instances, not
/// of values.
///
/// The wrapped value is reachable through [`Deref`](std::ops::Deref) and
/// [`value`](ColumnRef::value).
///
/// `ColumnRef` uses single-threaded reference counting and is neither
/// [`Send`] nor [`Sync`].
///
/// # Examples
///
/// ```rust
/// use colonnade::column::{ColumnRef, Keyed, SimpleColumn};
///
/// let original = ColumnRef::new(SimpleColumn::new("total"));
/// let alias = original.clone();
/// let lookalike = ColumnRef::new(SimpleColumn::new("total"));
///
/// assert_eq!(original, alias);
/// assert_ne!(original, lookalike);
/// assert_eq!(original.value(), lookalike.value()); // values still compare
/// assert_eq!(original.key(), "total");
/// ```
pub struct ColumnRef<C> {
    cell: Rc<ColumnCell<C>>,
}

impl<C> ColumnRef<C> {
    /// Wraps `value` in a new handle with a fresh instance id.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::column::{ColumnRef, SimpleColumn};
    ///
    /// let first = ColumnRef::new(SimpleColumn::new("c1"));
    /// let second = ColumnRef::new(SimpleColumn::new("c1"));
    /// assert_ne!(first, second);
    /// ```
    #[must_use]
    pub fn new(value: C) -> Self {
        Self {
            cell: Rc::new(ColumnCell {
                id: next_instance_id(),
                value,
            }),
        }
    }

    /// Returns a shared reference to the wrapped value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::column::{ColumnRef, SimpleColumn};
    ///
    /// let column = ColumnRef::new(SimpleColumn::new("c1"));
    /// assert_eq!(column.value(), &SimpleColumn::new("c1"));
    /// ```
    #[inline]
    #[must_use]
    pub fn value(&self) -> &C {
        &self.cell.value
    }

    /// Returns `true` when the two handles denote the same instance.
    ///
    /// Agrees with `==`; provided for call sites that want the pointer
    /// comparison to be explicit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::column::{ColumnRef, SimpleColumn};
    ///
    /// let column = ColumnRef::new(SimpleColumn::new("c1"));
    /// let alias = column.clone();
    /// assert!(ColumnRef::ptr_eq(&column, &alias));
    /// assert!(!ColumnRef::ptr_eq(
    ///     &column,
    ///     &ColumnRef::new(SimpleColumn::new("c1"))
    /// ));
    /// ```
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.cell, &other.cell)
    }

    /// The instance id backing identity comparisons.
    #[inline]
    pub(crate) fn instance_id(&self) -> u64 {
        self.cell.id
    }
}

impl<C> Clone for ColumnRef<C> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<C> PartialEq for ColumnRef<C> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cell.id == other.cell.id
    }
}

impl<C> Eq for ColumnRef<C> {}

impl<C> Hash for ColumnRef<C> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.id.hash(state);
    }
}

impl<C> std::ops::Deref for ColumnRef<C> {
    type Target = C;

    #[inline]
    fn deref(&self) -> &C {
        &self.cell.value
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for ColumnRef<C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ColumnRef")
            .field("id", &self.cell.id)
            .field("value", &self.cell.value)
            .finish()
    }
}

// Static assertions to verify ColumnRef is not Send/Sync
static_assertions::assert_not_impl_any!(ColumnRef<SimpleColumn>: Send, Sync);
static_assertions::assert_not_impl_any!(ColumnRef<String>: Send, Sync);

// =============================================================================
// SimpleColumn
// =============================================================================

/// A minimal concrete column: an owned `key` and `name` pair.
///
/// [`SimpleColumn::new`] sets both attributes to the same string;
/// [`under_key`](SimpleColumn::under_key) stores the column under a key
/// that differs from its display name, which is what exercises the
/// dual-probe behavior of
/// [`replace`](crate::collection::UniqueColumnCollection::replace).
///
/// # Examples
///
/// ```rust
/// use colonnade::column::{Keyed, SimpleColumn};
///
/// let plain = SimpleColumn::new("id");
/// assert_eq!(plain.key(), "id");
/// assert_eq!(plain.name(), "id");
///
/// let aliased = SimpleColumn::new("id").under_key("street");
/// assert_eq!(aliased.key(), "street");
/// assert_eq!(aliased.name(), "id");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleColumn {
    key: String,
    name: String,
}

impl SimpleColumn {
    /// Creates a column whose key and name are both `name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::column::{Keyed, SimpleColumn};
    ///
    /// let column = SimpleColumn::new("c1");
    /// assert_eq!(column.key(), column.name());
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
        }
    }

    /// Rebinds the column's key, leaving its name untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colonnade::column::{Keyed, SimpleColumn};
    ///
    /// let column = SimpleColumn::new("id").under_key("street");
    /// assert_eq!(column.key(), "street");
    /// assert_eq!(column.name(), "id");
    /// ```
    #[must_use]
    pub fn under_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl Keyed for SimpleColumn {
    #[inline]
    fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }
}

/// Shorthand for `ColumnRef::new(SimpleColumn::new(name))`.
///
/// # Examples
///
/// ```rust
/// use colonnade::column::{Keyed, column};
///
/// let c1 = column("c1");
/// assert_eq!(c1.key(), "c1");
/// ```
#[must_use]
pub fn column(name: impl Into<String>) -> ColumnRef<SimpleColumn> {
    ColumnRef::new(SimpleColumn::new(name))
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<C: serde::Serialize> serde::Serialize for ColumnRef<C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.cell.value.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, C: serde::Deserialize<'de>> serde::Deserialize<'de> for ColumnRef<C> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        C::deserialize(deserializer).map(Self::new)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    // =========================================================================
    // Identity
    // =========================================================================

    #[test]
    fn test_fresh_handles_are_distinct_even_for_equal_values() {
        let first = column("c1");
        let second = column("c1");

        assert_ne!(first, second);
        assert!(!ColumnRef::ptr_eq(&first, &second));
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn test_clones_share_identity() {
        let original = column("c1");
        let alias = original.clone();

        assert_eq!(original, alias);
        assert!(ColumnRef::ptr_eq(&original, &alias));
        assert_eq!(original.instance_id(), alias.instance_id());
    }

    #[test]
    fn test_instance_ids_are_unique_across_handles() {
        let handles: Vec<_> = (0..100).map(|_| column("same")).collect();
        let ids: HashSet<u64> = handles.iter().map(ColumnRef::instance_id).collect();

        assert_eq!(ids.len(), handles.len());
    }

    #[test]
    fn test_hash_set_treats_clones_as_one_member() {
        let original = column("c1");
        let twin = column("c1");

        let mut set = HashSet::new();
        set.insert(original.clone());
        set.insert(original.clone());
        set.insert(twin.clone());

        assert_eq!(set.len(), 2);
        assert!(set.contains(&original));
        assert!(set.contains(&twin));
    }

    // =========================================================================
    // Value access
    // =========================================================================

    #[test]
    fn test_deref_reaches_keyed_accessors() {
        let aliased = ColumnRef::new(SimpleColumn::new("id").under_key("street"));

        assert_eq!(aliased.key(), "street");
        assert_eq!(aliased.name(), "id");
    }

    #[test]
    fn test_debug_output_names_the_handle_and_value() {
        let handle = column("c1");
        let rendered = format!("{handle:?}");

        assert!(rendered.contains("ColumnRef"));
        assert!(rendered.contains("SimpleColumn"));
        assert!(rendered.contains("c1"));
    }

    // =========================================================================
    // SimpleColumn
    // =========================================================================

    #[rstest]
    #[case::plain("c1")]
    #[case::empty("")]
    #[case::spaced("user id")]
    fn test_simple_column_new_sets_key_and_name(#[case] name: &str) {
        let column = SimpleColumn::new(name);

        assert_eq!(column.key(), name);
        assert_eq!(column.name(), name);
    }

    #[test]
    fn test_under_key_rebinds_key_only() {
        let column = SimpleColumn::new("id").under_key("street");

        assert_eq!(column.key(), "street");
        assert_eq!(column.name(), "id");
    }

    #[test]
    fn test_simple_columns_compare_by_value() {
        assert_eq!(SimpleColumn::new("c1"), SimpleColumn::new("c1"));
        assert_ne!(
            SimpleColumn::new("c1"),
            SimpleColumn::new("c1").under_key("other")
        );
    }

    #[test]
    fn test_default_name_tracks_key_for_custom_items() {
        struct Bare;

        impl Keyed for Bare {
            fn key(&self) -> &str {
                "bare"
            }
        }

        assert_eq!(Bare.name(), "bare");
    }
}
