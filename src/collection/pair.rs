//! A serializable bundle of a mutable collection and one of its views.
//!
//! Serializing a collection and a view separately would sever their
//! aliasing: each would deserialize into its own storage.
//! [`CollectionWithView`] keeps the pair together so the round trip
//! preserves the relationship: only the collection is written to the
//! stream, and deserialization re-freezes the view from the rebuilt
//! collection. Mutating the deserialized collection is therefore still
//! observable through the deserialized view.
//!
//! # Examples
//!
//! ```rust
//! use colonnade::collection::{CollectionWithView, UniqueColumnCollection};
//! use colonnade::column::{SimpleColumn, column};
//!
//! let collection = UniqueColumnCollection::new();
//! collection.add(column("id"));
//! let pair = CollectionWithView::new(collection);
//!
//! let json = serde_json::to_string(&pair).unwrap();
//! let restored: CollectionWithView<UniqueColumnCollection<SimpleColumn>> =
//!     serde_json::from_str(&json).unwrap();
//!
//! restored.collection().add(column("email"));
//! assert_eq!(restored.view().len(), 2); // aliasing survived the trip
//! assert!(restored.view().is_view_of(restored.collection()));
//! ```

use std::marker::PhantomData;

use crate::collection::immutable::{Freezable, ImmutableColumnCollection};

/// A mutable collection bundled with a view frozen from it.
///
/// The pair's invariant is that [`view`](CollectionWithView::view) always
/// aliases [`collection`](CollectionWithView::collection)'s storage, both
/// before and after a serialization round trip.
pub struct CollectionWithView<T: Freezable> {
    collection: T,
    view: ImmutableColumnCollection<T::Column>,
}

impl<T: Freezable> CollectionWithView<T> {
    /// Bundles `collection` with a freshly frozen view of it.
    #[must_use]
    pub fn new(collection: T) -> Self {
        let view = collection.as_immutable();
        Self { collection, view }
    }

    /// The mutable side of the pair.
    #[must_use]
    pub fn collection(&self) -> &T {
        &self.collection
    }

    /// The read-only side of the pair.
    #[must_use]
    pub fn view(&self) -> &ImmutableColumnCollection<T::Column> {
        &self.view
    }

    /// Unbundles the pair, dropping the view.
    #[must_use]
    pub fn into_collection(self) -> T {
        self.collection
    }
}

impl<T: Freezable + Clone> Clone for CollectionWithView<T> {
    /// Clones both handles; collection clones alias their storage, so the
    /// cloned pair still satisfies the aliasing invariant.
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            view: self.view.clone(),
        }
    }
}

impl<T> std::fmt::Debug for CollectionWithView<T>
where
    T: Freezable + std::fmt::Debug,
    T::Column: std::fmt::Debug,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CollectionWithView")
            .field("collection", &self.collection)
            .field("view", &self.view)
            .finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

impl<T> serde::Serialize for CollectionWithView<T>
where
    T: Freezable + serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_newtype_struct("CollectionWithView", &self.collection)
    }
}

struct CollectionWithViewVisitor<T> {
    marker: PhantomData<T>,
}

impl<'de, T> serde::de::Visitor<'de> for CollectionWithViewVisitor<T>
where
    T: Freezable + serde::Deserialize<'de>,
{
    type Value = CollectionWithView<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a serialized collection")
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(CollectionWithView::new)
    }
}

impl<'de, T> serde::Deserialize<'de> for CollectionWithView<T>
where
    T: Freezable + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(
            "CollectionWithView",
            CollectionWithViewVisitor {
                marker: PhantomData,
            },
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
