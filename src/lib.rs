//! # colonnade
//!
//! Ordered, key-addressable column collections with deduplicating
//! variants and live immutable views.
//!
//! ## Overview
//!
//! This library models a named sequence of opaque items ("columns" of a
//! table-like structure) and keeps three structures consistent for every
//! collection: the ordered entry sequence, O(1) key and position indexes,
//! and an identity-based membership set. It provides:
//!
//! - **Lenient collections**: [`ColumnCollection`](collection::ColumnCollection)
//!   keeps duplicate keys and duplicate instances; keyed lookup favors the
//!   first occurrence
//! - **Deduplicating collections**: [`UniqueColumnCollection`](collection::UniqueColumnCollection)
//!   holds one active column per key, with in-place key takeover and a
//!   dual-probe `replace`
//! - **Immutable views**: [`ImmutableColumnCollection`](collection::ImmutableColumnCollection)
//!   aliases a mutable collection's storage, observing later mutations
//!   without being able to make any
//! - **Identity-carrying handles**: [`ColumnRef`](column::ColumnRef)
//!   distinguishes instances from equal values, which is what membership,
//!   deduplication, and comparison are built on
//!
//! Collections use single-threaded shared ownership internally; none of
//! the types are `Send` or `Sync`.
//!
//! ## Feature Flags
//!
//! - `serde` (default): `Serialize`/`Deserialize` for the collection
//!   family, plus [`CollectionWithView`](collection::CollectionWithView)
//!   for round-tripping a collection together with a view without severing
//!   their aliasing
//!
//! ## Example
//!
//! ```rust
//! use colonnade::prelude::*;
//!
//! let users = UniqueColumnCollection::new();
//! users.add(column("id"));
//! users.add(column("email"));
//!
//! let view = users.as_immutable();
//! users.replace(column("email")); // the view observes the replacement
//!
//! assert_eq!(view.keys(), ["id", "email"]);
//! assert!(view.is_view_of(&users));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use colonnade::prelude::*;
/// ```
pub mod prelude {

    pub use crate::collection::*;

    pub use crate::column::*;

    pub use crate::error::*;
}

pub mod collection;

pub mod column;

pub mod error;

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_prelude_covers_the_public_surface() {
        let collection = ColumnCollection::new();
        collection.add(column("smoke"));

        let result: Result<ColumnRef<SimpleColumn>, CollectionError> = collection.try_get("smoke");
        assert!(result.is_ok());
    }
}
