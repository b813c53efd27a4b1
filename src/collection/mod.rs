//! Ordered, key-addressable column collections.
//!
//! The family has three members sharing one storage model:
//!
//! - [`ColumnCollection`]: lenient; keeps every entry, including duplicate
//!   keys and duplicate instances, and resolves keyed lookup to the first
//!   occurrence
//! - [`UniqueColumnCollection`]: strict; one active column per key, with
//!   validated keyed insertion, identity-based removal, and a dual-probe
//!   [`replace`](UniqueColumnCollection::replace)
//! - [`ImmutableColumnCollection`]: a read-only view frozen from either
//!   mutable variant through [`Freezable`], aliasing the source's storage
//!   rather than copying it
//!
//! Collections hold their columns through
//! [`ColumnRef`](crate::column::ColumnRef) handles, and all bookkeeping is
//! identity-based: the entry sequence, the key and position indexes, and
//! the membership set stay mutually consistent across every operation.
//!
//! With the `serde` feature enabled, the mutable variants and
//! [`CollectionWithView`] round-trip through any self-describing format;
//! the pair type is what preserves source/view aliasing across that trip.

mod immutable;
mod lenient;
#[cfg(feature = "serde")]
mod pair;
mod state;
mod unique;

pub use immutable::{Freezable, ImmutableColumnCollection};
pub use lenient::ColumnCollection;
#[cfg(feature = "serde")]
pub use pair::CollectionWithView;
pub use state::ColumnIterator;
pub use unique::UniqueColumnCollection;
