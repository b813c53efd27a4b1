//! Shared storage backing every collection variant.
//!
//! A collection is a handle to one [`CollectionState`] allocation, shared
//! through [`SharedState`]. Three structures are kept mutually consistent
//! under a single `RefCell` borrow per operation:
//!
//! ```text
//!                 ┌─────────────────────────────────────────────┐
//!                 │ CollectionState                             │
//!                 │                                             │
//!  order, dupes ─►│ entries:      [(key, column), ...]          │
//!                 │                                             │
//!  O(1) lookup ──►│ index.by_key:      key -> column            │
//!                 │ index.by_position: position -> column       │
//!                 │                                             │
//!  membership ───►│ active:       { column, ... }               │
//!                 └─────────────────────────────────────────────┘
//! ```
//!
//! Invariants held after every mutation:
//! - `index.by_position[p]` is identity-equal to `entries[p].column` for
//!   every valid position `p`
//! - `index.by_key[k]` is the first entry stored under `k` (for the
//!   deduplicating collection this is also the only one)
//! - `active` equals the set of columns appearing in `entries`
//!
//! Validation happens before the first structure is touched, so a failed
//! operation leaves all three untouched.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::column::{ColumnRef, Keyed};

/// The shared-ownership pointer every collection handle and view holds.
pub(crate) type SharedState<C> = Rc<RefCell<CollectionState<C>>>;

/// One slot of the entry sequence.
pub(crate) struct Entry<C> {
    pub(crate) key: String,
    pub(crate) column: ColumnRef<C>,
}

/// Key and position lookup structures, rebuilt wholesale after any
/// operation that moves entries around.
pub(crate) struct ColumnIndex<C> {
    pub(crate) by_key: HashMap<String, ColumnRef<C>>,
    pub(crate) by_position: Vec<ColumnRef<C>>,
}

/// The storage every variant operates on.
pub(crate) struct CollectionState<C> {
    pub(crate) entries: Vec<Entry<C>>,
    pub(crate) index: ColumnIndex<C>,
    pub(crate) active: HashSet<ColumnRef<C>>,
}

impl<C> CollectionState<C> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: ColumnIndex {
                by_key: HashMap::new(),
                by_position: Vec::new(),
            },
            active: HashSet::new(),
        }
    }

    pub(crate) fn new_shared() -> SharedState<C> {
        Rc::new(RefCell::new(Self::new()))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Appends an entry, updating all three structures. The key index
    /// keeps the first column stored under a key; later entries with the
    /// same key stay in the sequence but do not shadow it.
    pub(crate) fn push_entry(&mut self, key: String, column: ColumnRef<C>) {
        self.index.by_position.push(column.clone());
        if !self.index.by_key.contains_key(&key) {
            self.index.by_key.insert(key.clone(), column.clone());
        }
        self.active.insert(column.clone());
        self.entries.push(Entry { key, column });
    }

    /// Removes the entry at `position`; later entries shift down one slot.
    pub(crate) fn remove_at(&mut self, position: usize) {
        let entry = self.entries.remove(position);
        self.active.remove(&entry.column);
        self.rebuild_index();
    }

    /// Position of the entry holding `column` (identity comparison).
    pub(crate) fn position_of(&self, column: &ColumnRef<C>) -> Option<usize> {
        self.entries.iter().position(|entry| entry.column == *column)
    }

    /// Reconstructs both lookup structures from the entry sequence.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.by_position.clear();
        self.index.by_key.clear();
        for entry in &self.entries {
            self.index.by_position.push(entry.column.clone());
            if !self.index.by_key.contains_key(&entry.key) {
                self.index
                    .by_key
                    .insert(entry.key.clone(), entry.column.clone());
            }
        }
    }

    // =========================================================================
    // Reads shared by every variant
    // =========================================================================

    pub(crate) fn get(&self, key: &str) -> Option<ColumnRef<C>> {
        self.index.by_key.get(key).cloned()
    }

    pub(crate) fn get_index(&self, position: usize) -> Option<ColumnRef<C>> {
        self.index.by_position.get(position).cloned()
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.index.by_key.contains_key(key)
    }

    pub(crate) fn contains_column(&self, column: &ColumnRef<C>) -> bool {
        self.active.contains(column)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key.clone()).collect()
    }

    pub(crate) fn columns(&self) -> Vec<ColumnRef<C>> {
        self.index.by_position.clone()
    }

    pub(crate) fn entry_pairs(&self) -> Vec<(String, ColumnRef<C>)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.column.clone()))
            .collect()
    }

    /// Ordered structural equality: same length, and per position the same
    /// key with the identical column instance.
    pub(crate) fn compare(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(left, right)| left.key == right.key && left.column == right.column)
    }
}

impl<C: Keyed> CollectionState<C> {
    /// Deduplicating insertion: identity re-adds are no-ops, a foreign
    /// column under an occupied key takes the slot over via
    /// [`replace_strict`](Self::replace_strict), and a free key appends.
    pub(crate) fn add_dedup(&mut self, column: ColumnRef<C>) {
        let existing = self.index.by_key.get(column.key()).cloned();
        match existing {
            Some(existing) if existing == column => {}
            Some(_) => self.replace_strict(column),
            None => {
                let key = column.key().to_string();
                self.push_entry(key, column);
            }
        }
    }

    /// Resolves up to two existing entries against `column`, removes them,
    /// and inserts `column` at the position of the earliest removal (or at
    /// the end when nothing matched).
    ///
    /// The two probes:
    /// 1. the column's `name`, consulted only when it differs from its
    ///    `key`, and only allowed to match an entry whose own name equals
    ///    its key
    /// 2. the column's `key`, unconditionally
    pub(crate) fn replace_strict(&mut self, column: ColumnRef<C>) {
        let key = column.key().to_string();

        let mut removals: SmallVec<[ColumnRef<C>; 2]> = SmallVec::new();
        if column.name() != key {
            if let Some(other) = self.index.by_key.get(column.name()) {
                if other.name() == other.key() {
                    removals.push(other.clone());
                }
            }
        }
        if let Some(other) = self.index.by_key.get(&key) {
            if removals.iter().all(|candidate| candidate != other) {
                removals.push(other.clone());
            }
        }

        if removals.is_empty() {
            self.push_entry(key, column);
            return;
        }

        let mut replaced = false;
        let mut rebuilt = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if removals.contains(&entry.column) {
                if !replaced {
                    replaced = true;
                    rebuilt.push(Entry {
                        key: key.clone(),
                        column: column.clone(),
                    });
                }
            } else {
                rebuilt.push(entry);
            }
        }
        self.entries = rebuilt;

        for removed in &removals {
            self.active.remove(removed);
        }
        self.active.insert(column);
        self.rebuild_index();
    }
}

#[cfg(test)]
impl<C: std::fmt::Debug> CollectionState<C> {
    /// Cross-checks the three structures against each other.
    pub(crate) fn assert_integrity(&self) {
        assert_eq!(
            self.index.by_position.len(),
            self.entries.len(),
            "position index length diverged from entry sequence"
        );
        for (position, entry) in self.entries.iter().enumerate() {
            assert_eq!(
                self.index.by_position[position], entry.column,
                "position index diverged at {position}"
            );
        }

        let expected_active: HashSet<ColumnRef<C>> = self
            .entries
            .iter()
            .map(|entry| entry.column.clone())
            .collect();
        assert_eq!(self.active, expected_active, "active set diverged");

        let mut first_seen: HashMap<&str, &ColumnRef<C>> = HashMap::new();
        for entry in &self.entries {
            first_seen.entry(entry.key.as_str()).or_insert(&entry.column);
        }
        assert_eq!(
            self.index.by_key.len(),
            first_seen.len(),
            "key index holds keys absent from the entry sequence"
        );
        for (key, column) in &self.index.by_key {
            assert_eq!(
                first_seen.get(key.as_str()),
                Some(&column),
                "key index diverged for {key:?}"
            );
        }
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
pub(crate) mod serde_support {
    //! Wire format shared by the collection family.
    //!
    //! A collection serializes as a sequence of `(key, share, column)`
    //! triples, where `share` is the position of the entry's first
    //! identity-equal occurrence. Entries whose `share` points backwards
    //! reuse the handle deserialized at that position, which is how a
    //! duplicate-instance pattern survives a round trip.

    use std::collections::HashMap;

    use serde::ser::SerializeSeq;

    use super::CollectionState;
    use crate::column::ColumnRef;

    /// Upper bound for trusting a stream's length hint.
    pub(crate) const MAX_PREALLOCATE: usize = 4096;

    pub(crate) fn serialize_entries<C, S>(
        state: &CollectionState<C>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        C: serde::Serialize,
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(state.entries.len()))?;
        let mut first_occurrence: HashMap<u64, usize> = HashMap::new();
        for (position, entry) in state.entries.iter().enumerate() {
            let share = *first_occurrence
                .entry(entry.column.instance_id())
                .or_insert(position);
            seq.serialize_element(&(&entry.key, share, &entry.column))?;
        }
        seq.end()
    }

    /// Resolves one deserialized triple against the handles already built,
    /// honoring backward `share` references.
    pub(crate) fn resolve_share<C, E>(
        handles: &mut Vec<ColumnRef<C>>,
        share: usize,
        column: ColumnRef<C>,
    ) -> Result<ColumnRef<C>, E>
    where
        E: serde::de::Error,
    {
        let position = handles.len();
        let handle = if share == position {
            column
        } else if share < position {
            handles[share].clone()
        } else {
            return Err(E::custom(format!(
                "share index {share} references position {position} or later"
            )));
        };
        handles.push(handle.clone());
        Ok(handle)
    }
}

// =============================================================================
// ColumnIterator
// =============================================================================

/// Snapshot iterator over a collection's columns.
///
/// The iterator owns a copy of the column handles taken when it was
/// created, so mutating the collection while iterating affects neither the
/// elements yielded nor their order. Removing an element other than the
/// one currently held never skips or repeats the remaining elements.
///
/// # Examples
///
/// ```rust
/// use colonnade::collection::ColumnCollection;
/// use colonnade::column::{Keyed, column};
///
/// let collection = ColumnCollection::new();
/// collection.add(column("a"));
/// collection.add(column("b"));
///
/// let keys: Vec<String> = collection
///     .iter()
///     .map(|column| column.key().to_string())
///     .collect();
/// assert_eq!(keys, ["a", "b"]);
/// ```
pub struct ColumnIterator<C> {
    inner: std::vec::IntoIter<ColumnRef<C>>,
}

impl<C> ColumnIterator<C> {
    pub(crate) fn new(columns: Vec<ColumnRef<C>>) -> Self {
        Self {
            inner: columns.into_iter(),
        }
    }
}

impl<C> Iterator for ColumnIterator<C> {
    type Item = ColumnRef<C>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<C> DoubleEndedIterator for ColumnIterator<C> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<C> ExactSizeIterator for ColumnIterator<C> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<C> std::iter::FusedIterator for ColumnIterator<C> {}

impl<C> Clone for ColumnIterator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for ColumnIterator<C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ColumnIterator")
            .field("remaining", &self.inner.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{SimpleColumn, column};

    fn state_of(entries: &[(&str, &ColumnRef<SimpleColumn>)]) -> CollectionState<SimpleColumn> {
        let mut state = CollectionState::new();
        for (key, column) in entries {
            state.push_entry((*key).to_string(), (*column).clone());
        }
        state
    }

    // =========================================================================
    // push_entry
    // =========================================================================

    #[test]
    fn test_push_entry_updates_all_three_structures() {
        let c1 = column("c1");
        let state = state_of(&[("c1", &c1)]);

        assert_eq!(state.len(), 1);
        assert_eq!(state.get("c1"), Some(c1.clone()));
        assert_eq!(state.get_index(0), Some(c1.clone()));
        assert!(state.contains_column(&c1));
        state.assert_integrity();
    }

    #[test]
    fn test_push_entry_keeps_first_column_per_key() {
        let first = column("c2");
        let second = column("c2");
        let state = state_of(&[("c2", &first), ("c2", &second)]);

        assert_eq!(state.len(), 2);
        assert_eq!(state.get("c2"), Some(first));
        assert_eq!(state.get_index(1), Some(second));
        state.assert_integrity();
    }

    // =========================================================================
    // remove_at / position_of
    // =========================================================================

    #[test]
    fn test_remove_at_shifts_later_positions_down() {
        let c1 = column("c1");
        let c2 = column("c2");
        let c3 = column("c3");
        let mut state = state_of(&[("c1", &c1), ("c2", &c2), ("c3", &c3)]);

        state.remove_at(1);

        assert_eq!(state.len(), 2);
        assert_eq!(state.get_index(0), Some(c1));
        assert_eq!(state.get_index(1), Some(c3));
        assert_eq!(state.get("c2"), None);
        assert!(!state.contains_column(&c2));
        state.assert_integrity();
    }

    #[test]
    fn test_position_of_uses_identity_not_value() {
        let stored = column("c1");
        let lookalike = column("c1");
        let state = state_of(&[("c1", &stored)]);

        assert_eq!(state.position_of(&stored), Some(0));
        assert_eq!(state.position_of(&lookalike), None);
    }

    // =========================================================================
    // add_dedup
    // =========================================================================

    #[test]
    fn test_add_dedup_is_noop_for_identity_readd() {
        let c1 = column("c1");
        let mut state = state_of(&[("c1", &c1)]);

        state.add_dedup(c1.clone());

        assert_eq!(state.len(), 1);
        assert_eq!(state.get("c1"), Some(c1));
        state.assert_integrity();
    }

    #[test]
    fn test_add_dedup_takes_over_occupied_key_in_place() {
        let c1 = column("c1");
        let c2a = column("c2");
        let c3 = column("c3");
        let c2b = column("c2");
        let mut state = state_of(&[("c1", &c1), ("c2", &c2a), ("c3", &c3)]);

        state.add_dedup(c2b.clone());

        assert_eq!(state.len(), 3);
        assert_eq!(state.get_index(1), Some(c2b.clone()));
        assert_eq!(state.get("c2"), Some(c2b));
        assert!(!state.contains_column(&c2a));
        state.assert_integrity();
    }

    // =========================================================================
    // replace_strict
    // =========================================================================

    #[test]
    fn test_replace_appends_when_nothing_matches() {
        let c1 = column("c1");
        let c2 = column("c2");
        let mut state = state_of(&[("c1", &c1)]);

        state.replace_strict(c2.clone());

        assert_eq!(state.len(), 2);
        assert_eq!(state.get_index(1), Some(c2));
        state.assert_integrity();
    }

    #[test]
    fn test_replace_collapses_key_and_name_matches_into_earliest_slot() {
        let id = column("id");
        let street = column("street");
        let user_id = column("user_id");
        let mut state = state_of(&[("id", &id), ("street", &street), ("user_id", &user_id)]);

        let incoming = ColumnRef::new(SimpleColumn::new("id").under_key("street"));
        state.replace_strict(incoming.clone());

        assert_eq!(state.len(), 2);
        assert_eq!(state.get_index(0), Some(incoming.clone()));
        assert_eq!(state.get_index(1), Some(user_id));
        assert_eq!(state.get("street"), Some(incoming));
        assert_eq!(state.get("id"), None);
        assert!(!state.contains_column(&id));
        assert!(!state.contains_column(&street));
        state.assert_integrity();
    }

    #[test]
    fn test_replace_name_probe_skips_aliased_entries() {
        // the entry under "c2" declares a different display name, so an
        // incoming column named "c2" must not evict it through the name probe
        let aliased = ColumnRef::new(SimpleColumn::new("other").under_key("c2"));
        let mut state = state_of(&[("c2", &aliased)]);

        let incoming = ColumnRef::new(SimpleColumn::new("c2").under_key("q"));
        state.replace_strict(incoming.clone());

        assert_eq!(state.len(), 2);
        assert!(state.contains_column(&aliased));
        assert_eq!(state.get("q"), Some(incoming));
        state.assert_integrity();
    }

    #[test]
    fn test_replace_twice_matches_replace_once() {
        let c1 = column("c1");
        let c2a = column("c2");
        let mut once = state_of(&[("c1", &c1), ("c2", &c2a)]);
        let mut twice = state_of(&[("c1", &c1), ("c2", &c2a)]);

        let c2b = column("c2");
        once.replace_strict(c2b.clone());
        twice.replace_strict(c2b.clone());
        twice.replace_strict(c2b);

        assert!(once.compare(&twice));
        once.assert_integrity();
        twice.assert_integrity();
    }

    // =========================================================================
    // compare
    // =========================================================================

    #[test]
    fn test_compare_requires_identical_columns_per_position() {
        let c1 = column("c1");
        let c2 = column("c2");
        let left = state_of(&[("c1", &c1), ("c2", &c2)]);
        let same = state_of(&[("c1", &c1), ("c2", &c2)]);
        let shorter = state_of(&[("c1", &c1)]);
        let twin = state_of(&[("c1", &c1), ("c2", &column("c2"))]);

        assert!(left.compare(&same));
        assert!(!left.compare(&shorter));
        assert!(!left.compare(&twin));
    }

    #[test]
    fn test_compare_requires_matching_keys() {
        let c1 = column("c1");
        let left = state_of(&[("c1", &c1)]);
        let rekeyed = state_of(&[("other", &c1)]);

        assert!(!left.compare(&rekeyed));
    }
}
