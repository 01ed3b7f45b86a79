//! Identity-keyed entity contract.
//!
//! # Responsibility
//! - Expose and replace the identifier of a persisted record.
//! - Carry the enabled/disabled flag.
//! - Define the merge step used by every upsert path.
//!
//! # Invariants
//! - `merge_from` never changes the identifier of the stored record.
//! - `Identity` equality, hashing and ordering look at the identifier only.

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

/// Record persisted through a reader/writer pair.
///
/// Implementors keep their identifier and enabled flag as plain fields; the
/// trait only names the accessors so adapters can locate and merge records.
pub trait Entity {
    /// Identifier type. `Display` is used for file naming and diagnostics.
    type Id: Clone + Eq + Ord + Hash + Debug + Display;

    fn id(&self) -> &Self::Id;

    fn set_id(&mut self, id: Self::Id);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn enable(&mut self) {
        self.set_enabled(true);
    }

    fn disable(&mut self) {
        self.set_enabled(false);
    }

    /// Returns whether both records share one identifier, ignoring all other
    /// fields.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Overwrites every non-identity field with the values of `incoming`.
    ///
    /// # Invariants
    /// - The stored identifier survives even if `incoming` carries another.
    fn merge_from(&mut self, incoming: &Self)
    where
        Self: Clone,
    {
        let id = self.id().clone();
        *self = incoming.clone();
        self.set_id(id);
    }
}

/// Wrapper comparing, hashing and ordering entities by identifier only.
#[derive(Debug, Clone)]
pub struct Identity<E>(pub E);

impl<E: Entity> Identity<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<E: Entity> PartialEq for Identity<E> {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_identity(&other.0)
    }
}

impl<E: Entity> Eq for Identity<E> {}

impl<E: Entity> Hash for Identity<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

impl<E: Entity> PartialOrd for Identity<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Entity> Ord for Identity<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id().cmp(other.0.id())
    }
}

/// Finds the position of the first record sharing `id`.
pub(crate) fn position_of<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Applies one upsert onto an in-memory collection.
///
/// Returns `true` when an existing record was merged, `false` on append.
pub(crate) fn upsert_in_place<E: Entity + Clone>(items: &mut Vec<E>, incoming: E) -> bool {
    match position_of(items, incoming.id()) {
        Some(index) => {
            items[index].merge_from(&incoming);
            true
        }
        None => {
            items.push(incoming);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{upsert_in_place, Entity, Identity};
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        id: u32,
        label: String,
        enabled: bool,
    }

    impl Entity for Probe {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn set_id(&mut self, id: u32) {
            self.id = id;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    fn probe(id: u32, label: &str) -> Probe {
        Probe {
            id,
            label: label.to_string(),
            enabled: true,
        }
    }

    #[test]
    fn merge_from_keeps_stored_identifier() {
        let mut stored = probe(1, "old");
        let mut incoming = probe(9, "new");
        incoming.disable();

        stored.merge_from(&incoming);

        assert_eq!(stored.id, 1);
        assert_eq!(stored.label, "new");
        assert!(!stored.is_enabled());
    }

    #[test]
    fn identity_ignores_non_key_fields() {
        let mut set = HashSet::new();
        set.insert(Identity(probe(1, "a")));
        set.insert(Identity(probe(1, "b")));
        set.insert(Identity(probe(2, "a")));

        assert_eq!(set.len(), 2);
        assert!(Identity(probe(1, "x")) < Identity(probe(2, "a")));
    }

    #[test]
    fn upsert_in_place_merges_first_match_and_appends_otherwise() {
        let mut items = vec![probe(1, "a"), probe(2, "b")];

        assert!(upsert_in_place(&mut items, probe(2, "b2")));
        assert!(!upsert_in_place(&mut items, probe(3, "c")));

        let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b2", "c"]);
    }
}
