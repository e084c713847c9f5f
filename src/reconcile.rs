//! Match planned nested objects with the ones in the state
//!
//! Nested objects (ACL rules, health checks, backends, listeners...) carry a remote ID
//! assigned by the API and a name chosen by the user.
//! A planned entry is paired with a state entry by ID when both sides have one,
//! and by name otherwise.
//! Unnamed entries without a usable ID fall back to a key derived from their fields.

use std::collections::HashMap;

use crate::value::Value;

/// Nested object with an identity
pub trait Identified {
    /// Remote ID, assigned by the API
    fn id(&self) -> Value<&str>;
    /// Name, chosen by the user
    fn name(&self) -> Value<&str>;
    /// Identity of an unnamed entry, derived from its fields
    fn natural_key(&self) -> Option<String> {
        None
    }
}

/// Nested object whose fields can be compared between plan and state
pub trait Reconcile: Identified {
    /// Check if any tracked field of the planned entry differs from the state entry
    fn changed_from(&self, state: &Self) -> bool;
}

fn key(value: Value<&str>) -> Option<&str> {
    if value.is_present() {
        value.as_option()
    } else {
        None
    }
}

/// Lookup of state entries by ID, by name and by natural key
///
/// When several entries share an identity, the first one wins.
#[derive(Debug)]
pub struct IdentityIndex<'s, T> {
    entries: &'s [T],
    by_id: HashMap<&'s str, usize>,
    by_name: HashMap<&'s str, usize>,
    /// Unnamed entries only
    by_natural_key: HashMap<String, usize>,
}

impl<'s, T: Identified> IdentityIndex<'s, T> {
    pub fn new(entries: &'s [T]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_natural_key = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(id) = key(entry.id()) {
                by_id.entry(id).or_insert(i);
            }
            match key(entry.name()) {
                Some(name) => {
                    by_name.entry(name).or_insert(i);
                }
                None => {
                    if let Some(natural_key) = entry.natural_key() {
                        by_natural_key.entry(natural_key).or_insert(i);
                    }
                }
            }
        }
        Self {
            entries,
            by_id,
            by_name,
            by_natural_key,
        }
    }

    /// Position of the state entry matching `entry`
    ///
    /// The ID is looked up first. The name, or the natural key of an unnamed entry,
    /// is only used if one of the two entries has no ID:
    /// two entries with different IDs never match, even if they share the same name.
    pub fn position(&self, entry: &impl Identified) -> Option<usize> {
        let id = key(entry.id());
        if let Some(&i) = id.and_then(|id| self.by_id.get(id)) {
            return Some(i);
        }
        let &i = match key(entry.name()) {
            Some(name) => self.by_name.get(name)?,
            None => self.by_natural_key.get(&entry.natural_key()?)?,
        };
        match (id, key(self.entries[i].id())) {
            (Some(_), Some(_)) => None,
            _ => Some(i),
        }
    }

    /// State entry matching `entry`
    pub fn find(&self, entry: &impl Identified) -> Option<&'s T> {
        self.position(entry).map(|i| &self.entries[i])
    }

    /// State entry with the given name
    pub fn by_name(&self, name: &str) -> Option<&'s T> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// State entry with the given ID
    pub fn by_id(&self, id: &str) -> Option<&'s T> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }
}

/// Planned entry paired with its state entry
#[derive(Debug)]
pub struct Matched<'p, 's, T> {
    pub plan: &'p T,
    pub state: &'s T,
}

impl<T> Clone for Matched<'_, '_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Matched<'_, '_, T> {}

/// Split of a planned collection against the state
#[derive(Debug)]
pub struct Changes<'p, 's, T> {
    /// Planned entries without a state counterpart, in plan order
    pub added: Vec<&'p T>,
    /// Every matched pair, in plan order
    pub matched: Vec<Matched<'p, 's, T>>,
    /// State entries matched by no planned entry, in state order
    pub removed: Vec<&'s T>,
}

impl<'p, 's, T: Identified> Changes<'p, 's, T> {
    pub fn new(plan: &'p [T], state: &'s [T]) -> Self {
        let index = IdentityIndex::new(state);
        let mut added = Vec::new();
        let mut matched = Vec::new();
        let mut seen = vec![false; state.len()];
        for entry in plan {
            match index.position(entry) {
                Some(i) => {
                    seen[i] = true;
                    matched.push(Matched {
                        plan: entry,
                        state: &state[i],
                    });
                }
                None => added.push(entry),
            }
        }
        let removed = state
            .iter()
            .zip(seen)
            .filter_map(|(entry, seen)| (!seen).then_some(entry))
            .collect();
        Self {
            added,
            matched,
            removed,
        }
    }

    /// Check if entries were added or removed
    pub fn membership_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

impl<'p, 's, T: Reconcile> Changes<'p, 's, T> {
    /// Matched pairs whose planned entry differs from the state
    pub fn changed(&self) -> impl Iterator<Item = Matched<'p, 's, T>> + '_ {
        self.matched
            .iter()
            .copied()
            .filter(|pair| pair.plan.changed_from(pair.state))
    }
}

/// Planned entries that must be updated, in plan order
///
/// New planned entries are not part of the output: they are created, not updated.
pub fn reconcile<'p, T: Reconcile>(plan: &'p [T], state: &[T]) -> Vec<&'p T> {
    Changes::new(plan, state)
        .changed()
        .map(|pair| pair.plan)
        .collect()
}
