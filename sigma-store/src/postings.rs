//! Posting lists: the set of objects for a given `(predicate, subject)` pair.
//!
//! Starts as a flat, insertion-ordered array (cheap for the common case of a
//! handful of objects) and upgrades irreversibly to a hash set once it
//! grows past the configured threshold, trading iteration-order stability
//! for O(1) membership tests on hot (predicate, subject) pairs like
//! `(rdf:type, s)` for a heavily-typed subject `s`.

use rustc_hash::FxHashSet;

/// A dynamically-sized list of object ids sharing a `(predicate, subject)`.
pub enum PostingList {
    Array(Vec<u32>),
    Hash(FxHashSet<u32>),
}

impl PostingList {
    pub fn new() -> Self {
        PostingList::Array(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            PostingList::Array(v) => v.len(),
            PostingList::Hash(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, subject: u32) -> bool {
        match self {
            PostingList::Array(v) => v.contains(&subject),
            PostingList::Hash(s) => s.contains(&subject),
        }
    }

    /// Inserts `subject` if absent. Upgrades to a hash set once the array
    /// form exceeds `threshold` entries. Returns `true` if this was a new
    /// member.
    pub fn insert(&mut self, subject: u32, threshold: usize) -> bool {
        match self {
            PostingList::Array(v) => {
                if v.contains(&subject) {
                    return false;
                }
                v.push(subject);
                if v.len() > threshold {
                    let set: FxHashSet<u32> = v.drain(..).collect();
                    *self = PostingList::Hash(set);
                }
                true
            }
            PostingList::Hash(s) => s.insert(subject),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            PostingList::Array(v) => Box::new(v.iter().copied()),
            PostingList::Hash(s) => Box::new(s.iter().copied()),
        }
    }
}

impl Default for PostingList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_as_array() {
        let list = PostingList::new();
        assert!(matches!(list, PostingList::Array(_)));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut list = PostingList::new();
        assert!(list.insert(7, 32));
        assert!(!list.insert(7, 32));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn upgrades_past_threshold() {
        let mut list = PostingList::new();
        for i in 0..5 {
            list.insert(i, 3);
        }
        assert!(matches!(list, PostingList::Hash(_)));
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn contains_works_in_both_forms() {
        let mut list = PostingList::new();
        list.insert(1, 1);
        list.insert(2, 1);
        assert!(matches!(list, PostingList::Hash(_)));
        assert!(list.contains(1));
        assert!(list.contains(2));
        assert!(!list.contains(3));
    }

    #[test]
    fn iter_yields_all_members() {
        let mut list = PostingList::new();
        for i in 0..10 {
            list.insert(i, 2);
        }
        let mut seen: Vec<u32> = list.iter().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }
}
