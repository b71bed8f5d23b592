//! The triple store: predicate/object presence bit matrices plus posting
//! lists, addressed directly by interned term id.

use sigma_config::StoreConfig;
use tracing::{instrument, trace};

use crate::bitmatrix::{iter_set_bits, BitMatrix};
use crate::error::{StoreError, StoreResult};
use crate::postings::PostingList;
use crate::TermId;

/// A fully-bound `(s, p, o)` query, as consumed by [`TripleStore::ask_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub s: TermId,
    pub p: TermId,
    pub o: TermId,
}

impl Pattern {
    pub const fn new(s: TermId, p: TermId, o: TermId) -> Self {
        Self { s, p, o }
    }
}

/// Bit-matrix indexed triple graph, addressed directly by term id: row/column
/// indices are the raw `u32` values of the interned ids, bounded by the
/// store's configured capacities.
pub struct TripleStore {
    config: StoreConfig,
    /// Row `p`, column `s`: predicate `p` has at least one triple from `s`.
    predicate_presence: BitMatrix,
    /// Row `o`, column `s`: `o` is an object of `s` under some predicate.
    object_presence: BitMatrix,
    /// Dense `max_predicates * max_subjects` table of posting lists.
    postings: Vec<Option<Box<PostingList>>>,
}

impl TripleStore {
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let predicate_presence = BitMatrix::new(config.max_predicates, config.max_subjects)?;
        let object_presence = BitMatrix::new(config.max_objects, config.max_subjects)?;
        let slots = config
            .max_predicates
            .checked_mul(config.max_subjects)
            .ok_or(StoreError::OutOfMemory {
                what: "posting list table",
            })?;
        let mut postings = Vec::new();
        postings
            .try_reserve_exact(slots)
            .map_err(|_| StoreError::OutOfMemory {
                what: "posting list table",
            })?;
        postings.resize_with(slots, || None);

        Ok(Self {
            config,
            predicate_presence,
            object_presence,
            postings,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn max_subjects(&self) -> usize {
        self.config.max_subjects
    }

    pub fn max_predicates(&self) -> usize {
        self.config.max_predicates
    }

    pub fn max_objects(&self) -> usize {
        self.config.max_objects
    }

    fn posting_index(&self, p_idx: usize, s_idx: usize) -> usize {
        p_idx * self.config.max_subjects + s_idx
    }

    fn check_range(id: TermId, capacity: usize) -> StoreResult<usize> {
        let idx = id.as_u32() as usize;
        if idx >= capacity {
            return Err(StoreError::OutOfRange {
                id: id.as_u32(),
                capacity,
            });
        }
        Ok(idx)
    }

    /// Adds `(s, p, o)`. Returns `Ok(true)` if this was a new triple,
    /// `Ok(false)` if it already existed (idempotent no-op).
    #[instrument(skip(self), fields(s = s.as_u32(), p = p.as_u32(), o = o.as_u32()))]
    pub fn add_triple(&mut self, s: TermId, p: TermId, o: TermId) -> StoreResult<bool> {
        if s.is_none() {
            return Err(StoreError::InvalidArgument("subject must not be the none term"));
        }
        if p.is_none() {
            return Err(StoreError::InvalidArgument("predicate must not be the none term"));
        }
        if o.is_none() {
            return Err(StoreError::InvalidArgument("object must not be the none term"));
        }

        let s_idx = Self::check_range(s, self.config.max_subjects)?;
        let p_idx = Self::check_range(p, self.config.max_predicates)?;
        let o_idx = Self::check_range(o, self.config.max_objects)?;

        let slot = self.posting_index(p_idx, s_idx);
        let threshold = self.config.posting_list_hash_threshold;
        let entry = self.postings[slot].get_or_insert_with(|| Box::new(PostingList::new()));
        let is_new = entry.insert(o.as_u32(), threshold);

        if is_new {
            self.predicate_presence.set(p_idx, s_idx);
            self.object_presence.set(o_idx, s_idx);
            trace!("inserted new triple");
        }

        Ok(is_new)
    }

    /// `true` iff the fully-bound triple is present. Out-of-range ids answer
    /// `false` rather than failing.
    pub fn ask(&self, s: TermId, p: TermId, o: TermId) -> bool {
        let s_idx = s.as_u32() as usize;
        let p_idx = p.as_u32() as usize;
        let o_idx = o.as_u32() as usize;
        if s_idx >= self.config.max_subjects
            || p_idx >= self.config.max_predicates
            || o_idx >= self.config.max_objects
        {
            return false;
        }
        if !self.predicate_presence.get(p_idx, s_idx) {
            return false;
        }
        match &self.postings[self.posting_index(p_idx, s_idx)] {
            Some(list) => list.contains(o.as_u32()),
            None => false,
        }
    }

    /// Processes patterns in groups of 4: the predicate-presence bit for
    /// each member of the group is tested first, then each group member's
    /// object membership.
    pub fn ask_batch(&self, patterns: &[Pattern]) -> Vec<bool> {
        let mut results = Vec::with_capacity(patterns.len());
        for group in patterns.chunks(4) {
            let mut present = [false; 4];
            for (i, pattern) in group.iter().enumerate() {
                let s_idx = pattern.s.as_u32() as usize;
                let p_idx = pattern.p.as_u32() as usize;
                present[i] = s_idx < self.config.max_subjects
                    && p_idx < self.config.max_predicates
                    && self.predicate_presence.get(p_idx, s_idx);
            }
            for (i, pattern) in group.iter().enumerate() {
                let hit = present[i]
                    && (pattern.o.as_u32() as usize) < self.config.max_objects
                    && self.postings[self.posting_index(
                        pattern.p.as_u32() as usize,
                        pattern.s.as_u32() as usize,
                    )]
                    .as_ref()
                    .is_some_and(|list| list.contains(pattern.o.as_u32()));
                results.push(hit);
            }
        }
        results
    }

    /// Lazy sequence over the objects of `(p, s)`; empty if out of range or
    /// no triple matches.
    pub fn objects_for(&self, p: TermId, s: TermId) -> Box<dyn Iterator<Item = TermId> + '_> {
        let s_idx = s.as_u32() as usize;
        let p_idx = p.as_u32() as usize;
        if s_idx >= self.config.max_subjects || p_idx >= self.config.max_predicates {
            return Box::new(std::iter::empty());
        }
        match &self.postings[self.posting_index(p_idx, s_idx)] {
            Some(list) => Box::new(list.iter().map(TermId::new)),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Count of distinct objects for `(p, s)`, without allocating an
    /// iterator chain; used by shape constraints.
    pub fn object_count(&self, p: TermId, s: TermId) -> usize {
        let s_idx = s.as_u32() as usize;
        let p_idx = p.as_u32() as usize;
        if s_idx >= self.config.max_subjects || p_idx >= self.config.max_predicates {
            return 0;
        }
        match &self.postings[self.posting_index(p_idx, s_idx)] {
            Some(list) => list.len(),
            None => 0,
        }
    }

    /// Lazy sequence of subjects `s` such that `(s, p, o)` is present. Walks
    /// the predicate's presence row word by word and confirms membership in
    /// each candidate subject's posting list.
    pub fn subjects_for(&self, p: TermId, o: TermId) -> Box<dyn Iterator<Item = TermId> + '_> {
        let p_idx = p.as_u32() as usize;
        let o_idx = o.as_u32() as usize;
        if p_idx >= self.config.max_predicates || o_idx >= self.config.max_objects {
            return Box::new(std::iter::empty());
        }
        let o_raw = o.as_u32();
        let max_subjects = self.config.max_subjects;
        let candidates = bitmatrix_set_bits(self.predicate_presence.row(p_idx));
        Box::new(candidates.filter(move |&s| {
            let s_idx = s.as_u32() as usize;
            s_idx < max_subjects
                && self.postings[self.posting_index(p_idx, s_idx)]
                    .as_ref()
                    .is_some_and(|list| list.contains(o_raw))
        }))
    }

    /// Subjects for which predicate `p` has at least one triple.
    pub fn subjects_with_predicate(&self, p: TermId) -> Box<dyn Iterator<Item = TermId> + '_> {
        let p_idx = p.as_u32() as usize;
        if p_idx >= self.config.max_predicates {
            return Box::new(std::iter::empty());
        }
        let max_subjects = self.config.max_subjects;
        Box::new(
            bitmatrix_set_bits(self.predicate_presence.row(p_idx))
                .filter(move |s| (s.as_u32() as usize) < max_subjects),
        )
    }
}

fn bitmatrix_set_bits(row: &[u64]) -> impl Iterator<Item = TermId> + '_ {
    iter_set_bits(row).map(|idx| TermId::new(idx as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TripleStore {
        TripleStore::new(StoreConfig::new(16, 8, 16)).unwrap()
    }

    #[test]
    fn add_then_ask_is_true() {
        let mut s = store();
        s.add_triple(TermId::new(1), TermId::new(2), TermId::new(3)).unwrap();
        assert!(s.ask(TermId::new(1), TermId::new(2), TermId::new(3)));
        assert!(!s.ask(TermId::new(1), TermId::new(2), TermId::new(4)));
    }

    #[test]
    fn add_triple_is_idempotent() {
        let mut s = store();
        let (a, b, c) = (TermId::new(1), TermId::new(2), TermId::new(3));
        assert!(s.add_triple(a, b, c).unwrap());
        assert!(!s.add_triple(a, b, c).unwrap());
        assert_eq!(s.object_count(b, a), 1);
    }

    #[test]
    fn zero_id_is_invalid_argument() {
        let mut s = store();
        let err = s
            .add_triple(TermId::NONE, TermId::new(1), TermId::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn capacity_boundary() {
        let mut s = store();
        let err = s
            .add_triple(TermId::new(16), TermId::new(1), TermId::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { id: 16, capacity: 16 }));
        assert!(s.add_triple(TermId::new(15), TermId::new(1), TermId::new(1)).is_ok());
    }

    #[test]
    fn ask_on_out_of_range_is_false_not_error() {
        let s = store();
        assert!(!s.ask(TermId::new(999), TermId::new(1), TermId::new(1)));
    }

    #[test]
    fn objects_for_matches_ask() {
        let mut s = store();
        let subj = TermId::new(1);
        let pred = TermId::new(2);
        s.add_triple(subj, pred, TermId::new(3)).unwrap();
        s.add_triple(subj, pred, TermId::new(4)).unwrap();
        let mut objs: Vec<u32> = s.objects_for(pred, subj).map(TermId::as_u32).collect();
        objs.sort_unstable();
        assert_eq!(objs, vec![3, 4]);
        assert_eq!(s.object_count(pred, subj), 2);
    }

    #[test]
    fn objects_for_empty_when_no_match() {
        let s = store();
        assert_eq!(s.objects_for(TermId::new(1), TermId::new(1)).count(), 0);
    }

    #[test]
    fn subjects_for_finds_all_matching_subjects() {
        let mut s = store();
        let pred = TermId::new(1);
        let obj = TermId::new(9);
        s.add_triple(TermId::new(2), pred, obj).unwrap();
        s.add_triple(TermId::new(3), pred, obj).unwrap();
        s.add_triple(TermId::new(4), pred, TermId::new(10)).unwrap();
        let mut subs: Vec<u32> = s.subjects_for(pred, obj).map(TermId::as_u32).collect();
        subs.sort_unstable();
        assert_eq!(subs, vec![2, 3]);
    }

    #[test]
    fn ask_batch_preserves_order() {
        let mut s = store();
        s.add_triple(TermId::new(1), TermId::new(1), TermId::new(1)).unwrap();
        let patterns = vec![
            Pattern::new(TermId::new(1), TermId::new(1), TermId::new(1)),
            Pattern::new(TermId::new(1), TermId::new(1), TermId::new(2)),
            Pattern::new(TermId::new(2), TermId::new(1), TermId::new(1)),
        ];
        assert_eq!(s.ask_batch(&patterns), vec![true, false, false]);
    }

    #[test]
    fn invalid_argument_rejects_only_the_zero_field() {
        let mut s = store();
        assert!(matches!(
            s.add_triple(TermId::new(1), TermId::NONE, TermId::new(1)),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            s.add_triple(TermId::new(1), TermId::new(1), TermId::NONE),
            Err(StoreError::InvalidArgument(_))
        ));
    }
}
