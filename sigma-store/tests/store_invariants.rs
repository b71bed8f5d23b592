//! Property-based checks for the triple store's core invariants.

use proptest::prelude::*;
use sigma_config::StoreConfig;
use sigma_store::store::Pattern;
use sigma_store::{Interner, TermId, TripleStore};

fn small_store() -> TripleStore {
    TripleStore::new(StoreConfig::new(64, 64, 64)).unwrap()
}

fn valid_id() -> impl Strategy<Value = u32> {
    1u32..60
}

proptest! {
    #[test]
    fn add_then_ask_succeeds(s in valid_id(), p in valid_id(), o in valid_id()) {
        let mut store = small_store();
        if store.add_triple(TermId::new(s), TermId::new(p), TermId::new(o)).is_ok() {
            prop_assert!(store.ask(TermId::new(s), TermId::new(p), TermId::new(o)));
        }
    }

    #[test]
    fn add_twice_is_indistinguishable_from_once(s in valid_id(), p in valid_id(), o in valid_id()) {
        let mut store = small_store();
        store.add_triple(TermId::new(s), TermId::new(p), TermId::new(o)).unwrap();
        let before = store.object_count(TermId::new(p), TermId::new(s));
        store.add_triple(TermId::new(s), TermId::new(p), TermId::new(o)).unwrap();
        let after = store.object_count(TermId::new(p), TermId::new(s));
        prop_assert_eq!(before, after);
    }

    #[test]
    fn object_count_matches_distinct_objects(s in valid_id(), p in valid_id(), objs in prop::collection::vec(valid_id(), 0..10)) {
        let mut store = small_store();
        for &o in &objs {
            store.add_triple(TermId::new(s), TermId::new(p), TermId::new(o)).unwrap();
        }
        let distinct: std::collections::HashSet<u32> = objs.into_iter().collect();
        let counted = store.objects_for(TermId::new(p), TermId::new(s)).count();
        prop_assert_eq!(counted, distinct.len());
        prop_assert_eq!(store.object_count(TermId::new(p), TermId::new(s)), distinct.len());
    }

    #[test]
    fn intern_is_idempotent_and_injective(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        let mut interner = Interner::new(16);
        let id_a1 = interner.intern(a.as_bytes()).unwrap();
        let id_a2 = interner.intern(a.as_bytes()).unwrap();
        prop_assert_eq!(id_a1, id_a2);

        let id_b = interner.intern(b.as_bytes()).unwrap();
        if a != b {
            prop_assert_ne!(id_a1, id_b);
        }
    }

    #[test]
    fn lookup_recovers_interned_bytes(s in "[a-z]{0,20}") {
        let mut interner = Interner::new(16);
        let id = interner.intern(s.as_bytes()).unwrap();
        prop_assert_eq!(interner.lookup(id), Some(s.as_bytes()));
    }
}

#[test]
fn capacity_boundary_rejects_at_the_limit_only() {
    let mut store = TripleStore::new(StoreConfig::new(4, 4, 4)).unwrap();
    assert!(store
        .add_triple(TermId::new(3), TermId::new(1), TermId::new(1))
        .is_ok());
    assert!(store
        .add_triple(TermId::new(4), TermId::new(1), TermId::new(1))
        .is_err());
}

#[test]
fn empty_posting_list_is_not_an_error() {
    let store = small_store();
    assert_eq!(
        store
            .objects_for(TermId::new(1), TermId::new(1))
            .count(),
        0
    );
}

#[test]
fn ask_batch_matches_individual_asks() {
    let mut store = small_store();
    store
        .add_triple(TermId::new(1), TermId::new(1), TermId::new(1))
        .unwrap();
    store
        .add_triple(TermId::new(2), TermId::new(1), TermId::new(2))
        .unwrap();
    let patterns = vec![
        Pattern::new(TermId::new(1), TermId::new(1), TermId::new(1)),
        Pattern::new(TermId::new(2), TermId::new(1), TermId::new(2)),
        Pattern::new(TermId::new(3), TermId::new(1), TermId::new(1)),
        Pattern::new(TermId::new(1), TermId::new(1), TermId::new(2)),
        Pattern::new(TermId::new(2), TermId::new(1), TermId::new(1)),
    ];
    let batch = store.ask_batch(&patterns);
    let individual: Vec<bool> = patterns
        .iter()
        .map(|pat| store.ask(pat.s, pat.p, pat.o))
        .collect();
    assert_eq!(batch, individual);
}
