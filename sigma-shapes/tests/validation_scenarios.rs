use sigma_config::StoreConfig;
use sigma_reasoner::Reasoner;
use sigma_shapes::{PropertyConstraint, ShapeValidator, ViolationKind};
use sigma_store::{Interner, TripleStore};

#[test]
fn person_shape_reports_missing_email_as_has_property() {
    let mut interner = Interner::new(32);
    let mut store = TripleStore::new(StoreConfig::new(16, 16, 16)).unwrap();

    let rdf_type = interner.intern(b"rdf:type").unwrap();
    let person = interner.intern(b"Person").unwrap();
    let name = interner.intern(b"name").unwrap();
    let email = interner.intern(b"email").unwrap();
    let alice = interner.intern(b"alice").unwrap();
    let alice_name = interner.intern(b"Alice").unwrap();

    store.add_triple(alice, rdf_type, person).unwrap();
    store.add_triple(alice, name, alice_name).unwrap();

    let reasoner = Reasoner::new(rdf_type);
    let mut validator = ShapeValidator::new();
    let shape = validator.define_shape(
        "PersonShape",
        Some(person),
        vec![
            PropertyConstraint::new(name).with_min_count(1).with_max_count(1),
            PropertyConstraint::new(email).with_min_count(1),
        ],
    );

    let result = validator.validate_shape(&store, &reasoner, alice, shape).unwrap();
    assert!(!result.is_valid());
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].kind, ViolationKind::HasProperty);
    assert_eq!(result.violations[0].property, Some(email));
}

#[test]
fn validate_batch_preserves_node_order() {
    let mut interner = Interner::new(32);
    let store = TripleStore::new(StoreConfig::new(16, 16, 16)).unwrap();
    let rdf_type = interner.intern(b"rdf:type").unwrap();
    let person = interner.intern(b"Person").unwrap();
    let reasoner = Reasoner::new(rdf_type);

    let mut validator = ShapeValidator::new();
    let shape = validator.define_shape("PersonShape", Some(person), vec![]);

    let a = interner.intern(b"a").unwrap();
    let b = interner.intern(b"b").unwrap();
    let results = validator.validate_batch(&store, &reasoner, &[a, b], shape).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].node, a);
    assert_eq!(results[1].node, b);
}
