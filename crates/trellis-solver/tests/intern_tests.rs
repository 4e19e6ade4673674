use super::*;
use crate::types::TypeVarId;

#[test]
fn test_intrinsic_ids_are_stable() {
    let interner = TypeInterner::new();
    assert_eq!(interner.class(ClassId::INTEGER), TypeId::INTEGER);
    assert_eq!(interner.class(ClassId::UNTYPED), TypeId::UNTYPED);
    assert_eq!(interner.self_type(), TypeId::SELF_TYPE);
    assert_eq!(interner.lookup(TypeId::TOP), Some(TypeData::Class(ClassId::TOP)));
    assert_eq!(interner.lookup(TypeId::SELF_TYPE), Some(TypeData::SelfType));
}

#[test]
fn test_intern_deduplicates_structural_data() {
    let interner = TypeInterner::new();
    let a = interner.union(TypeId::INTEGER, TypeId::STRING);
    let b = interner.union(TypeId::INTEGER, TypeId::STRING);
    assert_eq!(a, b);
    assert!(a.0 >= TypeId::FIRST_USER);

    // Operand order is part of the structure.
    let c = interner.union(TypeId::STRING, TypeId::INTEGER);
    assert_ne!(a, c);
}

#[test]
fn test_union_of_identical_operands_is_the_operand() {
    let interner = TypeInterner::new();
    assert_eq!(interner.union(TypeId::FLOAT, TypeId::FLOAT), TypeId::FLOAT);
    assert_eq!(interner.intersection(TypeId::FLOAT, TypeId::FLOAT), TypeId::FLOAT);
}

#[test]
fn test_applied_shares_argument_lists() {
    let interner = TypeInterner::new();
    let first = interner.array_of(TypeId::INTEGER);
    let second = interner.array_of(TypeId::INTEGER);
    assert_eq!(first, second);

    let Some(TypeData::Applied(class, args)) = interner.lookup(first) else {
        panic!("expected an applied type");
    };
    assert_eq!(class, ClassId::ARRAY);
    assert_eq!(&interner.type_list(args)[..], &[TypeId::INTEGER]);
}

#[test]
fn test_untyped_generics() {
    let interner = TypeInterner::new();
    let hash = interner.hash_of_untyped();
    let Some(TypeData::Applied(class, args)) = interner.lookup(hash) else {
        panic!("expected an applied type");
    };
    assert_eq!(class, ClassId::HASH);
    assert_eq!(&interner.type_list(args)[..], &[TypeId::UNTYPED, TypeId::UNTYPED]);
    assert_eq!(interner.array_of_untyped(), interner.array_of(TypeId::UNTYPED));
}

#[test]
fn test_literals_intern_by_value() {
    let interner = TypeInterner::new();
    assert_eq!(interner.literal_integer(5), interner.literal_integer(5));
    assert_ne!(interner.literal_integer(5), interner.literal_integer(6));
    assert_eq!(interner.literal_string("a"), interner.literal_string("a"));
    assert_ne!(interner.literal_string("a"), interner.literal_symbol("a"));
    assert_eq!(interner.literal_float(1.5), interner.literal_float(1.5));
    assert_ne!(interner.literal_bool(true), interner.literal_bool(false));
}

#[test]
fn test_shape_from_pairs_matches_parallel_lists() {
    let interner = TypeInterner::new();
    let a = interner.literal_symbol("a");
    let b = interner.literal_symbol("b");
    let from_pairs = interner.shape_from_pairs(&[(a, TypeId::INTEGER), (b, TypeId::STRING)]);
    let from_lists = interner.shape(&[a, b], &[TypeId::INTEGER, TypeId::STRING]);
    assert_eq!(from_pairs, from_lists);
}

#[test]
fn test_lookup_unknown_id() {
    let interner = TypeInterner::new();
    assert_eq!(interner.lookup(TypeId(TypeId::FIRST_USER + 4096)), None);
    assert_eq!(interner.lookup(TypeId(40)), None);
}

#[test]
fn test_len_counts_new_types() {
    let interner = TypeInterner::new();
    assert!(interner.is_empty());
    interner.type_var(TypeVarId(1));
    interner.type_var(TypeVarId(1));
    interner.type_var(TypeVarId(2));
    assert_eq!(interner.len(), TypeId::FIRST_USER as usize + 2);
    assert!(!interner.is_empty());
}

#[test]
fn test_string_atoms_round_trip() {
    let interner = TypeInterner::new();
    let atom = interner.intern_string("Comparable");
    assert_eq!(&*interner.resolve_atom(atom), "Comparable");
    assert_eq!(interner.intern_string("Comparable"), atom);
}
