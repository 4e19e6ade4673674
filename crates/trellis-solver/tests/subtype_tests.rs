use super::*;
use crate::test_fixtures::Fixture;

#[test]
fn test_nominal_subtyping() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, animal) = (fx.ty(fx.dog), fx.ty(fx.animal));

    assert!(lattice.is_subtype(dog, animal).unwrap());
    assert!(!lattice.is_subtype(animal, dog).unwrap());
    assert!(lattice.is_subtype(dog, fx.ty(fx.comparable)).unwrap());
    assert!(!lattice.is_subtype(fx.ty(fx.cat), fx.ty(fx.comparable)).unwrap());
}

#[test]
fn test_top_and_bottom() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let dog = fx.ty(fx.dog);

    assert!(lattice.is_subtype(dog, TypeId::TOP).unwrap());
    assert!(!lattice.is_subtype(TypeId::TOP, dog).unwrap());
    assert!(lattice.is_subtype(TypeId::BOTTOM, dog).unwrap());
    assert!(!lattice.is_subtype(dog, TypeId::BOTTOM).unwrap());
    assert!(lattice.is_subtype(TypeId::BOTTOM, TypeId::TOP).unwrap());
    assert!(lattice.is_subtype(TypeId::TOP, TypeId::UNTYPED).unwrap());
}

#[test]
fn test_untyped_modes() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let dog = fx.ty(fx.dog);

    assert!(lattice.is_subtype(TypeId::UNTYPED, dog).unwrap());
    assert!(lattice.is_subtype(dog, TypeId::UNTYPED).unwrap());
    assert!(!lattice.is_as_specific_as(TypeId::UNTYPED, dog).unwrap());
    assert!(!lattice.is_as_specific_as(dog, TypeId::UNTYPED).unwrap());
    assert!(lattice.is_as_specific_as(TypeId::UNTYPED, TypeId::UNTYPED).unwrap());

    let loose = fx.list_of(TypeId::UNTYPED);
    assert!(lattice.is_subtype(loose, fx.list_of(dog)).unwrap());
    assert!(!lattice.is_as_specific_as(loose, fx.list_of(dog)).unwrap());
    assert!(lattice.equiv(loose, fx.list_of(dog)).unwrap());
    assert!(!lattice.equiv_no_untyped(loose, fx.list_of(dog)).unwrap());
}

#[test]
fn test_unions_and_intersections() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, cat, animal) = (fx.ty(fx.dog), fx.ty(fx.cat), fx.ty(fx.animal));
    let comparable = fx.ty(fx.comparable);
    let pets = fx.union(dog, cat);

    assert!(lattice.is_subtype(pets, animal).unwrap());
    assert!(!lattice.is_subtype(animal, pets).unwrap());
    assert!(lattice.is_subtype(dog, pets).unwrap());
    assert!(!lattice.is_subtype(pets, dog).unwrap());

    let comparable_cat = fx.intersection(cat, comparable);
    assert!(lattice.is_subtype(comparable_cat, cat).unwrap());
    assert!(lattice.is_subtype(comparable_cat, comparable).unwrap());
    assert!(!lattice.is_subtype(cat, comparable_cat).unwrap());
    assert!(lattice.is_subtype(dog, fx.intersection(animal, comparable)).unwrap());
}

#[test]
fn test_union_under_intersection_is_reassociated() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, cat) = (fx.ty(fx.dog), fx.ty(fx.cat));
    let comparable = fx.ty(fx.comparable);

    // (Dog | Cat) & Comparable  <:  Dog | (Cat & Comparable)
    let left = fx.intersection(fx.union(dog, cat), comparable);
    let right = fx.union(dog, fx.intersection(cat, comparable));
    assert!(lattice.is_subtype(left, right).unwrap());
    assert!(lattice.is_subtype(right, left).unwrap());

    // (Dog | Cat) & Comparable is not below Cat alone.
    assert!(!lattice.is_subtype(left, cat).unwrap());
}

#[test]
fn test_nested_union_under_intersection_is_reassociated() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, cat) = (fx.ty(fx.dog), fx.ty(fx.cat));
    let comparable = fx.ty(fx.comparable);

    // ((Dog | Cat) & Printable) & Comparable: the union sits two levels down.
    let printable_pets = fx.intersection(fx.union(dog, cat), fx.ty(fx.printable));
    let nested = fx.intersection(printable_pets, comparable);
    assert!(lattice.is_subtype(nested, fx.union(dog, cat)).unwrap());
    assert!(lattice.is_subtype(nested, printable_pets).unwrap());
    assert!(!lattice.is_subtype(nested, cat).unwrap());
}

#[test]
fn test_literals() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let five = fx.interner.literal_integer(5);
    let six = fx.interner.literal_integer(6);

    assert!(lattice.is_subtype(five, TypeId::INTEGER).unwrap());
    assert!(lattice.is_subtype(five, TypeId::OBJECT).unwrap());
    assert!(!lattice.is_subtype(five, six).unwrap());
    assert!(!lattice.is_subtype(TypeId::INTEGER, five).unwrap());
    assert!(!lattice.is_subtype(five, TypeId::STRING).unwrap());
}

#[test]
fn test_tuples() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, animal) = (fx.ty(fx.dog), fx.ty(fx.animal));

    let dog_int = lattice.tuple(&[dog, TypeId::INTEGER]).unwrap();
    let animal_only = lattice.tuple(&[animal]).unwrap();
    let dogs = lattice.tuple(&[dog]).unwrap();

    assert!(lattice.is_subtype(dog_int, animal_only).unwrap());
    assert!(!lattice.is_subtype(animal_only, dog_int).unwrap());
    assert!(lattice.is_subtype(dogs, fx.interner.array_of(animal)).unwrap());
    assert!(!lattice.is_subtype(fx.interner.array_of(dog), dogs).unwrap());
    assert!(lattice.is_subtype(dogs, TypeId::OBJECT).unwrap());
}

#[test]
fn test_shapes() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let interner = &fx.interner;
    let (a, b) = (interner.literal_symbol("a"), interner.literal_symbol("b"));
    let (dog, animal) = (fx.ty(fx.dog), fx.ty(fx.animal));

    let wide = interner.shape(&[a, b], &[dog, TypeId::INTEGER]);
    let narrow = interner.shape(&[a], &[animal]);
    assert!(lattice.is_subtype(wide, narrow).unwrap());
    assert!(!lattice.is_subtype(narrow, wide).unwrap());
    assert!(lattice.is_subtype(wide, interner.hash_of_untyped()).unwrap());

    // The underlying Hash[Untyped, Untyped] only fits typed hashes permissively.
    let typed = interner.hash_of(TypeId::SYMBOL, TypeId::INTEGER);
    assert!(lattice.is_subtype(wide, typed).unwrap());
    assert!(!lattice.is_as_specific_as(wide, typed).unwrap());
}

#[test]
fn test_meta_types() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, animal) = (fx.ty(fx.dog), fx.ty(fx.animal));
    let dog_meta = fx.interner.meta(dog);

    assert!(lattice.is_subtype(dog_meta, TypeId::OBJECT).unwrap());
    assert!(!lattice.is_subtype(dog_meta, dog).unwrap());
    assert!(!lattice.is_subtype(dog_meta, fx.interner.meta(animal)).unwrap());
}

#[test]
fn test_generic_variance() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, animal) = (fx.ty(fx.dog), fx.ty(fx.animal));

    assert!(lattice.is_subtype(fx.list_of(dog), fx.list_of(animal)).unwrap());
    assert!(!lattice.is_subtype(fx.list_of(animal), fx.list_of(dog)).unwrap());

    assert!(!lattice.is_subtype(fx.box_of(dog), fx.box_of(animal)).unwrap());
    assert!(lattice.is_subtype(fx.box_of(TypeId::UNTYPED), fx.box_of(dog)).unwrap());
    assert!(!lattice.is_as_specific_as(fx.box_of(TypeId::UNTYPED), fx.box_of(dog)).unwrap());

    assert!(lattice.is_subtype(fx.sink_of(animal), fx.sink_of(dog)).unwrap());
    assert!(!lattice.is_subtype(fx.sink_of(dog), fx.sink_of(animal)).unwrap());

    assert!(lattice.is_subtype(fx.list_of(dog), TypeId::OBJECT).unwrap());
    assert!(!lattice.is_subtype(TypeId::OBJECT, fx.list_of(dog)).unwrap());
    assert!(!lattice.is_subtype(fx.list_of(dog), fx.box_of(dog)).unwrap());
}

#[test]
fn test_lambda_params_relate_by_declaration() {
    let mut fx = Fixture::new();
    let decl = fx.table.fresh_decl();
    let other = fx.table.fresh_decl();
    let lattice = fx.lattice();

    let narrow = fx.interner.lambda_param(decl, TypeId::BOTTOM, fx.ty(fx.dog));
    let wide = fx.interner.lambda_param(decl, TypeId::BOTTOM, TypeId::OBJECT);
    let unrelated = fx.interner.lambda_param(other, TypeId::BOTTOM, fx.ty(fx.dog));

    assert!(lattice.is_subtype(narrow, wide).unwrap());
    assert!(!lattice.is_subtype(narrow, unrelated).unwrap());
    assert!(!lattice.is_subtype(narrow, fx.ty(fx.dog)).unwrap());
    assert!(!lattice.is_subtype(fx.ty(fx.dog), narrow).unwrap());
}

#[test]
fn test_self_type_params_use_bounds() {
    let mut fx = Fixture::new();
    let (dog, animal) = (fx.ty(fx.dog), fx.ty(fx.animal));
    let (_, bounded) = fx.self_param(dog, animal);
    let (_, above) = fx.self_param(animal, TypeId::OBJECT);
    let unbound = {
        let decl = fx.table.fresh_decl();
        fx.interner.self_type_param(decl)
    };
    let lattice = fx.lattice();

    assert!(lattice.is_subtype(bounded, animal).unwrap());
    assert!(!lattice.is_subtype(bounded, dog).unwrap());
    assert!(lattice.is_subtype(dog, bounded).unwrap());
    assert!(!lattice.is_subtype(animal, bounded).unwrap());

    // Upper bound Animal is below the lower bound Animal.
    assert!(lattice.is_subtype(bounded, above).unwrap());
    assert!(!lattice.is_subtype(above, bounded).unwrap());

    assert!(!lattice.is_subtype(unbound, animal).unwrap());
    assert!(lattice.is_subtype(unbound, unbound).unwrap());
}

#[test]
fn test_self_type_relates_only_to_itself() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    assert!(lattice.is_subtype(TypeId::SELF_TYPE, TypeId::SELF_TYPE).unwrap());
    assert!(!lattice.is_subtype(TypeId::SELF_TYPE, TypeId::OBJECT).unwrap());
    assert!(!lattice.is_subtype(TypeId::OBJECT, TypeId::SELF_TYPE).unwrap());
    assert!(lattice.is_subtype(TypeId::SELF_TYPE, TypeId::TOP).unwrap());
}

#[test]
fn test_unsolved_type_variables_relate_to_nothing() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let t = fx.var(1);
    assert!(lattice.is_subtype(t, t).unwrap());
    assert!(!lattice.is_subtype(t, TypeId::OBJECT).unwrap());
    assert!(!lattice.is_subtype(TypeId::INTEGER, t).unwrap());
    assert!(lattice.is_subtype(t, TypeId::UNTYPED).unwrap());
}

#[test]
fn test_dangling_ids_are_errors() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let dangling = TypeId(TypeId::FIRST_USER + 5000);
    assert_eq!(
        lattice.is_subtype(dangling, TypeId::OBJECT),
        Err(LatticeError::DanglingType(dangling))
    );
}

#[test]
fn test_aliases_are_fatal_in_subtyping() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let alias = fx.interner.alias(DeclId(1));
    assert!(matches!(
        lattice.is_subtype(TypeId::INTEGER, alias),
        Err(LatticeError::UnresolvedAlias { op: "is_subtype", .. })
    ));

    // Also when only reached through Untyped.
    let mut constraint = TypeConstraint::new();
    let wrapped = fx.list_of(alias);
    assert!(matches!(
        lattice.is_subtype_under_constraint(
            &mut constraint,
            wrapped,
            TypeId::UNTYPED,
            UntypedMode::AlwaysCompatible
        ),
        Err(LatticeError::UnresolvedAlias { op: "compare_to_untyped", .. })
    ));
}
