use super::*;
use crate::intern::TypeInterner;
use crate::registry::ClassTable;
use crate::types::Variance;

#[test]
fn test_same_class_is_positional() {
    let interner = TypeInterner::new();
    let table = ClassTable::new(&interner);
    let alignment = align_type_members(&table, ClassId::HASH, ClassId::HASH);
    assert_eq!(alignment.as_slice(), &[Some(0), Some(1)]);
}

#[test]
fn test_classes_with_equal_member_counts_are_positional() {
    let interner = TypeInterner::new();
    let mut table = ClassTable::new(&interner);
    let list = table.define_class("List", None);
    table.add_type_member(&interner, list, "Elem", Variance::Covariant);
    let queue = table.define_class("Queue", Some(list));
    table.add_type_member(&interner, queue, "Item", Variance::Covariant);

    let alignment = align_type_members(&table, queue, list);
    assert_eq!(alignment.as_slice(), &[Some(0)]);
}

#[test]
fn test_permuted_members_align_by_name() {
    let interner = TypeInterner::new();
    let mut table = ClassTable::new(&interner);
    let mapping = table.define_module("Mapping");
    table.add_type_member(&interner, mapping, "K", Variance::Covariant);
    table.add_type_member(&interner, mapping, "V", Variance::Covariant);
    let table_class = table.define_class("Table", None);
    table.add_type_member(&interner, table_class, "V", Variance::Covariant);
    table.add_type_member(&interner, table_class, "K", Variance::Covariant);
    table.include_module(table_class, mapping);

    let alignment = align_type_members(&table, table_class, mapping);
    assert_eq!(alignment.as_slice(), &[Some(1), Some(0)]);
}

#[test]
fn test_missing_members_align_to_none() {
    let interner = TypeInterner::new();
    let mut table = ClassTable::new(&interner);
    let mapping = table.define_module("Mapping");
    table.add_type_member(&interner, mapping, "K", Variance::Covariant);
    table.add_type_member(&interner, mapping, "V", Variance::Covariant);
    let index = table.define_class("Index", None);
    table.add_type_member(&interner, index, "V", Variance::Covariant);
    table.include_module(index, mapping);

    // Ancestor slots seen from the derived class.
    let up = align_type_members(&table, index, mapping);
    assert_eq!(up.as_slice(), &[None, Some(0)]);

    // Derived slots seen from the ancestor.
    let down = align_type_members(&table, mapping, index);
    assert_eq!(down.as_slice(), &[Some(1)]);
}
