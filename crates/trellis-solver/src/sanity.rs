//! Structural well-formedness of produced types.
//!
//! Run on every join/meet result when `LatticePolicy::verify_results` is on,
//! and available to drivers that build types by hand.

use crate::errors::{LatticeError, LatticeResult};
use crate::lattice::TypeLattice;
use crate::registry::ClassRegistry;
use crate::types::{ClassId, TypeData, TypeId};

/// Reject types that break a representation invariant anywhere inside them.
pub fn check_well_formed<R: ClassRegistry + ?Sized>(
    lattice: &TypeLattice<'_, R>,
    ty: TypeId,
) -> LatticeResult<()> {
    let ill_formed = |reason: &'static str| {
        Err(LatticeError::IllFormed {
            reason,
            ty: lattice.format(ty),
        })
    };

    match lattice.data(ty)? {
        TypeData::Class(_) | TypeData::TypeVar(_) | TypeData::SelfTypeParam(_) | TypeData::SelfType => {
            Ok(())
        }
        TypeData::Alias(_) => ill_formed("unresolved alias"),
        TypeData::Union(left, right) | TypeData::Intersection(left, right) => {
            check_well_formed(lattice, left)?;
            check_well_formed(lattice, right)
        }
        TypeData::Applied(class, args) => {
            let args = lattice.type_list(args);
            if args.len() != lattice.registry.type_members(class).len() {
                return ill_formed("argument count differs from the class's type members");
            }
            args.iter().try_for_each(|&arg| check_well_formed(lattice, arg))
        }
        TypeData::Tuple {
            elements,
            underlying,
        } => {
            match lattice.data(underlying)? {
                TypeData::Applied(ClassId::ARRAY, args) if lattice.type_list(args).len() == 1 => {}
                _ => return ill_formed("tuple underlying is not an Array application"),
            }
            lattice
                .type_list(elements)
                .iter()
                .try_for_each(|&elem| check_well_formed(lattice, elem))
        }
        TypeData::Shape { keys, values } => {
            let keys = lattice.type_list(keys);
            let values = lattice.type_list(values);
            if keys.len() != values.len() {
                return ill_formed("shape keys and values differ in length");
            }
            for &key in keys.iter() {
                if !matches!(lattice.data(key)?, TypeData::Literal(_)) {
                    return ill_formed("shape key is not a literal");
                }
            }
            values
                .iter()
                .try_for_each(|&value| check_well_formed(lattice, value))
        }
        TypeData::Literal(_) => Ok(()),
        TypeData::Meta(wrapped) => {
            if matches!(lattice.data(wrapped)?, TypeData::Meta(_)) {
                return ill_formed("meta type wraps another meta type");
            }
            check_well_formed(lattice, wrapped)
        }
        TypeData::LambdaParam { lower, upper, .. } => {
            check_well_formed(lattice, lower)?;
            check_well_formed(lattice, upper)
        }
    }
}

#[cfg(test)]
#[path = "../tests/sanity_tests.rs"]
mod tests;
