//! Generic argument alignment.
//!
//! A derived generic class may declare its type members in a different order
//! than an ancestor, or declare only some of them. Before comparing two
//! applied types over related classes, the engines map each member slot of
//! one class onto the matching slot (by member name) of the other.

use crate::registry::ClassRegistry;
use crate::types::ClassId;
use smallvec::SmallVec;

/// Slot mapping produced by [`align_type_members`].
pub type Alignment = SmallVec<[Option<usize>; 4]>;

/// For each type member of `as_if`, in order, the index of the type member
/// of `what` with the same name, or `None` when `what` has no such member.
///
/// The mapping is positional when `what` and `as_if` are the same class, or
/// when both are classes (not modules) declaring the same number of members.
pub fn align_type_members<R: ClassRegistry + ?Sized>(
    registry: &R,
    what: ClassId,
    as_if: ClassId,
) -> Alignment {
    let what_members = registry.type_members(what);
    let as_if_members = registry.type_members(as_if);

    let positional = what == as_if
        || (registry.is_class(what)
            && registry.is_class(as_if)
            && what_members.len() == as_if_members.len());
    if positional {
        return (0..as_if_members.len()).map(Some).collect();
    }

    as_if_members
        .iter()
        .map(|member| what_members.iter().position(|own| own.name == member.name))
        .collect()
}

#[cfg(test)]
#[path = "../tests/align_tests.rs"]
mod tests;
