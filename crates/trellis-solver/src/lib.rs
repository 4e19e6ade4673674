//! Type Lattice Core
//!
//! Join, meet and constraint-aware subtyping for a gradually typed object
//! language with nominal classes, modules, generics, proxies (tuples, shapes,
//! literals, metas) and open type variables.
//!
//! - **Interning**: every type is a `TypeId` into a sharded, hash-consing
//!   `TypeInterner`, so identity checks are integer comparisons
//! - **Registry**: the nominal hierarchy lives behind the `ClassRegistry`
//!   trait; `ClassTable` is an in-memory implementation
//! - **Constraints**: `TypeConstraint` records type variable bounds while
//!   accumulating and consults solutions once solved
//!
//! ```ignore
//! let interner = TypeInterner::new();
//! let table = ClassTable::new(&interner);
//! let lattice = TypeLattice::new(&interner, &table);
//! let joined = lattice.join(TypeId::INTEGER, TypeId::STRING)?;
//! ```
pub mod align;
pub mod constraint;
pub mod counters;
pub mod errors;
pub mod format;
pub mod intern;
pub mod lattice;
mod query_trace;
pub mod registry;
mod rules;
pub mod sanity;
pub mod types;

pub use constraint::{ConstraintState, TypeConstraint};
pub use counters::{CategoryCounters, CounterSink, NoopCounters};
pub use errors::{LatticeError, LatticeResult};
pub use format::TypeFormatter;
pub use intern::TypeInterner;
pub use lattice::{LatticePolicy, TypeLattice};
pub use registry::{ClassKind, ClassRegistry, ClassTable};
pub use types::{
    ClassId, DeclId, LiteralValue, TypeData, TypeId, TypeKind, TypeListId, TypeMember, TypeVarId,
    UntypedMode, Variance,
};

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod test_fixtures;

#[cfg(test)]
#[path = "../tests/lattice_tests.rs"]
mod lattice_tests;
