//! Internal invariant violations.
//!
//! Every input combination the lattice accepts has a defined result. These
//! errors mean a caller broke a contract (an unresolved alias, a dangling
//! handle) or an engine reached a state it has no rule for.

use crate::types::TypeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatticeError {
    /// Aliases must be resolved before any structural operation.
    #[error("{op}: unresolved alias reached the lattice ({left}, {right})")]
    UnresolvedAlias {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// A pair of variants with no rule in `op`.
    #[error("{op}: no rule for ({left}, {right})")]
    Unreachable {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// A handle that the interner never produced.
    #[error("type id {0:?} is not known to the interner")]
    DanglingType(TypeId),

    /// A join or meet result failed its post-condition.
    #[error("{op} produced {result}, which does not bound {left} and {right}")]
    ConsistencyViolation {
        op: &'static str,
        result: String,
        left: String,
        right: String,
    },

    /// A produced type violates a structural invariant.
    #[error("ill-formed type {ty}: {reason}")]
    IllFormed { reason: &'static str, ty: String },
}

pub type LatticeResult<T> = Result<T, LatticeError>;
