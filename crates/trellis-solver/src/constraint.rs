//! Type variable constraint accumulator.
//!
//! An inference driver creates one `TypeConstraint` per call site and lends
//! it to `TypeLattice::is_subtype_under_constraint`. While accumulating,
//! every subtype obligation that involves a type variable is recorded as a
//! bound on that variable. After an external solver has filled in solutions
//! and marked the constraint solved, the same relation consults those
//! solutions instead.

use crate::errors::{LatticeError, LatticeResult};
use crate::lattice::TypeLattice;
use crate::registry::ClassRegistry;
use crate::types::{TypeData, TypeId, TypeVarId, UntypedMode};
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintState {
    Accumulating,
    Solved,
}

#[derive(Clone, Debug)]
pub struct TypeConstraint {
    state: ConstraintState,
    /// Variables in the order they were first constrained.
    variables: IndexSet<TypeVarId>,
    upper_bounds: IndexMap<TypeVarId, TypeId>,
    lower_bounds: IndexMap<TypeVarId, TypeId>,
    solutions: IndexMap<TypeVarId, TypeId>,
}

impl Default for TypeConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeConstraint {
    /// A fresh constraint that records obligations.
    pub fn new() -> Self {
        TypeConstraint {
            state: ConstraintState::Accumulating,
            variables: IndexSet::new(),
            upper_bounds: IndexMap::new(),
            lower_bounds: IndexMap::new(),
            solutions: IndexMap::new(),
        }
    }

    /// A solved constraint with no solutions: every type variable is unrelated
    /// to everything except itself.
    pub fn empty_solved() -> Self {
        TypeConstraint {
            state: ConstraintState::Solved,
            ..Self::new()
        }
    }

    pub fn state(&self) -> ConstraintState {
        self.state
    }

    #[inline]
    pub fn is_solved(&self) -> bool {
        self.state == ConstraintState::Solved
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.solutions.is_empty()
    }

    /// Stop recording; further queries consult the solutions.
    pub fn mark_solved(&mut self) {
        self.state = ConstraintState::Solved;
    }

    pub fn set_solution(&mut self, var: TypeVarId, ty: TypeId) {
        self.solutions.insert(var, ty);
    }

    pub fn upper_bound(&self, var: TypeVarId) -> Option<TypeId> {
        self.upper_bounds.get(&var).copied()
    }

    pub fn lower_bound(&self, var: TypeVarId) -> Option<TypeId> {
        self.lower_bounds.get(&var).copied()
    }

    pub fn solution(&self, var: TypeVarId) -> Option<TypeId> {
        self.solutions.get(&var).copied()
    }

    /// Every constrained variable, in first-seen order.
    pub fn variables(&self) -> impl Iterator<Item = TypeVarId> + '_ {
        self.variables.iter().copied()
    }

    /// Record `t1 <: t2`, where at least one side is a type variable.
    ///
    /// A variable on the left tightens its upper bound to `meet(bound, t2)`;
    /// otherwise the variable on the right widens its lower bound to
    /// `join(bound, t1)`.
    pub fn remember_is_subtype<R: ClassRegistry + ?Sized>(
        &mut self,
        lattice: &TypeLattice<'_, R>,
        t1: TypeId,
        t2: TypeId,
    ) -> LatticeResult<bool> {
        debug_assert!(!self.is_solved(), "recording into a solved constraint");
        let left = lattice.data(t1)?;
        let right = lattice.data(t2)?;

        if let TypeData::TypeVar(var) = left {
            let bound = match self.upper_bound(var) {
                Some(existing) => lattice.meet_checked(existing, t2)?,
                None => t2,
            };
            trace!(target: "trellis::lattice", var = var.0, bound = bound.0, "upper bound");
            self.variables.insert(var);
            self.upper_bounds.insert(var, bound);
            return Ok(true);
        }
        if let TypeData::TypeVar(var) = right {
            let bound = match self.lower_bound(var) {
                Some(existing) => lattice.join_checked(existing, t1)?,
                None => t1,
            };
            trace!(target: "trellis::lattice", var = var.0, bound = bound.0, "lower bound");
            self.variables.insert(var);
            self.lower_bounds.insert(var, bound);
            return Ok(true);
        }
        Err(LatticeError::Unreachable {
            op: "remember_is_subtype",
            left: left.type_name(),
            right: right.type_name(),
        })
    }

    /// Check `t1 <: t2` with type variables replaced by their solutions.
    /// A variable without a solution relates to nothing.
    pub fn is_already_a_subtype<R: ClassRegistry + ?Sized>(
        &self,
        lattice: &TypeLattice<'_, R>,
        t1: TypeId,
        t2: TypeId,
        mode: UntypedMode,
    ) -> LatticeResult<bool> {
        let Some(left) = self.substitute(lattice, t1)? else {
            return Ok(false);
        };
        let Some(right) = self.substitute(lattice, t2)? else {
            return Ok(false);
        };
        lattice.relate(&mut TypeConstraint::empty_solved(), left, right, mode)
    }

    fn substitute<R: ClassRegistry + ?Sized>(
        &self,
        lattice: &TypeLattice<'_, R>,
        ty: TypeId,
    ) -> LatticeResult<Option<TypeId>> {
        Ok(match lattice.data(ty)? {
            TypeData::TypeVar(var) => self.solution(var),
            _ => Some(ty),
        })
    }
}

#[cfg(test)]
#[path = "../tests/constraint_tests.rs"]
mod tests;
