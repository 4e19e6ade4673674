//! The lattice facade.
//!
//! `TypeLattice` bundles the interner, the class registry, a counter sink and
//! the policy, and exposes join, meet and the subtyping relations. The rule
//! implementations live in `rules/` as separate `impl` blocks on this type.

use crate::constraint::TypeConstraint;
use crate::counters::{CounterSink, NOOP_COUNTERS};
use crate::errors::{LatticeError, LatticeResult};
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;
use crate::query_trace;
use crate::registry::ClassRegistry;
use crate::sanity;
use crate::types::{ClassId, TypeData, TypeId, TypeKind, UntypedMode};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Policy knobs for lattice queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticePolicy {
    /// Check every join/meet result against its inputs and run the
    /// well-formedness check on it.
    pub verify_results: bool,
}

impl Default for LatticePolicy {
    fn default() -> Self {
        Self {
            verify_results: cfg!(debug_assertions),
        }
    }
}

impl LatticePolicy {
    pub fn with_verify_results(mut self, verify: bool) -> Self {
        self.verify_results = verify;
        self
    }
}

/// Which side of its operands a join or meet result must sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    /// Join: both operands are below the result.
    Upper,
    /// Meet: the result is below both operands.
    Lower,
}

impl Bound {
    fn op(self) -> &'static str {
        match self {
            Bound::Upper => "join",
            Bound::Lower => "meet",
        }
    }
}

/// Join, meet and subtyping over interned types.
///
/// Cheap to construct; build one per thread or per query batch. All state it
/// borrows is either immutable or internally synchronized.
pub struct TypeLattice<'a, R: ClassRegistry + ?Sized> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) registry: &'a R,
    pub(crate) counters: &'a dyn CounterSink,
    pub(crate) policy: LatticePolicy,
}

impl<'a, R: ClassRegistry + ?Sized> TypeLattice<'a, R> {
    pub fn new(interner: &'a TypeInterner, registry: &'a R) -> Self {
        TypeLattice {
            interner,
            registry,
            counters: &NOOP_COUNTERS,
            policy: LatticePolicy::default(),
        }
    }

    pub fn with_counters(mut self, counters: &'a dyn CounterSink) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_policy(mut self, policy: LatticePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    pub fn registry(&self) -> &'a R {
        self.registry
    }

    pub fn policy(&self) -> LatticePolicy {
        self.policy
    }

    /// Render a type for diagnostics.
    pub fn format(&self, ty: TypeId) -> String {
        TypeFormatter::new(self.interner, self.registry).format(ty)
    }

    // =========================================================================
    // Public entry points
    // =========================================================================

    /// Least upper bound: a type `C` with `a <: C` and `b <: C`.
    pub fn join(&self, a: TypeId, b: TypeId) -> LatticeResult<TypeId> {
        if !query_trace::enabled() {
            return self.join_checked(a, b);
        }
        let query_id = query_trace::next_query_id();
        query_trace::binary_start(query_id, "join", a, b);
        let result = self.join_checked(a, b);
        query_trace::binary_end(query_id, "join", result.as_ref().ok().copied());
        result
    }

    /// Greatest lower bound: a type `C` with `C <: a` and `C <: b`.
    pub fn meet(&self, a: TypeId, b: TypeId) -> LatticeResult<TypeId> {
        if !query_trace::enabled() {
            return self.meet_checked(a, b);
        }
        let query_id = query_trace::next_query_id();
        query_trace::binary_start(query_id, "meet", a, b);
        let result = self.meet_checked(a, b);
        query_trace::binary_end(query_id, "meet", result.as_ref().ok().copied());
        result
    }

    /// Join of every type in `types`; `Bottom` for none.
    pub fn join_all(&self, types: &[TypeId]) -> LatticeResult<TypeId> {
        types
            .iter()
            .try_fold(TypeId::BOTTOM, |acc, &ty| self.join_checked(acc, ty))
    }

    /// Subtyping with Untyped compatible with everything.
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> LatticeResult<bool> {
        self.traced_relation("is_subtype", a, b, UntypedMode::AlwaysCompatible, |this| {
            this.subtype(a, b)
        })
    }

    /// Subtyping with Untyped related only to itself.
    pub fn is_as_specific_as(&self, a: TypeId, b: TypeId) -> LatticeResult<bool> {
        self.traced_relation("is_as_specific_as", a, b, UntypedMode::AlwaysIncompatible, |this| {
            this.as_specific_as(a, b)
        })
    }

    /// Subtyping that records (accumulating) or consults (solved) type
    /// variable obligations in `constraint`.
    pub fn is_subtype_under_constraint(
        &self,
        constraint: &mut TypeConstraint,
        a: TypeId,
        b: TypeId,
        mode: UntypedMode,
    ) -> LatticeResult<bool> {
        self.traced_relation("is_subtype_under_constraint", a, b, mode, |this| {
            this.relate(constraint, a, b, mode)
        })
    }

    /// Mutual permissive subtyping.
    pub fn equiv(&self, a: TypeId, b: TypeId) -> LatticeResult<bool> {
        Ok(self.subtype(a, b)? && self.subtype(b, a)?)
    }

    /// Mutual strict subtyping.
    pub fn equiv_no_untyped(&self, a: TypeId, b: TypeId) -> LatticeResult<bool> {
        Ok(self.as_specific_as(a, b)? && self.as_specific_as(b, a)?)
    }

    /// Whether values of `ty` are instances of `class`.
    pub fn derives_from(&self, ty: TypeId, class: ClassId) -> LatticeResult<bool> {
        match self.data(ty)? {
            TypeData::Class(own) => Ok(own == ClassId::UNTYPED || self.class_as_good_as(own, class)),
            TypeData::Applied(own, _) => Ok(self.class_as_good_as(own, class)),
            TypeData::Union(left, right) => {
                Ok(self.derives_from(left, class)? && self.derives_from(right, class)?)
            }
            TypeData::Intersection(left, right) => {
                Ok(self.derives_from(left, class)? || self.derives_from(right, class)?)
            }
            TypeData::Tuple { .. } | TypeData::Shape { .. } | TypeData::Literal(_) => {
                self.derives_from(self.underlying(ty)?, class)
            }
            TypeData::Meta(_)
            | TypeData::TypeVar(_)
            | TypeData::LambdaParam { .. }
            | TypeData::SelfTypeParam(_)
            | TypeData::SelfType => Ok(false),
            TypeData::Alias(_) => Err(LatticeError::UnresolvedAlias {
                op: "derives_from",
                left: "Alias",
                right: "Class",
            }),
        }
    }

    /// The nominal type behind a proxy; other types are their own underlying.
    pub fn underlying(&self, ty: TypeId) -> LatticeResult<TypeId> {
        Ok(match self.data(ty)? {
            TypeData::Tuple { underlying, .. } => underlying,
            TypeData::Shape { .. } => self.interner.hash_of_untyped(),
            TypeData::Literal(value) => self.interner.class(value.class()),
            TypeData::Meta(_) => TypeId::OBJECT,
            _ => ty,
        })
    }

    /// Tuple of `elements` with underlying `Array[join of elements]`.
    pub fn tuple(&self, elements: &[TypeId]) -> LatticeResult<TypeId> {
        let element = self.join_all(elements)?;
        let underlying = self.interner.array_of(element);
        Ok(self.interner.tuple_with_underlying(elements, underlying))
    }

    // =========================================================================
    // Shared helpers for the rule modules
    // =========================================================================

    pub(crate) fn join_checked(&self, a: TypeId, b: TypeId) -> LatticeResult<TypeId> {
        let result = self.lub(a, b)?;
        if self.policy.verify_results {
            self.verify_bound(Bound::Upper, result, a, b)?;
        }
        Ok(result)
    }

    pub(crate) fn meet_checked(&self, a: TypeId, b: TypeId) -> LatticeResult<TypeId> {
        let result = self.glb(a, b)?;
        if self.policy.verify_results {
            self.verify_bound(Bound::Lower, result, a, b)?;
        }
        Ok(result)
    }

    /// Permissive subtyping against an empty solved constraint.
    pub(crate) fn subtype(&self, a: TypeId, b: TypeId) -> LatticeResult<bool> {
        self.relate(
            &mut TypeConstraint::empty_solved(),
            a,
            b,
            UntypedMode::AlwaysCompatible,
        )
    }

    /// Strict subtyping against an empty solved constraint.
    pub(crate) fn as_specific_as(&self, a: TypeId, b: TypeId) -> LatticeResult<bool> {
        self.relate(
            &mut TypeConstraint::empty_solved(),
            a,
            b,
            UntypedMode::AlwaysIncompatible,
        )
    }

    pub(crate) fn data(&self, ty: TypeId) -> LatticeResult<TypeData> {
        self.interner.lookup(ty).ok_or(LatticeError::DanglingType(ty))
    }

    pub(crate) fn type_list(&self, list: crate::types::TypeListId) -> Arc<[TypeId]> {
        self.interner.type_list(list)
    }

    #[inline]
    pub(crate) fn count(&self, category: &'static str, label: &'static str) {
        self.counters.increment(category, label);
    }

    /// `sub` is `sup` or one of its descendants.
    #[inline]
    pub(crate) fn class_as_good_as(&self, sub: ClassId, sup: ClassId) -> bool {
        sub == sup || self.registry.derives_from(sub, sup)
    }

    pub(crate) fn alias_error(
        op: &'static str,
        left: &TypeData,
        right: &TypeData,
    ) -> Option<LatticeError> {
        (left.kind() == TypeKind::Alias || right.kind() == TypeKind::Alias).then(|| {
            LatticeError::UnresolvedAlias {
                op,
                left: left.type_name(),
                right: right.type_name(),
            }
        })
    }

    pub(crate) fn unreachable(op: &'static str, left: &TypeData, right: &TypeData) -> LatticeError {
        LatticeError::Unreachable {
            op,
            left: left.type_name(),
            right: right.type_name(),
        }
    }

    /// Flatten a binary union into its non-union disjuncts, left to right.
    pub(crate) fn union_components(&self, ty: TypeId) -> LatticeResult<SmallVec<[TypeId; 4]>> {
        let mut out = SmallVec::new();
        self.collect_components(ty, TypeKind::Union, &mut out)?;
        Ok(out)
    }

    /// Flatten a binary intersection into its non-intersection conjuncts.
    pub(crate) fn intersection_components(
        &self,
        ty: TypeId,
    ) -> LatticeResult<SmallVec<[TypeId; 4]>> {
        let mut out = SmallVec::new();
        self.collect_components(ty, TypeKind::Intersection, &mut out)?;
        Ok(out)
    }

    fn collect_components(
        &self,
        ty: TypeId,
        kind: TypeKind,
        out: &mut SmallVec<[TypeId; 4]>,
    ) -> LatticeResult<()> {
        match (kind, self.data(ty)?) {
            (TypeKind::Union, TypeData::Union(left, right))
            | (TypeKind::Intersection, TypeData::Intersection(left, right)) => {
                self.collect_components(left, kind, out)?;
                self.collect_components(right, kind, out)
            }
            _ => {
                out.push(ty);
                Ok(())
            }
        }
    }

    pub(crate) fn verify_bound(
        &self,
        bound: Bound,
        result: TypeId,
        a: TypeId,
        b: TypeId,
    ) -> LatticeResult<()> {
        let holds = match bound {
            Bound::Upper => self.subtype(a, result)? && self.subtype(b, result)?,
            Bound::Lower => self.subtype(result, a)? && self.subtype(result, b)?,
        };
        if !holds {
            let err = LatticeError::ConsistencyViolation {
                op: bound.op(),
                result: self.format(result),
                left: self.format(a),
                right: self.format(b),
            };
            debug!(target: "trellis::lattice", error = %err, "consistency check failed");
            return Err(err);
        }
        sanity::check_well_formed(self, result)
    }

    fn traced_relation(
        &self,
        op: &'static str,
        a: TypeId,
        b: TypeId,
        mode: UntypedMode,
        check: impl FnOnce(&Self) -> LatticeResult<bool>,
    ) -> LatticeResult<bool> {
        if !query_trace::enabled() {
            return check(self);
        }
        let query_id = query_trace::next_query_id();
        query_trace::relation_start(query_id, op, a, b, mode);
        let result = check(self);
        query_trace::relation_end(query_id, op, result.as_ref().ok().copied());
        result
    }
}
