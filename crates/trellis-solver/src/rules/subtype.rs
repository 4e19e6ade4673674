//! Constraint-aware subtyping.
//!
//! Composite types are taken apart first (left unions and right
//! intersections as conjunctions, right unions and left intersections as
//! disjunctions, with `(X|Y)&Z` reassociated so a union under an
//! intersection is still explored). Everything else goes through
//! `relate_single`, which never sees a union or an intersection.

use crate::align::align_type_members;
use crate::constraint::TypeConstraint;
use crate::errors::{LatticeError, LatticeResult};
use crate::lattice::TypeLattice;
use crate::registry::ClassRegistry;
use crate::types::{ClassId, DeclId, TypeData, TypeId, TypeListId, UntypedMode, Variance};

impl<'a, R: ClassRegistry + ?Sized> TypeLattice<'a, R> {
    pub(crate) fn relate(
        &self,
        constraint: &mut TypeConstraint,
        t1: TypeId,
        t2: TypeId,
        mode: UntypedMode,
    ) -> LatticeResult<bool> {
        if t1 == t2 {
            return Ok(true);
        }
        let d1 = self.data(t1)?;
        let d2 = self.data(t2)?;
        if let Some(err) = Self::alias_error("is_subtype", &d1, &d2) {
            return Err(err);
        }

        if let TypeData::Union(left, right) = d1 {
            return Ok(self.relate(constraint, left, t2, mode)?
                && self.relate(constraint, right, t2, mode)?);
        }
        if let TypeData::Intersection(left, right) = d2 {
            return Ok(self.relate(constraint, t1, left, mode)?
                && self.relate(constraint, t1, right, mode)?);
        }

        // (X | Y) & Z  =>  (X & Z) | (Y & Z), for a union at any depth.
        if matches!(d1, TypeData::Intersection(..)) {
            if let Some(spread) = self.spread_intersection(t1)? {
                return self.relate(constraint, spread, t2, mode);
            }
        }

        // (X & Y) | Z  =>  (X | Z) & (Y | Z), for an intersection at any depth.
        if let TypeData::Union(left, right) = d2 {
            if let Some(spread) = self.spread_union(t2)? {
                return self.relate(constraint, t1, spread, mode);
            }
            return Ok(self.relate(constraint, t1, left, mode)?
                || self.relate(constraint, t1, right, mode)?);
        }

        if let TypeData::Intersection(left, right) = d1 {
            return Ok(self.relate(constraint, left, t2, mode)?
                || self.relate(constraint, right, t2, mode)?);
        }

        self.relate_single(constraint, t1, &d1, t2, &d2, mode)
    }

    fn relate_single(
        &self,
        constraint: &mut TypeConstraint,
        t1: TypeId,
        d1: &TypeData,
        t2: TypeId,
        d2: &TypeData,
        mode: UntypedMode,
    ) -> LatticeResult<bool> {
        if t1.is_untyped() || t2.is_untyped() {
            if !constraint.is_solved() {
                let other = if t1.is_untyped() { t2 } else { t1 };
                self.compare_to_untyped(constraint, other)?;
            }
            self.count("subtype", "untyped");
            return Ok(mode == UntypedMode::AlwaysCompatible);
        }
        if t1.is_bottom() || t2.is_top() {
            return Ok(true);
        }

        if matches!(d1, TypeData::TypeVar(_)) || matches!(d2, TypeData::TypeVar(_)) {
            self.count("subtype", "type-var");
            return if constraint.is_solved() {
                constraint.is_already_a_subtype(self, t1, t2, mode)
            } else {
                constraint.remember_is_subtype(self, t1, t2)
            };
        }

        // Top is only below Top and Untyped, both handled above.
        if t1.is_top() || t2.is_bottom() {
            return Ok(false);
        }

        match (d1, d2) {
            (
                TypeData::LambdaParam { decl: left, .. },
                TypeData::LambdaParam { decl: right, .. },
            ) => Ok(left == right),
            (TypeData::LambdaParam { .. }, _) | (_, TypeData::LambdaParam { .. }) => Ok(false),

            (TypeData::SelfTypeParam(left), TypeData::SelfTypeParam(right)) => {
                if left == right {
                    return Ok(true);
                }
                match (self.param_bounds(*left)?, self.param_bounds(*right)?) {
                    (Some((_, upper)), Some((lower, _))) => {
                        self.relate(constraint, upper, lower, mode)
                    }
                    _ => Ok(false),
                }
            }
            (TypeData::SelfTypeParam(decl), _) => match self.param_bounds(*decl)? {
                Some((_, upper)) => self.relate(constraint, upper, t2, mode),
                None => Ok(false),
            },
            (_, TypeData::SelfTypeParam(decl)) => match self.param_bounds(*decl)? {
                Some((lower, _)) => self.relate(constraint, t1, lower, mode),
                None => Ok(false),
            },

            (TypeData::SelfType, _) | (_, TypeData::SelfType) => Ok(false),

            (TypeData::Applied(c1, args1), TypeData::Applied(c2, args2)) => {
                self.relate_applied(constraint, *c1, *args1, *c2, *args2, mode)
            }
            (_, TypeData::Applied(..)) => {
                if d1.is_proxy() {
                    let underlying = self.underlying(t1)?;
                    self.relate(constraint, underlying, t2, mode)
                } else {
                    Ok(false)
                }
            }
            (TypeData::Applied(c1, _), TypeData::Class(c2)) => Ok(self.class_as_good_as(*c1, *c2)),

            _ if d1.is_proxy() && d2.is_proxy() => self.relate_proxies(constraint, d1, d2, mode),
            _ if d1.is_proxy() => {
                let underlying = self.underlying(t1)?;
                self.relate(constraint, underlying, t2, mode)
            }
            _ if d2.is_proxy() => Ok(false),

            (TypeData::Class(c1), TypeData::Class(c2)) => Ok(self.class_as_good_as(*c1, *c2)),

            _ => Err(Self::unreachable("is_subtype", d1, d2)),
        }
    }

    /// Applied vs applied: ancestry, then every ancestor slot by variance.
    /// Ancestor slots with no counterpart in the derived class are skipped.
    fn relate_applied(
        &self,
        constraint: &mut TypeConstraint,
        c1: ClassId,
        args1: TypeListId,
        c2: ClassId,
        args2: TypeListId,
        mode: UntypedMode,
    ) -> LatticeResult<bool> {
        if !self.class_as_good_as(c1, c2) {
            return Ok(false);
        }
        let alignment = align_type_members(self.registry, c1, c2);
        let members = self.registry.type_members(c2);
        let args1 = self.type_list(args1);
        let args2 = self.type_list(args2);

        for (slot, member) in members.iter().enumerate() {
            let Some(Some(idx)) = alignment.get(slot).copied() else {
                continue;
            };
            let (Some(&sub_arg), Some(&sup_arg)) = (args1.get(idx), args2.get(slot)) else {
                return Ok(false);
            };
            let related = match member.variance {
                Variance::Covariant => self.relate(constraint, sub_arg, sup_arg, mode)?,
                Variance::Contravariant => self.relate(constraint, sup_arg, sub_arg, mode)?,
                Variance::Invariant => match mode {
                    UntypedMode::AlwaysCompatible => self.equiv(sub_arg, sup_arg)?,
                    UntypedMode::AlwaysIncompatible => self.equiv_no_untyped(sub_arg, sup_arg)?,
                },
            };
            if !related {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Proxy containment: wider tuples and shapes are subtypes of narrower
    /// ones, literals only of themselves, metas of equivalent metas.
    fn relate_proxies(
        &self,
        constraint: &mut TypeConstraint,
        d1: &TypeData,
        d2: &TypeData,
        mode: UntypedMode,
    ) -> LatticeResult<bool> {
        match (d1, d2) {
            (TypeData::Tuple { elements: e1, .. }, TypeData::Tuple { elements: e2, .. }) => {
                let sub = self.type_list(*e1);
                let sup = self.type_list(*e2);
                if sub.len() < sup.len() {
                    return Ok(false);
                }
                for (&a, &b) in sub.iter().zip(sup.iter()) {
                    if !self.relate(constraint, a, b, mode)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (
                TypeData::Shape {
                    keys: k1,
                    values: v1,
                },
                TypeData::Shape {
                    keys: k2,
                    values: v2,
                },
            ) => {
                let (sub_keys, sub_values) = (self.type_list(*k1), self.type_list(*v1));
                let (sup_keys, sup_values) = (self.type_list(*k2), self.type_list(*v2));
                if sup_keys.len() > sub_keys.len() {
                    return Ok(false);
                }
                for (key, &sup_value) in sup_keys.iter().zip(sup_values.iter()) {
                    let Some(idx) = sub_keys.iter().position(|k| k == key) else {
                        return Ok(false);
                    };
                    let Some(&sub_value) = sub_values.get(idx) else {
                        return Ok(false);
                    };
                    if !self.relate(constraint, sub_value, sup_value, mode)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypeData::Literal(a), TypeData::Literal(b)) => Ok(a == b),
            (TypeData::Meta(a), TypeData::Meta(b)) => self.equiv(*a, *b),
            _ => Ok(false),
        }
    }

    /// Record every type variable inside `ty` as a subtype of Untyped.
    fn compare_to_untyped(&self, constraint: &mut TypeConstraint, ty: TypeId) -> LatticeResult<()> {
        match self.data(ty)? {
            TypeData::TypeVar(_) => {
                constraint.remember_is_subtype(self, ty, TypeId::UNTYPED)?;
            }
            TypeData::Applied(_, args) => {
                for &arg in self.type_list(args).iter() {
                    self.compare_to_untyped(constraint, arg)?;
                }
            }
            TypeData::Tuple { elements, .. } => {
                for &elem in self.type_list(elements).iter() {
                    self.compare_to_untyped(constraint, elem)?;
                }
            }
            TypeData::Shape { values, .. } => {
                for &value in self.type_list(values).iter() {
                    self.compare_to_untyped(constraint, value)?;
                }
            }
            TypeData::Union(left, right) | TypeData::Intersection(left, right) => {
                self.compare_to_untyped(constraint, left)?;
                self.compare_to_untyped(constraint, right)?;
            }
            data @ TypeData::Alias(_) => {
                return Err(LatticeError::UnresolvedAlias {
                    op: "compare_to_untyped",
                    left: data.type_name(),
                    right: "Class",
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// Rewrite an intersection with a union among its conjuncts into a union
    /// of intersections. `None` when no conjunct is a union.
    fn spread_intersection(&self, ty: TypeId) -> LatticeResult<Option<TypeId>> {
        let conjuncts = self.intersection_components(ty)?;
        for (idx, &conjunct) in conjuncts.iter().enumerate() {
            let TypeData::Union(x, y) = self.data(conjunct)? else {
                continue;
            };
            let rest = conjuncts
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != idx)
                .map(|(_, &c)| c)
                .reduce(|acc, c| self.interner.intersection(acc, c));
            let Some(rest) = rest else {
                return Ok(None);
            };
            return Ok(Some(self.interner.union(
                self.interner.intersection(x, rest),
                self.interner.intersection(y, rest),
            )));
        }
        Ok(None)
    }

    /// Dual of `spread_intersection`: an intersection among the disjuncts of
    /// a union becomes an intersection of unions.
    fn spread_union(&self, ty: TypeId) -> LatticeResult<Option<TypeId>> {
        let disjuncts = self.union_components(ty)?;
        for (idx, &disjunct) in disjuncts.iter().enumerate() {
            let TypeData::Intersection(x, y) = self.data(disjunct)? else {
                continue;
            };
            let rest = disjuncts
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != idx)
                .map(|(_, &d)| d)
                .reduce(|acc, d| self.interner.union(acc, d));
            let Some(rest) = rest else {
                return Ok(None);
            };
            return Ok(Some(self.interner.intersection(
                self.interner.union(x, rest),
                self.interner.union(y, rest),
            )));
        }
        Ok(None)
    }

    /// `(lower, upper)` of the LambdaParam a declaration resolves to.
    fn param_bounds(&self, decl: DeclId) -> LatticeResult<Option<(TypeId, TypeId)>> {
        let Some(ty) = self.registry.declaration_type(decl) else {
            return Ok(None);
        };
        match self.data(ty)? {
            TypeData::LambdaParam { lower, upper, .. } => Ok(Some((lower, upper))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/subtype_tests.rs"]
mod tests;
