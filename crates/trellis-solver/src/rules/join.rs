//! Least upper bound.
//!
//! Operands are put in rank order (see `TypeKind::rank`) before dispatch, so
//! each pair of variants has exactly one rule. Results collapse to an input
//! whenever the input already bounds the other one; a literal union is the
//! fallback when nothing smaller is provable.

use crate::align::align_type_members;
use crate::errors::LatticeResult;
use crate::lattice::TypeLattice;
use crate::registry::ClassRegistry;
use crate::types::{ClassId, TypeData, TypeId, TypeListId, Variance};
use smallvec::SmallVec;
use tracing::trace;

impl<'a, R: ClassRegistry + ?Sized> TypeLattice<'a, R> {
    pub(crate) fn lub(&self, t1: TypeId, t2: TypeId) -> LatticeResult<TypeId> {
        if t1 == t2 {
            self.count("lub", "ref-eq");
            return Ok(t1);
        }
        let d1 = self.data(t1)?;
        let d2 = self.data(t2)?;
        if let Some(err) = Self::alias_error("join", &d1, &d2) {
            return Err(err);
        }

        if t1.is_untyped() || t2.is_untyped() {
            self.count("lub", "untyped");
            return Ok(TypeId::UNTYPED);
        }
        if t1.is_bottom() {
            return Ok(t2);
        }
        if t2.is_bottom() {
            return Ok(t1);
        }
        if t1.is_top() || t2.is_top() {
            self.count("lub", "top");
            return Ok(TypeId::TOP);
        }

        let (t1, d1, t2, d2) = if d1.kind().rank() > d2.kind().rank() {
            (t2, d2, t1, d1)
        } else {
            (t1, d1, t2, d2)
        };

        match d2 {
            TypeData::Union(..) => return self.lub_distribute_union(t2, t1),
            TypeData::Intersection(..) => return self.lub_with_intersection(t2, t1),
            _ => {}
        }
        match d1 {
            TypeData::Union(..) => return self.lub_distribute_union(t1, t2),
            TypeData::Intersection(..) => return self.lub_with_intersection(t1, t2),
            _ => {}
        }

        if let TypeData::Applied(c1, args1) = d1 {
            return match d2 {
                TypeData::Applied(c2, args2) => self.lub_applied(t1, c1, args1, t2, c2, args2),
                _ => {
                    if self.subtype(t2, t1)? {
                        self.count("lub", "applied-covers");
                        Ok(t1)
                    } else if self.subtype(t1, t2)? {
                        self.count("lub", "applied-covered");
                        Ok(t2)
                    } else {
                        self.count("lub", "applied-union");
                        Ok(self.interner.union(t1, t2))
                    }
                }
            };
        }

        if d1.is_proxy() || d2.is_proxy() {
            return self.lub_proxy(t1, &d1, t2, &d2);
        }

        if d1.kind().is_placeholder() || d2.kind().is_placeholder() {
            let identical = match (&d1, &d2) {
                (TypeData::SelfTypeParam(a), TypeData::SelfTypeParam(b)) => a == b,
                (TypeData::SelfType, TypeData::SelfType) => true,
                _ => false,
            };
            self.count("lub", "placeholder");
            return Ok(if identical {
                t1
            } else {
                self.interner.union(t1, t2)
            });
        }

        match (&d1, &d2) {
            (TypeData::Class(c1), TypeData::Class(c2)) => Ok(self.lub_ground(t1, *c1, t2, *c2)),
            _ => Err(Self::unreachable("join", &d1, &d2)),
        }
    }

    /// Related classes join to the more general one; unrelated ones to a union.
    fn lub_ground(&self, t1: TypeId, c1: ClassId, t2: TypeId, c2: ClassId) -> TypeId {
        if self.class_as_good_as(c1, c2) {
            self.count("lub", "ground-ancestor");
            return t2;
        }
        if self.class_as_good_as(c2, c1) {
            self.count("lub", "ground-ancestor");
            return t1;
        }
        self.count("lub", "ground-union");
        self.interner.union(t1, t2)
    }

    /// Join a union with another operand, one disjunct at a time.
    fn lub_distribute_union(&self, union: TypeId, other: TypeId) -> LatticeResult<TypeId> {
        let components = self.union_components(union)?;
        let mut consumed: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &component in &components {
            let joined = self.join_checked(component, other)?;
            if joined == component {
                self.count("lub.distribute_union", "covered");
                return Ok(union);
            }
            if joined == other {
                consumed.push(component);
            }
        }

        if consumed.is_empty() {
            self.count("lub.distribute_union", "appended");
            return Ok(self.interner.union(union, self.member_form(other)?));
        }
        match self.filter_union(union, &consumed)? {
            None => {
                self.count("lub.distribute_union", "all-consumed");
                Ok(other)
            }
            Some(rest) => {
                self.count("lub.distribute_union", "some-consumed");
                Ok(self.interner.union(rest, self.member_form(other)?))
            }
        }
    }

    /// Rebuild `ty` without the disjuncts in `drop`; `None` when nothing is left.
    fn filter_union(&self, ty: TypeId, drop: &[TypeId]) -> LatticeResult<Option<TypeId>> {
        let TypeData::Union(left, right) = self.data(ty)? else {
            return Ok((!drop.contains(&ty)).then_some(ty));
        };
        let kept_left = self.filter_union(left, drop)?;
        let kept_right = self.filter_union(right, drop)?;
        Ok(match (kept_left, kept_right) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only),
            (Some(l), Some(r)) if l == left && r == right => Some(ty),
            (Some(l), Some(r)) => Some(self.interner.union(l, r)),
        })
    }

    /// The form a type takes when appended to a union: literals and metas
    /// widen to their nominal class, tuples and shapes stay.
    fn member_form(&self, ty: TypeId) -> LatticeResult<TypeId> {
        match self.data(ty)? {
            TypeData::Literal(_) | TypeData::Meta(_) => self.underlying(ty),
            _ => Ok(ty),
        }
    }

    fn lub_with_intersection(&self, intersection: TypeId, other: TypeId) -> LatticeResult<TypeId> {
        let simplified = self.drop_lub_components(intersection, other)?;
        if simplified != intersection {
            self.count("lub", "intersection-simplified");
            trace!(
                target: "trellis::lattice",
                intersection = intersection.0,
                simplified = simplified.0,
                "dropped intersection components covered by the other operand"
            );
            return self.join_checked(other, simplified);
        }
        self.count("lub", "intersection-union");
        Ok(self.interner.union(other, intersection))
    }

    /// Remove the parts of `ty` that are already below `other`.
    ///
    /// The result `r` satisfies `ty <: r | other`, so joining `other` with
    /// `r` instead of `ty` is sound.
    fn drop_lub_components(&self, ty: TypeId, other: TypeId) -> LatticeResult<TypeId> {
        match self.data(ty)? {
            TypeData::Intersection(left, right) => {
                let new_left = self.drop_lub_components(left, other)?;
                let new_right = self.drop_lub_components(right, other)?;
                if self.subtype(new_left, other)? || self.subtype(new_right, other)? {
                    return Ok(TypeId::BOTTOM);
                }
                if new_left != left || new_right != right {
                    return self.meet_checked(new_left, new_right);
                }
                Ok(ty)
            }
            TypeData::Union(left, right) => {
                let left_sub = self.subtype(left, other)?;
                let right_sub = self.subtype(right, other)?;
                Ok(match (left_sub, right_sub) {
                    (true, true) => TypeId::BOTTOM,
                    (true, false) => right,
                    (false, true) => left,
                    (false, false) => ty,
                })
            }
            _ => Ok(ty),
        }
    }

    /// Both sides applied. Arguments are aligned onto the ancestor class and
    /// combined by the ancestor member's variance.
    fn lub_applied(
        &self,
        t1: TypeId,
        c1: ClassId,
        args1: TypeListId,
        t2: TypeId,
        c2: ClassId,
        args2: TypeListId,
    ) -> LatticeResult<TypeId> {
        let (derived, ancestor) = if self.class_as_good_as(c2, c1) {
            ((t2, c2, args2), (t1, c1, args1))
        } else if self.class_as_good_as(c1, c2) {
            ((t1, c1, args1), (t2, c2, args2))
        } else {
            self.count("lub", "applied-unrelated");
            return Ok(self.interner.union(t1, t2));
        };
        let (derived_ty, derived_class, derived_args) = derived;
        let (ancestor_ty, ancestor_class, ancestor_args) = ancestor;

        let alignment = align_type_members(self.registry, derived_class, ancestor_class);
        let members = self.registry.type_members(ancestor_class);
        let derived_args = self.type_list(derived_args);
        let ancestor_args = self.type_list(ancestor_args);

        let mut new_args: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(members.len());
        let mut changed_from_ancestor = false;
        let mut changed_from_derived = derived_class != ancestor_class;
        for (slot, member) in members.iter().enumerate() {
            let Some(Some(idx)) = alignment.get(slot).copied() else {
                self.count("lub", "applied-unaligned");
                return Ok(self.interner.union(t1, t2));
            };
            let (Some(&d_arg), Some(&a_arg)) = (derived_args.get(idx), ancestor_args.get(slot))
            else {
                return Ok(self.interner.union(t1, t2));
            };
            let combined = match member.variance {
                Variance::Covariant => self.join_checked(d_arg, a_arg)?,
                Variance::Contravariant => self.meet_checked(d_arg, a_arg)?,
                Variance::Invariant => {
                    if !self.equiv(d_arg, a_arg)? {
                        self.count("lub", "applied-invariant-mismatch");
                        return Ok(self.interner.union(t1, t2));
                    }
                    if d_arg.is_untyped() { d_arg } else { a_arg }
                }
            };
            changed_from_ancestor |= combined != a_arg;
            changed_from_derived |= combined != d_arg;
            new_args.push(combined);
        }

        if !changed_from_ancestor {
            self.count("lub", "applied-ancestor");
            return Ok(ancestor_ty);
        }
        if !changed_from_derived {
            self.count("lub", "applied-derived");
            return Ok(derived_ty);
        }
        self.count("lub", "applied-new");
        Ok(self.interner.applied(ancestor_class, &new_args))
    }

    fn lub_proxy(
        &self,
        t1: TypeId,
        d1: &TypeData,
        t2: TypeId,
        d2: &TypeData,
    ) -> LatticeResult<TypeId> {
        if d1.is_proxy() && d2.is_proxy() {
            return self.lub_proxy_pair(t1, d1, t2, d2);
        }
        let (proxy, proxy_data, other) = if d1.is_proxy() {
            (t1, d1, t2)
        } else {
            (t2, d2, t1)
        };
        let underlying = self.underlying(proxy)?;
        if self.subtype(underlying, other)? {
            self.count("lub", "proxy-covered");
            return Ok(other);
        }
        if matches!(proxy_data, TypeData::Tuple { .. } | TypeData::Shape { .. }) {
            self.count("lub", "proxy-union");
            return Ok(self.interner.union(t1, t2));
        }
        self.join_checked(underlying, other)
    }

    fn lub_proxy_pair(
        &self,
        t1: TypeId,
        d1: &TypeData,
        t2: TypeId,
        d2: &TypeData,
    ) -> LatticeResult<TypeId> {
        match (d1, d2) {
            (TypeData::Tuple { elements: e1, .. }, TypeData::Tuple { elements: e2, .. }) => {
                let left = self.type_list(*e1);
                let right = self.type_list(*e2);
                if left.len() != right.len() {
                    self.count("lub", "tuple-arity");
                    return Ok(self.interner.array_of_untyped());
                }
                let mut elements: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(left.len());
                let (mut changed_from_left, mut changed_from_right) = (false, false);
                for (&a, &b) in left.iter().zip(right.iter()) {
                    let joined = self.join_checked(a, b)?;
                    changed_from_left |= joined != a;
                    changed_from_right |= joined != b;
                    elements.push(joined);
                }
                if !changed_from_right {
                    return Ok(t2);
                }
                if !changed_from_left {
                    return Ok(t1);
                }
                self.tuple(&elements)
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
                let (left_keys, left_values) = (self.type_list(*k1), self.type_list(*v1));
                let (right_keys, right_values) = (self.type_list(*k2), self.type_list(*v2));
                let hash_untyped = self.interner.hash_of_untyped();
                if left_keys.len() != right_keys.len() {
                    self.count("lub", "shape-keys");
                    return Ok(hash_untyped);
                }
                let mut values: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(right_keys.len());
                let (mut changed_from_left, mut changed_from_right) = (false, false);
                for (slot, key) in right_keys.iter().enumerate() {
                    let Some(idx) = left_keys.iter().position(|k| k == key) else {
                        self.count("lub", "shape-keys");
                        return Ok(hash_untyped);
                    };
                    let (Some(&a), Some(&b)) = (left_values.get(idx), right_values.get(slot))
                    else {
                        return Ok(hash_untyped);
                    };
                    let joined = self.join_checked(a, b)?;
                    changed_from_left |= joined != a || idx != slot;
                    changed_from_right |= joined != b;
                    values.push(joined);
                }
                if !changed_from_right {
                    return Ok(t2);
                }
                if !changed_from_left {
                    return Ok(t1);
                }
                Ok(self.interner.shape(&right_keys, &values))
            }
            (TypeData::Literal(a), TypeData::Literal(b)) => {
                if a.class() == b.class() {
                    self.count("lub", "literal-widen");
                    return Ok(self.interner.class(a.class()));
                }
                let left = self.interner.class(a.class());
                let right = self.interner.class(b.class());
                self.join_checked(left, right)
            }
            (TypeData::Meta(a), TypeData::Meta(b)) => {
                if self.equiv(*a, *b)? {
                    return Ok(t1);
                }
                Ok(TypeId::OBJECT)
            }
            _ => {
                self.count("lub", "proxy-mismatch");
                let left = self.underlying(t1)?;
                let right = self.underlying(t2)?;
                self.join_checked(left, right)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/join_tests.rs"]
mod tests;
