//! Greatest lower bound.
//!
//! Dual of the join with a few deliberate asymmetries: intersections are
//! distributed eagerly, proxies of different kinds meet at Bottom, and two
//! unions are only split into pairwise meets when a scoring heuristic says
//! the split will collapse.

use crate::align::align_type_members;
use crate::errors::LatticeResult;
use crate::lattice::TypeLattice;
use crate::registry::ClassRegistry;
use crate::types::{ClassId, TypeData, TypeId, TypeListId, Variance};
use smallvec::SmallVec;
use tracing::trace;

impl<'a, R: ClassRegistry + ?Sized> TypeLattice<'a, R> {
    pub(crate) fn glb(&self, t1: TypeId, t2: TypeId) -> LatticeResult<TypeId> {
        if t1 == t2 {
            self.count("glb", "ref-eq");
            return Ok(t1);
        }
        let d1 = self.data(t1)?;
        let d2 = self.data(t2)?;
        if let Some(err) = Self::alias_error("meet", &d1, &d2) {
            return Err(err);
        }

        if t1.is_bottom() || t2.is_bottom() {
            self.count("glb", "bottom");
            return Ok(TypeId::BOTTOM);
        }
        // Untyped only gives way to Top.
        if t1.is_untyped() && t2.is_top() {
            return Ok(t1);
        }
        if t2.is_untyped() && t1.is_top() {
            return Ok(t2);
        }
        if t1.is_top() || t1.is_untyped() {
            return Ok(t2);
        }
        if t2.is_top() || t2.is_untyped() {
            return Ok(t1);
        }

        let (t1, d1, t2, d2) = if d1.kind().rank() > d2.kind().rank() {
            (t2, d2, t1, d1)
        } else {
            (t1, d1, t2, d2)
        };

        if let TypeData::Intersection(left, right) = d1 {
            return self.glb_distribute_intersection(t1, left, right, t2);
        }
        if let TypeData::Intersection(left, right) = d2 {
            return self.glb_distribute_intersection(t2, left, right, t1);
        }

        if d1.is_proxy() && d2.is_proxy() {
            return self.glb_proxy_pair(t1, &d1, t2, &d2);
        }
        if d1.is_proxy() || d2.is_proxy() {
            let (proxy, other) = if d1.is_proxy() { (t1, t2) } else { (t2, t1) };
            if self.subtype(proxy, other)? {
                self.count("glb", "proxy-below");
                return Ok(proxy);
            }
            self.count("glb", "proxy-bottom");
            return Ok(TypeId::BOTTOM);
        }

        if let TypeData::Union(left, right) = d2 {
            return self.glb_with_union(t1, &d1, t2, left, right);
        }
        // Placeholders rank after unions.
        if let TypeData::Union(left, right) = d1 {
            return self.glb_with_union(t2, &d2, t1, left, right);
        }

        if let TypeData::Applied(c1, args1) = d1 {
            return match d2 {
                TypeData::Applied(c2, args2) => self.glb_applied(t1, c1, args1, t2, c2, args2),
                TypeData::Class(c2) => {
                    if self.registry.is_module(c1) {
                        Ok(self.interner.intersection(t1, t2))
                    } else if self.class_as_good_as(c1, c2) {
                        self.count("glb", "applied-below");
                        Ok(t1)
                    } else if self.registry.is_module(c2) {
                        Ok(self.interner.intersection(t1, t2))
                    } else {
                        self.count("glb", "applied-bottom");
                        Ok(TypeId::BOTTOM)
                    }
                }
                _ => Ok(self.interner.intersection(t1, t2)),
            };
        }

        if d1.kind().is_placeholder() || d2.kind().is_placeholder() {
            let identical = match (&d1, &d2) {
                (TypeData::SelfTypeParam(a), TypeData::SelfTypeParam(b)) => a == b,
                (TypeData::SelfType, TypeData::SelfType) => true,
                _ => false,
            };
            self.count("glb", "placeholder");
            return Ok(if identical {
                t1
            } else {
                self.interner.intersection(t1, t2)
            });
        }

        match (&d1, &d2) {
            (TypeData::Class(c1), TypeData::Class(c2)) => Ok(self.glb_ground(t1, *c1, t2, *c2)),
            _ => Err(Self::unreachable("meet", &d1, &d2)),
        }
    }

    /// Related classes meet at the more specific one. Unrelated classes have
    /// no common instance unless a module is involved.
    fn glb_ground(&self, t1: TypeId, c1: ClassId, t2: TypeId, c2: ClassId) -> TypeId {
        if self.class_as_good_as(c1, c2) {
            self.count("glb", "ground-descendant");
            return t1;
        }
        if self.class_as_good_as(c2, c1) {
            self.count("glb", "ground-descendant");
            return t2;
        }
        if self.registry.is_module(c1) || self.registry.is_module(c2) {
            self.count("glb", "ground-module");
            return self.interner.intersection(t1, t2);
        }
        self.count("glb", "ground-bottom");
        TypeId::BOTTOM
    }

    /// Meet each conjunct of `intersection` with `other`, keeping whichever
    /// side already carries the answer.
    fn glb_distribute_intersection(
        &self,
        intersection: TypeId,
        left: TypeId,
        right: TypeId,
        other: TypeId,
    ) -> LatticeResult<TypeId> {
        let new_left = self.meet_checked(left, other)?;
        if new_left == left {
            self.count("glb.distribute_intersection", "left-below");
            return Ok(intersection);
        }
        let new_right = self.meet_checked(right, other)?;
        if new_left == other {
            self.count("glb.distribute_intersection", "left-absorbed");
            return Ok(new_right);
        }
        if new_right == right {
            self.count("glb.distribute_intersection", "right-below");
            return Ok(intersection);
        }
        if new_right == other {
            self.count("glb.distribute_intersection", "right-absorbed");
            return Ok(new_left);
        }
        if self.subtype(new_left, new_right)? {
            self.count("glb.distribute_intersection", "left-narrower");
            return Ok(new_left);
        }
        if self.subtype(new_right, new_left)? {
            self.count("glb.distribute_intersection", "right-narrower");
            return Ok(new_right);
        }
        self.count("glb.distribute_intersection", "kept");
        Ok(self.interner.intersection(intersection, other))
    }

    fn glb_with_union(
        &self,
        t1: TypeId,
        d1: &TypeData,
        t2: TypeId,
        left2: TypeId,
        right2: TypeId,
    ) -> LatticeResult<TypeId> {
        if self.as_specific_as(t1, t2)? {
            self.count("glb.union", "left-below");
            return Ok(t1);
        }
        if self.as_specific_as(t2, t1)? {
            self.count("glb.union", "right-below");
            return Ok(t2);
        }

        if matches!(d1, TypeData::Class(_) | TypeData::Applied(..)) {
            let with_left = self.meet_checked(t1, left2)?;
            if !with_left.is_bottom() && self.as_specific_as(with_left, right2)? {
                self.count("glb.union", "class-left");
                return Ok(with_left);
            }
            let with_right = self.meet_checked(t1, right2)?;
            if !with_right.is_bottom() && self.as_specific_as(with_right, left2)? {
                self.count("glb.union", "class-right");
                return Ok(with_right);
            }
            if with_left.is_bottom() {
                self.count("glb.union", "class-right");
                return Ok(with_right);
            }
            if with_right.is_bottom() {
                self.count("glb.union", "class-left");
                return Ok(with_left);
            }
        }

        if let TypeData::Union(left1, right1) = *d1 {
            let pairings = [
                (self.meet_checked(left1, left2)?, left1, left2),
                (self.meet_checked(left1, right2)?, left1, right2),
                (self.meet_checked(right1, left2)?, right1, left2),
                (self.meet_checked(right1, right2)?, right1, right2),
            ];
            let mut score = pairings
                .iter()
                .filter(|(met, a, b)| met == a || met == b)
                .count();
            if pairings.iter().any(|(met, _, _)| met.is_bottom()) {
                score += 1;
            }
            trace!(target: "trellis::lattice", score, "union pairing score");
            if score > 0 {
                self.count("glb.union", "pairings-collapsed");
                let first = self.join_checked(pairings[0].0, pairings[1].0)?;
                let second = self.join_checked(pairings[2].0, pairings[3].0)?;
                return self.join_checked(first, second);
            }
        }

        self.count("glb.union", "intersection");
        Ok(self.interner.intersection(t1, t2))
    }

    /// Both sides applied. Iterates the derived class's members; members with
    /// no ancestor counterpart keep the derived argument.
    fn glb_applied(
        &self,
        t1: TypeId,
        c1: ClassId,
        args1: TypeListId,
        t2: TypeId,
        c2: ClassId,
        args2: TypeListId,
    ) -> LatticeResult<TypeId> {
        let (derived, ancestor) = if self.class_as_good_as(c1, c2) {
            ((t1, c1, args1), (t2, c2, args2))
        } else if self.class_as_good_as(c2, c1) {
            ((t2, c2, args2), (t1, c1, args1))
        } else if self.registry.is_class(c1) && self.registry.is_class(c2) {
            self.count("glb", "applied-unrelated");
            return Ok(TypeId::BOTTOM);
        } else {
            return Ok(self.interner.intersection(t1, t2));
        };
        let (derived_ty, derived_class, derived_args) = derived;
        let (ancestor_ty, ancestor_class, ancestor_args) = ancestor;

        let alignment = align_type_members(self.registry, ancestor_class, derived_class);
        let members = self.registry.type_members(derived_class);
        let derived_args = self.type_list(derived_args);
        let ancestor_args = self.type_list(ancestor_args);

        let mut new_args: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(members.len());
        for (slot, member) in members.iter().enumerate() {
            let Some(&d_arg) = derived_args.get(slot) else {
                return Ok(self.interner.intersection(t1, t2));
            };
            let a_arg = alignment
                .get(slot)
                .copied()
                .flatten()
                .and_then(|idx| ancestor_args.get(idx).copied());
            let Some(a_arg) = a_arg else {
                new_args.push(d_arg);
                continue;
            };
            let combined = match member.variance {
                Variance::Covariant => self.meet_checked(d_arg, a_arg)?,
                Variance::Contravariant => self.join_checked(d_arg, a_arg)?,
                Variance::Invariant => {
                    if !self.equiv(d_arg, a_arg)? {
                        self.count("glb", "applied-invariant-mismatch");
                        return Ok(self.interner.intersection(t1, t2));
                    }
                    if d_arg.is_untyped() { a_arg } else { d_arg }
                }
            };
            new_args.push(combined);
        }

        if new_args.as_slice() == &derived_args[..] {
            self.count("glb", "applied-derived");
            return Ok(derived_ty);
        }
        if derived_class == ancestor_class && new_args.as_slice() == &ancestor_args[..] {
            self.count("glb", "applied-ancestor");
            return Ok(ancestor_ty);
        }
        self.count("glb", "applied-new");
        Ok(self.interner.applied(derived_class, &new_args))
    }

    fn glb_proxy_pair(
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
                    return Ok(TypeId::BOTTOM);
                }
                let mut elements: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(left.len());
                for (&a, &b) in left.iter().zip(right.iter()) {
                    let met = self.meet_checked(a, b)?;
                    if met.is_bottom() {
                        return Ok(TypeId::BOTTOM);
                    }
                    elements.push(met);
                }
                if elements.as_slice() == &left[..] {
                    return Ok(t1);
                }
                if elements.as_slice() == &right[..] {
                    return Ok(t2);
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
                if left_keys.len() != right_keys.len() {
                    return Ok(TypeId::BOTTOM);
                }
                let mut values: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(right_keys.len());
                let (mut reuse_left, mut reuse_right) = (true, true);
                for (slot, key) in right_keys.iter().enumerate() {
                    let Some(idx) = left_keys.iter().position(|k| k == key) else {
                        return Ok(TypeId::BOTTOM);
                    };
                    let (Some(&a), Some(&b)) = (left_values.get(idx), right_values.get(slot))
                    else {
                        return Ok(TypeId::BOTTOM);
                    };
                    let met = self.meet_checked(a, b)?;
                    if met.is_bottom() {
                        return Ok(TypeId::BOTTOM);
                    }
                    reuse_left &= met == a;
                    reuse_right &= met == b;
                    values.push(met);
                }
                if reuse_left {
                    return Ok(t1);
                }
                if reuse_right {
                    return Ok(t2);
                }
                Ok(self.interner.shape(&right_keys, &values))
            }
            (TypeData::Meta(a), TypeData::Meta(b)) => {
                if self.equiv(*a, *b)? {
                    return Ok(t1);
                }
                Ok(TypeId::BOTTOM)
            }
            // Distinct literals and mismatched proxy kinds share no value.
            _ => {
                self.count("glb", "proxy-mismatch");
                Ok(TypeId::BOTTOM)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/meet_tests.rs"]
mod tests;
