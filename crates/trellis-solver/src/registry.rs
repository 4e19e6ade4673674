//! Class registry interface and an in-memory implementation.
//!
//! The lattice never owns the nominal hierarchy. It asks a `ClassRegistry`
//! for ancestry, generic type members with their variance, class/module kind
//! and the bounds of generic placeholders. `ClassTable` is a small registry
//! for drivers and tests that do not have a host compiler behind them.

use crate::intern::TypeInterner;
use crate::types::{ClassId, DeclId, TypeId, TypeMember, Variance};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Read-only queries the lattice makes against the nominal hierarchy.
///
/// Implementations must be safe to share between threads that run
/// independent lattice queries.
pub trait ClassRegistry: Sync {
    /// Whether `sub` is `sup` or inherits from it (including included modules).
    fn derives_from(&self, sub: ClassId, sup: ClassId) -> bool;

    /// Generic type members of `class`, in declaration order.
    fn type_members(&self, class: ClassId) -> &[TypeMember];

    fn is_module(&self, class: ClassId) -> bool;

    fn is_class(&self, class: ClassId) -> bool {
        !self.is_module(class)
    }

    /// The type a declaration resolves to. For the declaration behind a
    /// `SelfTypeParam` this is its `LambdaParam`.
    fn declaration_type(&self, decl: DeclId) -> Option<TypeId>;

    /// Display name, if the registry knows the class.
    fn class_name(&self, class: ClassId) -> Option<&str>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Module,
}

#[derive(Clone, Debug)]
struct ClassInfo {
    name: String,
    kind: ClassKind,
    parents: SmallVec<[ClassId; 2]>,
    members: Vec<TypeMember>,
}

/// In-memory class hierarchy.
///
/// Ancestor sets are kept transitively closed in a `FixedBitSet` per class,
/// so `derives_from` is a single bit test. The well-known classes are
/// registered on construction: `Array` has a covariant `Elem` member and
/// `Hash` has covariant `K` and `V` members.
pub struct ClassTable {
    classes: Vec<Option<ClassInfo>>,
    ancestors: Vec<FixedBitSet>,
    declarations: FxHashMap<DeclId, TypeId>,
    next_decl: u32,
}

impl ClassTable {
    pub fn new(interner: &TypeInterner) -> Self {
        let mut table = ClassTable {
            classes: Vec::new(),
            ancestors: Vec::new(),
            declarations: FxHashMap::default(),
            next_decl: 1,
        };

        table.insert(ClassId::TOP, "Top", ClassKind::Class, &[]);
        table.insert(ClassId::BOTTOM, "Bottom", ClassKind::Class, &[]);
        table.insert(ClassId::UNTYPED, "Untyped", ClassKind::Class, &[]);
        table.insert(ClassId::OBJECT, "Object", ClassKind::Class, &[]);
        let object = [ClassId::OBJECT];
        table.insert(ClassId::ARRAY, "Array", ClassKind::Class, &object);
        table.insert(ClassId::HASH, "Hash", ClassKind::Class, &object);
        table.insert(ClassId::INTEGER, "Integer", ClassKind::Class, &object);
        table.insert(ClassId::FLOAT, "Float", ClassKind::Class, &object);
        table.insert(ClassId::STRING, "String", ClassKind::Class, &object);
        table.insert(ClassId::SYMBOL, "Symbol", ClassKind::Class, &object);
        table.insert(ClassId::TRUE_CLASS, "TrueClass", ClassKind::Class, &object);
        table.insert(ClassId::FALSE_CLASS, "FalseClass", ClassKind::Class, &object);
        table.insert(ClassId::NIL_CLASS, "NilClass", ClassKind::Class, &object);

        table.add_type_member(interner, ClassId::ARRAY, "Elem", Variance::Covariant);
        table.add_type_member(interner, ClassId::HASH, "K", Variance::Covariant);
        table.add_type_member(interner, ClassId::HASH, "V", Variance::Covariant);
        table
    }

    /// Define a class. Without an explicit superclass it inherits from `Object`.
    pub fn define_class(&mut self, name: &str, superclass: Option<ClassId>) -> ClassId {
        let id = self.next_class_id();
        let parent = [superclass.unwrap_or(ClassId::OBJECT)];
        self.insert(id, name, ClassKind::Class, &parent);
        id
    }

    /// Define a module. Modules have no ancestors until something includes them.
    pub fn define_module(&mut self, name: &str) -> ClassId {
        let id = self.next_class_id();
        self.insert(id, name, ClassKind::Module, &[]);
        id
    }

    /// Make `class` (and everything deriving from it) derive from `module`.
    pub fn include_module(&mut self, class: ClassId, module: ClassId) {
        let Some(module_ancestors) = self.ancestors.get(module.0 as usize).cloned() else {
            return;
        };
        if let Some(Some(info)) = self.classes.get_mut(class.0 as usize) {
            info.parents.push(module);
        }
        let class_bit = class.0 as usize;
        for set in &mut self.ancestors {
            if class_bit < set.len() && set.contains(class_bit) {
                set.union_with(&module_ancestors);
            }
        }
    }

    /// Declare a generic type member on `class` and return its declaration.
    pub fn add_type_member(
        &mut self,
        interner: &TypeInterner,
        class: ClassId,
        name: &str,
        variance: Variance,
    ) -> DeclId {
        let decl = self.fresh_decl();
        let member = TypeMember {
            decl,
            name: interner.intern_string(name),
            variance,
        };
        if let Some(Some(info)) = self.classes.get_mut(class.0 as usize) {
            info.members.push(member);
        }
        decl
    }

    /// Allocate a declaration not attached to any class.
    pub fn fresh_decl(&mut self) -> DeclId {
        let decl = DeclId(self.next_decl);
        self.next_decl += 1;
        decl
    }

    /// Record what a declaration resolves to.
    pub fn bind_declaration(&mut self, decl: DeclId, ty: TypeId) {
        self.declarations.insert(decl, ty);
    }

    pub fn kind(&self, class: ClassId) -> Option<ClassKind> {
        self.info(class).map(|info| info.kind)
    }

    /// Directly declared parents (superclass first, then included modules).
    pub fn parents(&self, class: ClassId) -> &[ClassId] {
        self.info(class).map(|info| info.parents.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.classes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn info(&self, class: ClassId) -> Option<&ClassInfo> {
        self.classes.get(class.0 as usize)?.as_ref()
    }

    fn next_class_id(&self) -> ClassId {
        ClassId((self.classes.len() as u32).max(ClassId::FIRST_USER))
    }

    fn insert(&mut self, id: ClassId, name: &str, kind: ClassKind, parents: &[ClassId]) {
        let idx = id.0 as usize;
        if self.classes.len() <= idx {
            self.classes.resize(idx + 1, None);
            self.ancestors.resize(idx + 1, FixedBitSet::new());
        }

        let mut closure = FixedBitSet::with_capacity(idx + 1);
        closure.insert(idx);
        for parent in parents {
            if let Some(parent_set) = self.ancestors.get(parent.0 as usize) {
                closure.union_with(parent_set);
            }
        }
        self.ancestors[idx] = closure;
        self.classes[idx] = Some(ClassInfo {
            name: name.to_string(),
            kind,
            parents: parents.iter().copied().collect(),
            members: Vec::new(),
        });
    }
}

impl ClassRegistry for ClassTable {
    fn derives_from(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup {
            return true;
        }
        self.ancestors
            .get(sub.0 as usize)
            .is_some_and(|set| set.contains(sup.0 as usize))
    }

    fn type_members(&self, class: ClassId) -> &[TypeMember] {
        self.info(class).map(|info| info.members.as_slice()).unwrap_or(&[])
    }

    fn is_module(&self, class: ClassId) -> bool {
        self.kind(class) == Some(ClassKind::Module)
    }

    fn declaration_type(&self, decl: DeclId) -> Option<TypeId> {
        self.declarations.get(&decl).copied()
    }

    fn class_name(&self, class: ClassId) -> Option<&str> {
        self.info(class).map(|info| info.name.as_str())
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod tests;
