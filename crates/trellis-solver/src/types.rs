//! Type representation for the lattice.
//!
//! A type is a `TypeId` handle into the `TypeInterner`. The interner
//! hash-conses `TypeData`, so two structurally identical nodes always share a
//! handle and `TypeId` equality is the identity fast path used by every
//! engine. Unions and intersections are stored as binary trees and are never
//! flattened in storage.

use serde::Serialize;
use std::hash::{Hash, Hasher};
use trellis_common::Atom;

/// Interned type handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Sentinel for "no type". Never produced by the interner.
    pub const NONE: TypeId = TypeId(0);

    pub const TOP: TypeId = TypeId(ClassId::TOP.0);
    pub const BOTTOM: TypeId = TypeId(ClassId::BOTTOM.0);
    pub const UNTYPED: TypeId = TypeId(ClassId::UNTYPED.0);
    pub const OBJECT: TypeId = TypeId(ClassId::OBJECT.0);
    pub const ARRAY: TypeId = TypeId(ClassId::ARRAY.0);
    pub const HASH: TypeId = TypeId(ClassId::HASH.0);
    pub const INTEGER: TypeId = TypeId(ClassId::INTEGER.0);
    pub const FLOAT: TypeId = TypeId(ClassId::FLOAT.0);
    pub const STRING: TypeId = TypeId(ClassId::STRING.0);
    pub const SYMBOL: TypeId = TypeId(ClassId::SYMBOL.0);
    pub const TRUE_CLASS: TypeId = TypeId(ClassId::TRUE_CLASS.0);
    pub const FALSE_CLASS: TypeId = TypeId(ClassId::FALSE_CLASS.0);
    pub const NIL_CLASS: TypeId = TypeId(ClassId::NIL_CLASS.0);
    pub const SELF_TYPE: TypeId = TypeId(14);

    /// First id handed out for interned (non-intrinsic) types.
    pub const FIRST_USER: u32 = 64;

    #[inline]
    pub fn is_intrinsic(self) -> bool {
        self.0 > 0 && self.0 < Self::FIRST_USER
    }

    #[inline]
    pub fn is_untyped(self) -> bool {
        self == Self::UNTYPED
    }

    #[inline]
    pub fn is_bottom(self) -> bool {
        self == Self::BOTTOM
    }

    #[inline]
    pub fn is_top(self) -> bool {
        self == Self::TOP
    }
}

/// Nominal class or module handle, owned by the class registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const TOP: ClassId = ClassId(1);
    pub const BOTTOM: ClassId = ClassId(2);
    pub const UNTYPED: ClassId = ClassId(3);
    pub const OBJECT: ClassId = ClassId(4);
    pub const ARRAY: ClassId = ClassId(5);
    pub const HASH: ClassId = ClassId(6);
    pub const INTEGER: ClassId = ClassId(7);
    pub const FLOAT: ClassId = ClassId(8);
    pub const STRING: ClassId = ClassId(9);
    pub const SYMBOL: ClassId = ClassId(10);
    pub const TRUE_CLASS: ClassId = ClassId(11);
    pub const FALSE_CLASS: ClassId = ClassId(12);
    pub const NIL_CLASS: ClassId = ClassId(13);

    /// Highest well-known class id.
    pub const LAST_WELL_KNOWN: ClassId = ClassId::NIL_CLASS;

    /// First id a registry may hand out for user classes.
    pub const FIRST_USER: u32 = 32;

    #[inline]
    pub fn is_well_known(self) -> bool {
        self.0 >= Self::TOP.0 && self.0 <= Self::LAST_WELL_KNOWN.0
    }

    /// Top, Bottom and Untyped are handled before any structural rule.
    #[inline]
    pub fn is_singleton(self) -> bool {
        self == Self::TOP || self == Self::BOTTOM || self == Self::UNTYPED
    }
}

/// Declaration handle: a type member, a generic placeholder or an alias target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

/// Open inference variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeVarId(pub u32);

/// Interned ordered list of types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeListId(pub u32);

impl TypeListId {
    pub const EMPTY: TypeListId = TypeListId(0);
}

/// `f64` with bitwise equality so literal floats can be interned.
#[derive(Clone, Copy, Debug)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Payload of a literal type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Integer(i64),
    Float(OrderedFloat),
    String(Atom),
    Symbol(Atom),
    True,
    False,
}

impl LiteralValue {
    /// The nominal class a literal of this value belongs to.
    pub fn class(&self) -> ClassId {
        match self {
            LiteralValue::Integer(_) => ClassId::INTEGER,
            LiteralValue::Float(_) => ClassId::FLOAT,
            LiteralValue::String(_) => ClassId::STRING,
            LiteralValue::Symbol(_) => ClassId::SYMBOL,
            LiteralValue::True => ClassId::TRUE_CLASS,
            LiteralValue::False => ClassId::FALSE_CLASS,
        }
    }
}

/// Variance annotation of a generic type member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Variance {
    Covariant,
    Invariant,
    Contravariant,
}

/// A generic type member declared on a class or module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeMember {
    pub decl: DeclId,
    pub name: Atom,
    pub variance: Variance,
}

/// How `Untyped` relates to other types in subtyping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum UntypedMode {
    /// Untyped is a subtype and a supertype of everything.
    AlwaysCompatible,
    /// Untyped relates to nothing but itself.
    AlwaysIncompatible,
}

/// Structural data of an interned type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Nominal class or module, including Top, Bottom and Untyped.
    Class(ClassId),
    Union(TypeId, TypeId),
    Intersection(TypeId, TypeId),
    /// Generic class applied to arguments, in the class's member order.
    Applied(ClassId, TypeListId),
    /// Fixed-arity array. `underlying` is `Array[join of elements]`.
    Tuple {
        elements: TypeListId,
        underlying: TypeId,
    },
    /// Record-like hash. Keys are literal types, parallel to `values`.
    Shape {
        keys: TypeListId,
        values: TypeListId,
    },
    Literal(LiteralValue),
    /// The type of a type. Never wraps another `Meta`.
    Meta(TypeId),
    TypeVar(TypeVarId),
    /// Unresolved generic parameter with its bounds.
    LambdaParam {
        decl: DeclId,
        lower: TypeId,
        upper: TypeId,
    },
    /// A type member seen from inside its own declaration.
    SelfTypeParam(DeclId),
    SelfType,
    /// Symbolic alias. Must be resolved before reaching the lattice.
    Alias(DeclId),
}

/// Variant tag of a `TypeData`, without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TypeKind {
    Applied,
    Class,
    Literal,
    Tuple,
    Shape,
    Meta,
    Union,
    Intersection,
    LambdaParam,
    TypeVar,
    SelfTypeParam,
    SelfType,
    Alias,
}

impl TypeKind {
    /// Dispatch rank. Binary engines swap operands so the lower rank is on
    /// the left, which makes them commutative by construction.
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Applied => "Applied",
            TypeKind::Class => "Class",
            TypeKind::Literal => "Literal",
            TypeKind::Tuple => "Tuple",
            TypeKind::Shape => "Shape",
            TypeKind::Meta => "Meta",
            TypeKind::Union => "Union",
            TypeKind::Intersection => "Intersection",
            TypeKind::LambdaParam => "LambdaParam",
            TypeKind::TypeVar => "TypeVar",
            TypeKind::SelfTypeParam => "SelfTypeParam",
            TypeKind::SelfType => "SelfType",
            TypeKind::Alias => "Alias",
        }
    }

    /// Tuple, Shape, Literal and Meta carry a nominal underlying type.
    #[inline]
    pub fn is_proxy(self) -> bool {
        matches!(
            self,
            TypeKind::Tuple | TypeKind::Shape | TypeKind::Literal | TypeKind::Meta
        )
    }

    /// Generic placeholders that only relate to themselves structurally.
    #[inline]
    pub fn is_placeholder(self) -> bool {
        matches!(
            self,
            TypeKind::LambdaParam | TypeKind::TypeVar | TypeKind::SelfTypeParam | TypeKind::SelfType
        )
    }
}

impl TypeData {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeData::Class(_) => TypeKind::Class,
            TypeData::Union(..) => TypeKind::Union,
            TypeData::Intersection(..) => TypeKind::Intersection,
            TypeData::Applied(..) => TypeKind::Applied,
            TypeData::Tuple { .. } => TypeKind::Tuple,
            TypeData::Shape { .. } => TypeKind::Shape,
            TypeData::Literal(_) => TypeKind::Literal,
            TypeData::Meta(_) => TypeKind::Meta,
            TypeData::TypeVar(_) => TypeKind::TypeVar,
            TypeData::LambdaParam { .. } => TypeKind::LambdaParam,
            TypeData::SelfTypeParam(_) => TypeKind::SelfTypeParam,
            TypeData::SelfType => TypeKind::SelfType,
            TypeData::Alias(_) => TypeKind::Alias,
        }
    }

    /// Variant name used in diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    #[inline]
    pub fn is_proxy(&self) -> bool {
        self.kind().is_proxy()
    }
}
