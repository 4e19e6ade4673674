//! Type interning.
//!
//! `TypeInterner` hash-conses `TypeData` into `TypeId` handles. Storage is
//! split into shards keyed by the hash of the data so that concurrent
//! checkers sharing one interner rarely contend on the same lock. Well-known
//! classes and `SelfType` have fixed intrinsic ids below
//! `TypeId::FIRST_USER` and never touch the shards.

use crate::types::{
    ClassId, DeclId, LiteralValue, OrderedFloat, TypeData, TypeId, TypeListId, TypeVarId,
};
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use trellis_common::{Atom, ShardedInterner};

const SHARD_BITS: u32 = 6;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;
const TYPE_LIST_INLINE: usize = 4;

type TypeListBuffer = SmallVec<[TypeId; TYPE_LIST_INLINE]>;

struct TypeShard {
    key_to_index: RwLock<FxHashMap<TypeData, u32>>,
    index_to_key: RwLock<Vec<TypeData>>,
}

impl TypeShard {
    fn new() -> Self {
        TypeShard {
            key_to_index: RwLock::new(FxHashMap::default()),
            index_to_key: RwLock::new(Vec::new()),
        }
    }
}

struct SliceInterner<T> {
    items: Vec<Arc<[T]>>,
    map: FxHashMap<Arc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash + Clone,
{
    fn new() -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: &[T]) -> u32 {
        if items.is_empty() {
            return 0;
        }
        if let Some(&id) = self.map.get(items) {
            return id;
        }
        let arc: Arc<[T]> = Arc::from(items);
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Option<Arc<[T]>> {
        self.items.get(id as usize).cloned()
    }
}

/// Hash-consing store for types.
///
/// Shared by reference (`&TypeInterner`) between threads; all methods take
/// `&self`.
pub struct TypeInterner {
    shards: [TypeShard; SHARD_COUNT],
    /// Class names, member names and string/symbol literal payloads.
    pub names: ShardedInterner,
    type_lists: RwLock<SliceInterner<TypeId>>,
}

impl TypeInterner {
    pub fn new() -> Self {
        TypeInterner {
            shards: std::array::from_fn(|_| TypeShard::new()),
            names: ShardedInterner::with_prelude(),
            type_lists: RwLock::new(SliceInterner::new()),
        }
    }

    /// Intern a type, returning the existing id for identical data.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.get_intrinsic_id(&data) {
            return id;
        }

        let mut hasher = FxHasher::default();
        data.hash(&mut hasher);
        let shard_idx = (hasher.finish() as usize) & (SHARD_COUNT - 1);
        let shard = &self.shards[shard_idx];

        {
            let map = shard.key_to_index.read().expect("type shard lock poisoned");
            if let Some(&local_index) = map.get(&data) {
                return Self::make_id(local_index, shard_idx as u32);
            }
        }

        let mut map = shard.key_to_index.write().expect("type shard lock poisoned");
        let mut storage = shard.index_to_key.write().expect("type shard lock poisoned");
        if let Some(&local_index) = map.get(&data) {
            return Self::make_id(local_index, shard_idx as u32);
        }

        let local_index = storage.len() as u32;
        assert!(
            local_index <= (u32::MAX - TypeId::FIRST_USER) >> SHARD_BITS,
            "type interner shard exhausted"
        );
        storage.push(data.clone());
        map.insert(data, local_index);
        Self::make_id(local_index, shard_idx as u32)
    }

    /// Structural data behind an id, or `None` for ids this interner never produced.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        if id.is_intrinsic() {
            return self.get_intrinsic_data(id);
        }
        let raw = id.0.checked_sub(TypeId::FIRST_USER)?;
        let shard = self.shards.get((raw & SHARD_MASK) as usize)?;
        let storage = shard.index_to_key.read().expect("type shard lock poisoned");
        storage.get((raw >> SHARD_BITS) as usize).cloned()
    }

    /// The members of an interned type list. Unknown ids read as empty.
    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        let lists = self.type_lists.read().expect("type list lock poisoned");
        lists.get(id.0).unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn intern_type_list(&self, members: &[TypeId]) -> TypeListId {
        let mut lists = self.type_lists.write().expect("type list lock poisoned");
        TypeListId(lists.intern(members))
    }

    /// Number of types, intrinsics included.
    pub fn len(&self) -> usize {
        let mut total = TypeId::FIRST_USER as usize;
        for shard in &self.shards {
            total += shard.index_to_key.read().expect("type shard lock poisoned").len();
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= TypeId::FIRST_USER as usize
    }

    pub fn intern_string(&self, text: &str) -> Atom {
        self.names.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.names.resolve(atom)
    }

    #[inline]
    fn make_id(local_index: u32, shard_idx: u32) -> TypeId {
        TypeId(TypeId::FIRST_USER + ((local_index << SHARD_BITS) | (shard_idx & SHARD_MASK)))
    }

    fn get_intrinsic_id(&self, data: &TypeData) -> Option<TypeId> {
        match data {
            TypeData::Class(class) if class.is_well_known() => Some(TypeId(class.0)),
            TypeData::SelfType => Some(TypeId::SELF_TYPE),
            _ => None,
        }
    }

    fn get_intrinsic_data(&self, id: TypeId) -> Option<TypeData> {
        if id == TypeId::SELF_TYPE {
            return Some(TypeData::SelfType);
        }
        let class = ClassId(id.0);
        class.is_well_known().then_some(TypeData::Class(class))
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn class(&self, class: ClassId) -> TypeId {
        self.intern(TypeData::Class(class))
    }

    /// Raw binary union. No simplification beyond `a | a == a`; use
    /// `TypeLattice::join` for a simplified result.
    pub fn union(&self, left: TypeId, right: TypeId) -> TypeId {
        if left == right {
            return left;
        }
        self.intern(TypeData::Union(left, right))
    }

    /// Raw binary intersection. No simplification beyond `a & a == a`.
    pub fn intersection(&self, left: TypeId, right: TypeId) -> TypeId {
        if left == right {
            return left;
        }
        self.intern(TypeData::Intersection(left, right))
    }

    pub fn applied(&self, class: ClassId, args: &[TypeId]) -> TypeId {
        let args = self.intern_type_list(args);
        self.intern(TypeData::Applied(class, args))
    }

    pub fn array_of(&self, element: TypeId) -> TypeId {
        self.applied(ClassId::ARRAY, &[element])
    }

    pub fn hash_of(&self, key: TypeId, value: TypeId) -> TypeId {
        self.applied(ClassId::HASH, &[key, value])
    }

    /// `Array[Untyped]`
    pub fn array_of_untyped(&self) -> TypeId {
        self.array_of(TypeId::UNTYPED)
    }

    /// `Hash[Untyped, Untyped]`
    pub fn hash_of_untyped(&self) -> TypeId {
        self.hash_of(TypeId::UNTYPED, TypeId::UNTYPED)
    }

    /// Tuple with an explicit underlying type. The lattice's `tuple`
    /// constructor computes the underlying from the elements.
    pub fn tuple_with_underlying(&self, elements: &[TypeId], underlying: TypeId) -> TypeId {
        let elements = self.intern_type_list(elements);
        self.intern(TypeData::Tuple {
            elements,
            underlying,
        })
    }

    /// Shape from parallel key and value lists. Keys must be literal types.
    pub fn shape(&self, keys: &[TypeId], values: &[TypeId]) -> TypeId {
        debug_assert_eq!(keys.len(), values.len(), "shape keys and values differ in length");
        let keys = self.intern_type_list(keys);
        let values = self.intern_type_list(values);
        self.intern(TypeData::Shape { keys, values })
    }

    /// Shape from `(key, value)` pairs.
    pub fn shape_from_pairs(&self, pairs: &[(TypeId, TypeId)]) -> TypeId {
        let keys: TypeListBuffer = pairs.iter().map(|(k, _)| *k).collect();
        let values: TypeListBuffer = pairs.iter().map(|(_, v)| *v).collect();
        self.shape(&keys, &values)
    }

    pub fn literal(&self, value: LiteralValue) -> TypeId {
        self.intern(TypeData::Literal(value))
    }

    pub fn literal_integer(&self, value: i64) -> TypeId {
        self.literal(LiteralValue::Integer(value))
    }

    pub fn literal_float(&self, value: f64) -> TypeId {
        self.literal(LiteralValue::Float(OrderedFloat(value)))
    }

    pub fn literal_string(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.literal(LiteralValue::String(atom))
    }

    pub fn literal_symbol(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.literal(LiteralValue::Symbol(atom))
    }

    pub fn literal_bool(&self, value: bool) -> TypeId {
        self.literal(if value {
            LiteralValue::True
        } else {
            LiteralValue::False
        })
    }

    /// The type of `wrapped`. Wrapping a `Meta` is ill-formed.
    pub fn meta(&self, wrapped: TypeId) -> TypeId {
        debug_assert!(
            !matches!(self.lookup(wrapped), Some(TypeData::Meta(_))),
            "Meta must not wrap another Meta"
        );
        self.intern(TypeData::Meta(wrapped))
    }

    pub fn type_var(&self, var: TypeVarId) -> TypeId {
        self.intern(TypeData::TypeVar(var))
    }

    pub fn lambda_param(&self, decl: DeclId, lower: TypeId, upper: TypeId) -> TypeId {
        self.intern(TypeData::LambdaParam { decl, lower, upper })
    }

    pub fn self_type_param(&self, decl: DeclId) -> TypeId {
        self.intern(TypeData::SelfTypeParam(decl))
    }

    pub fn self_type(&self) -> TypeId {
        TypeId::SELF_TYPE
    }

    pub fn alias(&self, target: DeclId) -> TypeId {
        self.intern(TypeData::Alias(target))
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
