//! Sharded string interner for class, member and literal names.
//!
//! Names are interned once and passed around as `Atom` handles, so name
//! comparisons in the lattice (type member alignment, literal equality) are
//! integer comparisons. The interner is shared by reference across threads;
//! each shard has its own lock.

use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

/// An interned string handle.
///
/// Copying is free and equality is O(1). Use `ShardedInterner::resolve` to
/// recover the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

const SHARD_BITS: u32 = 6;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

/// Names every lattice instance ends up interning.
const PRELUDE_NAMES: &[&str] = &[
    "Top",
    "Bottom",
    "Untyped",
    "Object",
    "Array",
    "Hash",
    "Integer",
    "Float",
    "String",
    "Symbol",
    "TrueClass",
    "FalseClass",
    "NilClass",
    "Elem",
    "K",
    "V",
];

#[derive(Default)]
struct Shard {
    by_text: FxHashMap<Arc<str>, Atom>,
    texts: Vec<Arc<str>>,
}

/// Concurrent string interner.
///
/// The low `SHARD_BITS` of an atom select the shard and the remaining bits
/// index into that shard's table. Atom 0 is always the empty string.
pub struct ShardedInterner {
    shards: [RwLock<Shard>; SHARD_COUNT],
}

impl ShardedInterner {
    pub fn new() -> Self {
        let shards: [RwLock<Shard>; SHARD_COUNT] = std::array::from_fn(|_| RwLock::default());
        if let Ok(mut shard) = shards[0].write() {
            let empty: Arc<str> = Arc::from("");
            shard.texts.push(empty.clone());
            shard.by_text.insert(empty, Atom::NONE);
        }
        ShardedInterner { shards }
    }

    /// Create an interner with the builtin class and member names already present.
    pub fn with_prelude() -> Self {
        let interner = Self::new();
        for name in PRELUDE_NAMES {
            interner.intern(name);
        }
        interner
    }

    /// Intern `text`, returning the existing atom when it was seen before.
    ///
    /// A poisoned shard or an exhausted shard index yields `Atom::NONE`.
    pub fn intern(&self, text: &str) -> Atom {
        if text.is_empty() {
            return Atom::NONE;
        }
        let shard_idx = Self::shard_for(text);

        if let Ok(shard) = self.shards[shard_idx].read()
            && let Some(&atom) = shard.by_text.get(text)
        {
            return atom;
        }

        let Ok(mut shard) = self.shards[shard_idx].write() else {
            return Atom::NONE;
        };
        if let Some(&atom) = shard.by_text.get(text) {
            return atom;
        }
        let local = shard.texts.len() as u32;
        if local > (u32::MAX >> SHARD_BITS) {
            return Atom::NONE;
        }
        let atom = Self::make_atom(local, shard_idx as u32);
        let owned: Arc<str> = Arc::from(text);
        shard.texts.push(owned.clone());
        shard.by_text.insert(owned, atom);
        atom
    }

    /// Resolve an atom. Unknown atoms resolve to the empty string.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let (shard_idx, local) = Self::split_atom(atom);
        let shard = self.shards.get(shard_idx)?.read().ok()?;
        shard.texts.get(local).cloned()
    }

    /// Number of interned strings, the empty string included.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().map(|s| s.texts.len()).unwrap_or(0))
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    #[inline]
    fn shard_for(text: &str) -> usize {
        let mut hasher = FxHasher::default();
        text.hash(&mut hasher);
        (hasher.finish() as usize) & (SHARD_COUNT - 1)
    }

    #[inline]
    fn make_atom(local: u32, shard_idx: u32) -> Atom {
        Atom((local << SHARD_BITS) | (shard_idx & SHARD_MASK))
    }

    #[inline]
    fn split_atom(atom: Atom) -> (usize, usize) {
        let raw = atom.0;
        ((raw & SHARD_MASK) as usize, (raw >> SHARD_BITS) as usize)
    }
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}
