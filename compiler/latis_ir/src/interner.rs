//! Sharded key interner.
//!
//! Integer and string subscripts are interned into [`Key`]s through two
//! independent sharded tables, plus a reverse table from string key ids back
//! to their text. Each shard has its own lock so unrelated subscripts never
//! contend, and the "already interned" path only takes a read lock.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};

use crate::{Key, KeyKind, Subscript};

/// Number of lock shards per table.
pub const NUM_SHARDS: usize = 16;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternError {
    /// Every string key id has been handed out.
    #[error("string key space exhausted: {count} strings interned, max is {max}")]
    Overflow { count: u64, max: u64 },
}

/// Error when rendering a key fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The id is neither the wildcard, an integer key, nor a string key.
    #[error("key id {id} is not classified as any, integer or string key")]
    Unclassified { id: u64 },
    /// A string key id that this interner never published.
    #[error("string key id {id} has no published name")]
    UnknownStringKey { id: u64 },
}

/// Concurrent interning tables for subscript keys.
///
/// # Thread Safety
/// Uses a `RwLock` per shard. Lookups of already-interned values take only
/// the shard's read lock; a miss takes the write lock and checks again before
/// publishing, so each distinct value gets exactly one `Key`.
pub struct KeyInterner {
    int_shards: [RwLock<FxHashMap<i32, Key>>; NUM_SHARDS],
    string_shards: [RwLock<FxHashMap<&'static str, Key>>; NUM_SHARDS],
    /// Reverse table: string key -> text. Sharded by key id.
    names: [RwLock<FxHashMap<Key, &'static str>>; NUM_SHARDS],
    /// Next string index; also the number of string keys handed out.
    next_string: AtomicU64,
    int_count: AtomicUsize,
    name_count: AtomicUsize,
}

impl KeyInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self {
            int_shards: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
            string_shards: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
            names: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
            next_string: AtomicU64::new(0),
            int_count: AtomicUsize::new(0),
            name_count: AtomicUsize::new(0),
        }
    }

    /// An empty interner whose string counter starts at `count`.
    #[cfg(test)]
    fn with_string_count(count: u64) -> Self {
        let interner = Self::new();
        interner.next_string.store(count, Ordering::Relaxed);
        interner
    }

    #[inline]
    fn shard_for<T: Hash + ?Sized>(value: &T) -> usize {
        let mut hasher = FxHasher::default();
        value.hash(&mut hasher);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "truncation is fine for hash-based shard selection"
        )]
        let hash = hasher.finish() as usize;
        hash % NUM_SHARDS
    }

    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the modulo bounds the value by NUM_SHARDS"
    )]
    fn name_shard_for(key: Key) -> usize {
        ((key.raw() / 2) % NUM_SHARDS as u64) as usize
    }

    /// The wildcard key. No table access.
    #[inline]
    pub fn any_key(&self) -> Key {
        Key::ANY
    }

    /// Intern an integer subscript.
    pub fn int_key(&self, value: i32) -> Key {
        let shard = &self.int_shards[Self::shard_for(&value)];

        // Fast path: check if already interned
        if let Some(&key) = shard.read().get(&value) {
            return key;
        }

        // Slow path: need to insert
        let mut guard = shard.write();

        // Double-check after acquiring write lock
        if let Some(&key) = guard.get(&value) {
            return key;
        }

        let key = Key::for_int(value);
        guard.insert(value, key);
        self.int_count.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(value, id = key.raw(), "interned int key");
        key
    }

    /// Try to intern a string subscript, returning an error once the string
    /// id space is exhausted.
    ///
    /// The text is published in the reverse table before the key is
    /// returned, so any thread that observes the key can also render it.
    pub fn try_string_key(&self, value: &str) -> Result<Key, InternError> {
        let shard = &self.string_shards[Self::shard_for(value)];

        // Fast path: check if already interned
        if let Some(&key) = shard.read().get(value) {
            return Ok(key);
        }

        // Slow path: need to insert
        let mut guard = shard.write();

        // Double-check after acquiring write lock
        if let Some(&key) = guard.get(value) {
            return Ok(key);
        }

        // The counter only moves when an index is actually available.
        let overflow = |count| InternError::Overflow {
            count,
            max: u64::from(u32::MAX) + 1,
        };
        let count = self
            .next_string
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n <= u64::from(u32::MAX)).then_some(n + 1)
            })
            .map_err(overflow)?;
        let index = u32::try_from(count).map_err(|_| overflow(count))?;
        let key = Key::for_string_index(index);

        // Interned strings live for the rest of the process.
        let leaked: &'static str = Box::leak(value.to_owned().into_boxed_str());

        {
            let mut names = self.names[Self::name_shard_for(key)].write();
            let previous = names.insert(key, leaked);
            debug_assert!(previous.is_none(), "string key {key:?} published twice");
        }
        self.name_count.fetch_add(1, Ordering::Relaxed);

        guard.insert(leaked, key);
        tracing::trace!(value, id = key.raw(), "interned string key");
        Ok(key)
    }

    /// Intern a string subscript.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX + 1` distinct strings are interned.
    /// Use `try_string_key` for fallible interning.
    pub fn string_key(&self, value: &str) -> Key {
        self.try_string_key(value).unwrap_or_else(|e| {
            tracing::error!(error = %e, "string key interning failed");
            panic!("{e}")
        })
    }

    /// Intern a raw subscript.
    pub fn resolve(&self, subscript: Subscript<'_>) -> Key {
        match subscript {
            Subscript::Any => Key::ANY,
            Subscript::Int(value) => self.int_key(value),
            Subscript::Str(value) => self.string_key(value),
        }
    }

    /// Look up the text of a string key.
    pub fn name_of(&self, key: Key) -> Option<&'static str> {
        if !key.is_string_key() {
            return None;
        }
        self.names[Self::name_shard_for(key)].read().get(&key).copied()
    }

    /// Render a key, or report why it cannot be rendered.
    pub fn try_render(&self, key: Key) -> Result<Cow<'static, str>, KeyError> {
        match key.kind() {
            Some(KeyKind::Any) => Ok(Cow::Borrowed("Any")),
            Some(KeyKind::Int(value)) => Ok(Cow::Owned(value.to_string())),
            Some(KeyKind::String) => self
                .name_of(key)
                .map(Cow::Borrowed)
                .ok_or(KeyError::UnknownStringKey { id: key.raw() }),
            None => Err(KeyError::Unclassified { id: key.raw() }),
        }
    }

    /// Render a key: `Any`, the decimal integer, or the string text.
    ///
    /// # Panics
    /// Panics if the key is unclassified or names a string this interner
    /// never published. Either means a key escaped from somewhere it should
    /// not have.
    pub fn render(&self, key: Key) -> Cow<'static, str> {
        self.try_render(key).unwrap_or_else(|e| {
            tracing::error!(error = %e, "key rendering hit an invariant violation");
            panic!("{e}")
        })
    }

    /// Number of distinct integer subscripts interned (O(1)).
    pub fn len_int_keys(&self) -> usize {
        self.int_count.load(Ordering::Relaxed)
    }

    /// Number of distinct string subscripts interned (O(1)).
    #[expect(
        clippy::cast_possible_truncation,
        reason = "string indices are bounded by u32"
    )]
    pub fn len_string_keys(&self) -> usize {
        self.next_string.load(Ordering::Relaxed) as usize
    }

    /// Number of entries in the reverse name table (O(1)).
    pub fn len_names(&self) -> usize {
        self.name_count.load(Ordering::Relaxed)
    }
}

impl Default for KeyInterner {
    fn default() -> Self {
        Self::new()
    }
}
