//! Latis IR - interned subscript keys
//!
//! This crate turns raw subscripts into small, globally unique identifiers:
//! - `Key`: wildcard, integer, or string subscript, classified by its id
//! - `KeyInterner`: sharded interning tables plus the reverse name table
//! - `MultiKey`: multi-level subscript paths
//!
//! # Process-wide Interner
//!
//! The set of distinct subscript literals in a program is fixed and small,
//! so keys are interned once into a process-wide [`KeyInterner`] that is
//! created on first use and never cleared. [`any_key`], [`int_key`],
//! [`string_key`] and `Key`'s `Display` all go through it.

use std::sync::LazyLock;

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod key;
mod multi_key;

pub use interner::{InternError, KeyError, KeyInterner, NUM_SHARDS};
pub use key::{Key, KeyKind, Subscript};
pub use multi_key::MultiKey;

static KEYS: LazyLock<KeyInterner> = LazyLock::new(KeyInterner::new);

/// The process-wide interner.
#[inline]
pub fn keys() -> &'static KeyInterner {
    &KEYS
}

/// The wildcard key.
#[inline]
pub fn any_key() -> Key {
    Key::ANY
}

/// Intern an integer subscript in the process-wide interner.
#[inline]
pub fn int_key(value: i32) -> Key {
    KEYS.int_key(value)
}

/// Intern a string subscript in the process-wide interner.
#[inline]
pub fn string_key(value: &str) -> Key {
    KEYS.string_key(value)
}

/// Intern a raw subscript in the process-wide interner.
#[inline]
pub fn resolve_key(subscript: Subscript<'_>) -> Key {
    KEYS.resolve(subscript)
}
