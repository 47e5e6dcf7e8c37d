//! Interned subscript key.
//!
//! A `Key` names one subscript position of a structured type: the wildcard
//! "any subscript", an integer subscript, or a string subscript. The
//! classification is encoded in the id itself and fixed at interning time,
//! so classifying a key never needs the interning tables.

use std::fmt;

/// Interned subscript identifier.
///
/// Layout of the 64-bit id:
/// - `0`: the wildcard key
/// - odd, up to [`Key::MAX_INT_ID`]: integer key, `(value as u32) * 2 + 1`
/// - even, `2..=`[`Key::MAX_STRING_ID`]: string key, `index * 2 + 2`
///
/// Keys order by id, which gives structured types a deterministic child order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Key(u64);

/// Classification of a [`Key`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum KeyKind {
    /// The wildcard: every subscript not tracked explicitly.
    Any,
    /// Integer subscript with its decoded value.
    Int(i32),
    /// String subscript. The text lives in the interner's name table.
    String,
}

/// A raw subscript as written in source, before interning.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Subscript<'a> {
    /// `$a[]` / iteration: no specific subscript.
    Any,
    /// Integer literal subscript.
    Int(i32),
    /// String literal subscript.
    Str(&'a str),
}

impl Key {
    /// The wildcard key. Never interned.
    pub const ANY: Key = Key(0);

    /// Largest id an integer key can take.
    pub const MAX_INT_ID: u64 = (u32::MAX as u64) * 2 + 1;

    /// Largest id a string key can take.
    pub const MAX_STRING_ID: u64 = (u32::MAX as u64) * 2 + 2;

    /// Create a key from a raw id.
    ///
    /// The id is not validated; ids outside the classified ranges render
    /// as an invariant violation.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Key(raw)
    }

    /// Get the raw id.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Encode an integer subscript.
    #[inline]
    #[expect(
        clippy::cast_sign_loss,
        reason = "reinterpreting the bits keeps the encoding bijective over i32"
    )]
    pub(crate) const fn for_int(value: i32) -> Self {
        Key((value as u32 as u64) * 2 + 1)
    }

    /// Encode the `index`-th interned string.
    #[inline]
    pub(crate) const fn for_string_index(index: u32) -> Self {
        Key(index as u64 * 2 + 2)
    }

    #[inline]
    pub const fn is_any_key(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_int_key(self) -> bool {
        self.0 % 2 == 1 && self.0 <= Self::MAX_INT_ID
    }

    #[inline]
    pub const fn is_string_key(self) -> bool {
        self.0 != 0 && self.0 % 2 == 0 && self.0 <= Self::MAX_STRING_ID
    }

    /// Decode an integer key back to its subscript value.
    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "integer key ids are built from a u32 bit pattern"
    )]
    pub const fn int_value(self) -> Option<i32> {
        if self.is_int_key() {
            Some(((self.0 - 1) / 2) as u32 as i32)
        } else {
            None
        }
    }

    /// Classify this key, or `None` for an id outside every range.
    #[inline]
    pub const fn kind(self) -> Option<KeyKind> {
        if self.is_any_key() {
            Some(KeyKind::Any)
        } else if let Some(value) = self.int_value() {
            Some(KeyKind::Int(value))
        } else if self.is_string_key() {
            Some(KeyKind::String)
        } else {
            None
        }
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::ANY
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(KeyKind::Any) => write!(f, "Key::ANY"),
            Some(KeyKind::Int(value)) => write!(f, "Key(int {value})"),
            Some(KeyKind::String) => write!(f, "Key(str #{})", self.0),
            None => write!(f, "Key(invalid {})", self.0),
        }
    }
}

/// Renders through the process-wide interner.
///
/// # Panics
/// Panics on an unclassified id or a string key not interned by the
/// process-wide interner.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::keys().render(*self))
    }
}

// Keys are stored inline in every child edge.
crate::static_assert_size!(Key, 8);

#[cfg(test)]
mod tests;
