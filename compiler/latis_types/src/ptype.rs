//! Primitive type classification and its join.
//!
//! The kinds form a small lattice:
//!
//! ```text
//!                      Error
//!                        |
//!                      Mixed
//!        /      /     /  |  \      \       \
//!     Bool  Float String Array Tuple Shape Class Void
//!       |     |
//!       |    Int
//!        \    |   (every concrete kind sits above False)
//!          False
//!            |
//!          Null
//!            |
//!         Unknown
//! ```
//!
//! `Unknown` means "no information yet" and is the identity of the join.

use std::fmt;

/// Primitive classification of a type node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PrimitiveType {
    /// No information (bottom).
    #[default]
    Unknown = 0,
    /// The `null` literal.
    Null = 1,
    /// The `false` literal.
    False = 2,
    Bool = 3,
    Int = 4,
    Float = 5,
    String = 6,
    /// Keyed collection; homogeneous elements live under the any-key child.
    Array = 7,
    /// Fixed-arity collection indexed by integer keys.
    Tuple = 8,
    /// Record indexed by string keys.
    Shape = 9,
    /// Class instance; the identity is carried separately.
    Class = 10,
    /// Any runtime value.
    Mixed = 11,
    Void = 12,
    /// Inference failed here (top).
    Error = 13,
}

impl PrimitiveType {
    /// Every kind, in declaration order.
    pub const ALL: [PrimitiveType; 14] = [
        PrimitiveType::Unknown,
        PrimitiveType::Null,
        PrimitiveType::False,
        PrimitiveType::Bool,
        PrimitiveType::Int,
        PrimitiveType::Float,
        PrimitiveType::String,
        PrimitiveType::Array,
        PrimitiveType::Tuple,
        PrimitiveType::Shape,
        PrimitiveType::Class,
        PrimitiveType::Mixed,
        PrimitiveType::Void,
        PrimitiveType::Error,
    ];

    /// Source-level name used in rendered types.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Unknown => "Unknown",
            PrimitiveType::Null => "null",
            PrimitiveType::False => "false",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::String => "string",
            PrimitiveType::Array => "array",
            PrimitiveType::Tuple => "tuple",
            PrimitiveType::Shape => "shape",
            PrimitiveType::Class => "object",
            PrimitiveType::Mixed => "mixed",
            PrimitiveType::Void => "void",
            PrimitiveType::Error => "<error>",
        }
    }

    /// Least upper bound of two kinds.
    ///
    /// Commutative, associative and idempotent; `Unknown` is the identity.
    pub fn join(self, other: PrimitiveType) -> PrimitiveType {
        use PrimitiveType::{Bool, Error, False, Float, Int, Mixed, Null, Unknown};

        if self == other {
            return self;
        }
        match (self, other) {
            (Unknown, t) | (t, Unknown) => t,
            (Error, _) | (_, Error) => Error,
            (Mixed, _) | (_, Mixed) => Mixed,
            (Null, t) | (t, Null) => t,
            (False, Bool) | (Bool, False) => Bool,
            (False, t) | (t, False) => t,
            (Int, Float) | (Float, Int) => Float,
            _ => Mixed,
        }
    }

    /// `null`, `false` or `bool`: the kinds at or below `bool`. A nullish
    /// value joined into one of them needs no nullable flag.
    #[inline]
    pub const fn is_boolish(self) -> bool {
        matches!(
            self,
            PrimitiveType::Null | PrimitiveType::False | PrimitiveType::Bool
        )
    }

    /// Whether joining a side of kind `self` into `joined` turns that side's
    /// `null`/`false` values into the nullable flag.
    ///
    /// True exactly when a boolish side is widened to a kind
    /// that does not. Once a join leaves that group it never returns, so the
    /// flag ends up set iff some input is boolish and the final kind
    /// does not, whatever order the joins happen in.
    #[inline]
    pub const fn absorbed_into(self, joined: PrimitiveType) -> bool {
        self.is_boolish() && !joined.is_boolish()
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
