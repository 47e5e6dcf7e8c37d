//! Monotonic node flags.
//!
//! Every flag only ever goes from unset to set. Clearing a set flag is a
//! caller bug and fails fast; see `TypeTree::set_flags`.

use bitflags::bitflags;

bitflags! {
    /// Per-node flags.
    ///
    /// `WRITE` and `READ` record how the location was used and are never
    /// joined by a merge. `NULLABLE` and `ERROR` are part of the lattice
    /// value.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u8 {
        /// The node was materialized or written through a write path.
        const WRITE = 1 << 0;
        /// The node was observed through a read path.
        const READ = 1 << 1;
        /// The value may also be `false`.
        const NULLABLE = 1 << 2;
        /// Inference reported an error at or below this node.
        const ERROR = 1 << 3;
    }
}

impl TypeFlags {
    /// Flags that belong to the lattice value and take part in merges.
    pub const LATTICE_MASK: Self = Self::NULLABLE.union(Self::ERROR);

    /// Flags that record how the location was used.
    pub const USAGE_MASK: Self = Self::WRITE.union(Self::READ);

    /// The lattice part of this flag set.
    #[inline]
    pub const fn lattice(self) -> Self {
        self.intersection(Self::LATTICE_MASK)
    }

    /// Flags set in `self` that `next` would drop.
    #[inline]
    pub const fn cleared_by(self, next: Self) -> Self {
        self.difference(next)
    }
}

#[cfg(test)]
mod tests;
