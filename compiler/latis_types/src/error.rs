//! Invariant violations of the type lattice.
//!
//! These are never data conditions: each one means a caller broke the
//! lattice's contract, so the offending operation panics instead of
//! returning. Missing information is not an error; it is
//! `NodeId::UNKNOWN` / `PrimitiveType::Unknown`.

use crate::{NodeId, TypeFlags};

/// A broken lattice invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A monotonic flag would have been cleared.
    #[error("it is forbidden to clear flags {flags:?} on node {node:?}")]
    ClearedFlag { node: NodeId, flags: TypeFlags },
    /// A write path was handed the canonical "no information" node.
    #[error("cannot write through the canonical unknown node")]
    WriteThroughUnknown,
    /// A handle from another tree (or a stale one) was used.
    #[error("node {node:?} does not belong to this tree of {len} nodes")]
    ForeignNode { node: NodeId, len: usize },
    /// The tree ran out of node indices.
    #[error("type tree exceeded {max} nodes")]
    TreeOverflow { max: usize },
}

impl InvariantViolation {
    /// Log the violation and abort the current operation.
    #[cold]
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        tracing::error!(violation = %self, "type lattice invariant violated");
        panic!("{self}")
    }
}
