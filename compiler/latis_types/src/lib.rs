//! Latis Types - the structural type lattice
//!
//! This crate holds the inferred type of every analyzable location as a tree
//! of lattice nodes:
//! - `PrimitiveType`: the kind of one node, with its join
//! - `TypeFlags`: monotonic usage and lattice flags
//! - `TypeTree` / `NodeId`: arena-backed nodes, read and write paths, merge
//! - `SharedTypeTree`: a tree merged into by many workers
//! - the generation clock used to detect change between fixed-point passes
//!
//! # Monotonicity
//!
//! Every mutation only moves a node up the lattice: kinds widen, flags are
//! set and never cleared, children are added and never removed. Together
//! with an order-independent merge this is what lets parallel workers reach
//! the same fixed point however their merges interleave.
//!
//! # Tracing
//!
//! Call [`init_tracing`] once and set `RUST_LOG` to see diagnostics.

mod class;
mod error;
mod flags;
mod format;
mod generation;
mod merge;
mod order;
mod ptype;
mod shared;
mod stack;
mod tracing_setup;
mod tree;

pub use class::{ClassHierarchy, ClassId, ClassTable, FlatHierarchy};
pub use error::InvariantViolation;
pub use flags::TypeFlags;
pub use generation::{
    advance_generation, current_generation, global_generation, reconcile_generation,
    refresh_generation, Generation,
};
pub use latis_ir::{Key, MultiKey};
pub use ptype::PrimitiveType;
pub use shared::SharedTypeTree;
pub use tracing_setup::init_tracing;
pub use tree::{NodeId, TypeNode, TypeTree, MAX_ARRAY_DEPTH};

latis_ir::static_assert_size!(NodeId, 4);
latis_ir::static_assert_size!(PrimitiveType, 1);
latis_ir::static_assert_size!(TypeFlags, 1);
