//! Generation clock for incremental change detection.
//!
//! The analysis driver advances a process-wide counter once per fixed-point
//! iteration, after all workers have quiesced. Each worker thread keeps a
//! cached view of the counter and refreshes it explicitly at the start of an
//! iteration, so stamping a node never touches shared state.
//!
//! A node records the generation of the last pass that changed it. A
//! dependent that saw generation `g` only needs to re-derive its result if
//! the node's generation is now greater than `g`.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Pass number of the outer fixed-point loop.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Generation before the first pass.
    pub const INITIAL: Self = Self(0);

    #[inline]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

static GLOBAL: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CURRENT: Cell<Generation> = const { Cell::new(Generation::INITIAL) };
}

#[inline]
fn raise_view(generation: Generation) -> Generation {
    CURRENT.with(|current| {
        let raised = current.get().max(generation);
        current.set(raised);
        raised
    })
}

/// This thread's view of the generation counter.
#[inline]
pub fn current_generation() -> Generation {
    CURRENT.with(Cell::get)
}

/// The process-wide counter, bypassing the thread's cached view.
#[inline]
pub fn global_generation() -> Generation {
    Generation(GLOBAL.load(Ordering::Acquire))
}

/// Reload this thread's view from the process-wide counter.
///
/// Workers call this once at the start of each iteration. The view never
/// moves backwards.
pub fn refresh_generation() -> Generation {
    raise_view(global_generation())
}

/// Advance the process-wide counter and refresh this thread's view.
///
/// Only the driver calls this, between iterations, while no merge is in
/// flight.
pub fn advance_generation() -> Generation {
    let next = Generation(GLOBAL.fetch_add(1, Ordering::AcqRel) + 1);
    tracing::debug!(generation = next.raw(), "advanced generation");
    raise_view(next)
}

/// Merge a generation observed on another thread into this thread's view.
pub fn reconcile_generation(other: Generation) -> Generation {
    raise_view(other)
}

#[cfg(test)]
mod tests;
