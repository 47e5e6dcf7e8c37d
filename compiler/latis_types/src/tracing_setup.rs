//! Tracing subscriber setup.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber for the lattice's diagnostics.
///
/// Call this once at startup; later calls are no-ops. Nothing is installed
/// unless `RUST_LOG` is set, e.g. `RUST_LOG=latis_types=debug` to see
/// generation advances and error propagation, or `RUST_LOG=latis_ir=trace`
/// to see every newly interned key.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
