pub mod metrics;
pub mod state;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber for hosts that have not set their own.
/// `RUST_LOG` controls filtering, defaulting to `info`. A second call (or
/// a host-installed subscriber) wins; this never panics.
pub async fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let collector = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    let _ = tracing::subscriber::set_global_default(collector);
}
