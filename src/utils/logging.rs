//! Tracing setup and structured log helpers shared by the server and the
//! reload machinery.

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_startup(component: &str, status: &str, detail: Option<&str>) {
    match detail {
        Some(detail) => info!(component, status, detail, "startup"),
        None => info!(component, status, "startup"),
    }
}

pub fn log_reload(changed: &str, rules: usize) {
    info!(changed, rules, "Mock config reloaded");
}
