//! Process-wide tracing setup.
//!
//! Stream lifecycle events are the signal here; the orchestrator logs at
//! info while its chatty dependencies are capped at warn unless `RUST_LOG`
//! says otherwise.

use tracing_subscriber::{fmt, EnvFilter};

/// Dependencies whose info-level output drowns out lifecycle logs.
const QUIET_DEPS: &[&str] = &["redis", "actix_http", "actix_server", "mio"];

fn default_directives() -> String {
    let mut directives = vec!["info".to_string()];
    directives.extend(QUIET_DEPS.iter().map(|dep| format!("{dep}=warn")));
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` wins when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives()));

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
