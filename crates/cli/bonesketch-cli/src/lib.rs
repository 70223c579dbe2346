//! Shared plumbing for the bonesketch command line tools.

pub mod session;

use tracing_subscriber::EnvFilter;

/// Install the `fmt` subscriber. `RUST_LOG` overrides the default `info`
/// level; records from the `log` facade are forwarded.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a second call in the same process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
