//! Logging - tracing subscriber for binaries
//!
//! `RUST_LOG` takes precedence over the built-in level.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Install a compact stderr subscriber. `info` by default, `debug` when verbose.
pub fn init_logging(verbose: bool) -> Result<(), TryInitError> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish()
        .try_init()
}
