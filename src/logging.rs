//! Diagnostic logging to stderr.
//!
//! Reports meant for the operator go to stdout through the policy engine; the
//! events installed here are diagnostics (which `aws` calls ran, what was
//! created or deleted, which volumes failed).
//!
//! Filter precedence: `EBS_SNAPSHOT_LOG`, then `RUST_LOG`, then the level
//! implied by `-v`.

use std::{env, io};

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter,
    filter::ParseError,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

const LOG_ENV: &str = "EBS_SNAPSHOT_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Level used when neither environment variable is set.
pub const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.  Call once, early in `main`.
pub fn init_logging(verbosity: u8) -> Result<(), LoggingError> {
    let filter = build_filter(verbosity)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(())
}

fn build_filter(verbosity: u8) -> Result<EnvFilter, ParseError> {
    for var in [LOG_ENV, "RUST_LOG"] {
        if let Ok(spec) = env::var(var) {
            if !spec.trim().is_empty() {
                return EnvFilter::try_new(spec);
            }
        }
    }
    EnvFilter::try_new(level_for(verbosity))
}
