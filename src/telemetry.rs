//! Structured logging setup for binaries embedding the engine.
//!
//! Library code only emits `tracing` events and spans. Installing a
//! subscriber is left to the process entry point through [`init_tracing`].

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter directive could not be parsed.
    #[error("invalid log directive '{directive}': {source}")]
    InvalidDirective {
        /// Directive that failed to parse.
        directive: String,
        /// Underlying parse failure.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs a formatted subscriber filtered by `RUST_LOG`.
///
/// `default_directive` applies when `RUST_LOG` is unset or unparsable.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidDirective`] when the fallback directive
/// is malformed, or [`TelemetryError::Install`] when a subscriber is
/// already set.
pub fn init_tracing(default_directive: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(default_directive).map_err(|source| {
            TelemetryError::InvalidDirective {
                directive: default_directive.to_owned(),
                source,
            }
        })?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}

