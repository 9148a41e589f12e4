//! Logging setup.
//!
//! Diagnostics go through `tracing`. The binary installs a fmt subscriber on
//! stderr so that stdout stays reserved for command output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable consulted by the CLI for the log filter.
pub const LOG_ENV: &str = "RDLC_LOG";

/// Check that `directive` is a valid `EnvFilter` directive.
pub fn validate_filter(directive: &str) -> Result<(), String> {
    EnvFilter::try_new(directive)
        .map(|_| ())
        .map_err(|e| format!("invalid log level '{}': {}", directive, e))
}

/// Build the filter for the given directive, falling back to `info`.
pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Calling this more than once is a no-op.
pub fn init(directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
