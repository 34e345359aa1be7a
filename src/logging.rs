//! Tracing setup for binaries and tests embedding the dispatcher.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "PGP_DISPATCH_LOG";

/// Initialize tracing with the `PGP_DISPATCH_LOG` environment variable.
///
/// Defaults to "info" level if the variable is not set. Does nothing when a
/// global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
