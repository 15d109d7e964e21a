//! Logging initialization module

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for local runs
    Development,
    /// JSON structured output for CI log collectors
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

/// Default filter when `RUST_LOG` is not set.
const DEVELOPMENT_FILTER: &str = "ifns_core=debug,ifns_cli=debug";
const PRODUCTION_FILTER: &str = "ifns_core=info,ifns_cli=info";

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at process start. Later calls are no-ops, whichever profile
/// they name.
///
/// # Example
///
/// ```
/// use ifns_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(DEVELOPMENT_FILTER)),
                )
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(PRODUCTION_FILTER)),
                )
                .init();
        }
        Profile::Test => {
            // Capture is installed separately via init_test_capture()
            tracing_subscriber::registry().init();
        }
    });
}
