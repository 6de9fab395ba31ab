//! tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "STOCKWISE_LOG";

/// Fallback when neither the environment nor config set a filter
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global fmt subscriber, writing to stderr
///
/// `STOCKWISE_LOG` wins over `directive`, which wins over the default.
/// Calling it twice is harmless; the second call is ignored.
pub fn init(directive: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .ok()
        .or_else(|| directive.and_then(|d| EnvFilter::try_new(d).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
