/// Diagnostic logging to stderr
///
/// The terminal display owns stdout, so log lines always go to stderr.
/// Filter comes from `KALSHI_LOG`, then `RUST_LOG`, then `warn`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "KALSHI_LOG";
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directives from the environment
pub fn filter_directives() -> String {
    [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber. A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_new(filter_directives()).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::warn!("telemetry test");
    }

    #[test]
    fn test_filter_directives_is_never_empty() {
        assert!(!filter_directives().is_empty());
    }
}
