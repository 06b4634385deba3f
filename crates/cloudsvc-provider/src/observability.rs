//! Tracing setup for binaries built on the provider.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a stderr `fmt` subscriber filtered at `level`.
///
/// `RUST_LOG` wins over `level` when it holds a valid directive. Calling this
/// twice is harmless; the first subscriber stays installed.
pub fn init_tracing_with_level(level: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::registry()
        .with(filter_from(rust_log.as_deref(), level))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn filter_from(rust_log: Option<&str>, level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_configured_level() {
        assert_eq!(filter_from(None, "debug").to_string(), "debug");
        assert_eq!(
            filter_from(Some("cloudsvc_provider=trace"), "debug").to_string(),
            "cloudsvc_provider=trace"
        );
        assert_eq!(filter_from(Some("cloudsvc=loud"), "warn").to_string(), "warn");
        assert_eq!(filter_from(None, "cloudsvc=loud").to_string(), "info");
    }
}
