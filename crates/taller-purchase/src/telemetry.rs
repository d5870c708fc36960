//! # Telemetry
//!
//! Structured logging setup.

use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,taller=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=taller=trace` - Trace the taller crates only
/// - Default: `info,taller=debug,sqlx=warn`
///
/// Logs go to stderr so stdout stays free for the JSON protocol.
///
/// Call once at startup.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    subscriber(filter).init();
}

fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_filter_governs_levels() {
        let subscriber = subscriber(EnvFilter::new(DEFAULT_FILTER));

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "taller_purchase::session", Level::DEBUG));
            assert!(!tracing::enabled!(target: "taller_purchase::session", Level::TRACE));
            assert!(tracing::enabled!(target: "sqlx::query", Level::WARN));
            assert!(!tracing::enabled!(target: "sqlx::query", Level::INFO));
            assert!(!tracing::enabled!(target: "hyper::client", Level::DEBUG));
        });
    }

    #[test]
    fn test_explicit_filter_is_respected() {
        let subscriber = subscriber(EnvFilter::new("warn"));

        tracing::subscriber::with_default(subscriber, || {
            assert!(!tracing::enabled!(target: "taller_purchase::session", Level::INFO));
            assert!(tracing::enabled!(target: "taller_purchase::session", Level::WARN));
        });
    }
}
