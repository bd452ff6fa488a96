use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatted tracing subscriber honoring `RUST_LOG`, falling back
/// to the supplied level. Intended for embedding binaries and test harnesses;
/// the library itself only emits spans and events.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = fmt().with_env_filter(filter).try_init();
}
