use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "daftar=info,daftar_core=info,tower_http=info";

/// Installs the global `fmt` subscriber.
///
/// Directives come from `directive`, then `RUST_LOG`, then [`DEFAULT_LOG_FILTER`].
/// A subscriber installed elsewhere (e.g. by a test harness) is left in place.
pub fn init_tracing(directive: Option<&str>) {
    let filter = directive
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = fmt().with_env_filter(filter).try_init();
}
