//! Daftar keeps running-balance ledgers for customers, partner companies,
//! travelers and per-currency cashboxes, and serves them over a JSON API.

pub mod api;
pub mod errors;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
///
/// `log_filter` replaces the default `EnvFilter` directives when given.
pub fn init(log_filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(log_filter);
        tracing::info!("Daftar tracing initialized.");
    });
}
