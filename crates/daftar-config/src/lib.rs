//! daftar-config
//!
//! Server and display preferences persisted as JSON, with environment
//! overrides applied on top.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::Config;
