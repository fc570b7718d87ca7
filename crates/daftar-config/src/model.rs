use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use daftar_domain::{normalize_currency, DisplayRate};

use crate::ConfigError;

pub const ENV_HOME: &str = "DAFTAR_HOME";
pub const ENV_PORT: &str = "DAFTAR_PORT";
pub const ENV_BIND: &str = "DAFTAR_BIND";

/// Server, storage, and display preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Currency new books and accounts are kept in.
    #[serde(default = "Config::default_base_currency")]
    pub base_currency: String,
    #[serde(default = "Config::default_display_currency")]
    pub display_currency: String,
    /// Units of `display_currency` per unit of an account's currency.
    #[serde(default = "Config::default_display_rate")]
    pub display_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Root for books and backups. Defaults to `~/.daftar`.
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_bind_address")]
    pub bind_address: String,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: Self::default_base_currency(),
            display_currency: Self::default_display_currency(),
            display_rate: Self::default_display_rate(),
            data_dir: None,
            bind_address: Self::default_bind_address(),
            port: Self::default_port(),
            backup_retention: Self::default_backup_retention(),
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_base_currency() -> String {
        "USD".into()
    }

    pub fn default_display_currency() -> String {
        "SAR".into()
    }

    pub fn default_display_rate() -> Decimal {
        Decimal::new(375, 2)
    }

    pub fn default_bind_address() -> String {
        "127.0.0.1".into()
    }

    pub fn default_port() -> u16 {
        8000
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".daftar")
    }

    pub fn display_rate(&self) -> DisplayRate {
        DisplayRate::new(normalize_currency(&self.display_currency), self.display_rate)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "bind_address".into(),
            reason: format!("`{}` is not an IP address", self.bind_address),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if normalize_currency(&self.base_currency).is_empty() {
            return Err(ConfigError::Invalid {
                key: "base_currency".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.display_rate <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "display_rate".into(),
                reason: "must be greater than zero".into(),
            });
        }
        self.socket_addr().map(|_| ())
    }

    /// Applies `DAFTAR_HOME`, `DAFTAR_PORT` and `DAFTAR_BIND` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(home) = lookup(ENV_HOME).filter(|value| !value.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(home.trim()));
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_PORT.into(),
                reason: format!("`{port}` is not a port number"),
            })?;
        }
        if let Some(bind) = lookup(ENV_BIND).filter(|value| !value.trim().is_empty()) {
            self.bind_address = bind.trim().to_string();
        }
        Ok(())
    }
}
