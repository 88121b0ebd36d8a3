//! Environment-driven configuration, grounded on the teacher's
//! `AppConfig::load()` (`config` crate + `dotenvy`, referenced from
//! `src/bin/server.rs`).

use serde::Deserialize;

const DEFAULT_TIMEZONE_FALLBACK: &str = "America/New_York";

/// The only knobs the design doc allows (§9): default timezone, data
/// directory for the SQLite store, and the HTTP bind address.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE_FALLBACK.to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CALPROXY")
                    .try_parsing(true)
                    .separator("_"),
            )
            .build()?;

        Ok(cfg.try_deserialize().unwrap_or_else(|_| AppConfig {
            default_timezone: default_timezone(),
            data_dir: default_data_dir(),
            server_host: default_host(),
            server_port: default_port(),
        }))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_timezone: default_timezone(),
            data_dir: default_data_dir(),
            server_host: default_host(),
            server_port: default_port(),
        }
    }
}
