// src/config.rs

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ISS_HOST: &str = "https://iss.moex.com";
pub const DEFAULT_BOARD: &str = "TQCB";
pub const DEFAULT_SECID: &str = "RU000A1097X8";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Scheme + host of the ISS service, without a trailing slash.
    pub iss_host: String,
    /// Trading board code embedded in the trades URL.
    pub board: String,
    /// Identifier pre-filled in the dashboard input.
    pub default_secid: String,
    /// Extra `EnvFilter` directive applied on top of `RUST_LOG`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            iss_host: DEFAULT_ISS_HOST.to_string(),
            board: DEFAULT_BOARD.to_string(),
            default_secid: DEFAULT_SECID.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);

        let iss_host = match lookup("ISS_HOST") {
            Some(host) => {
                Url::parse(&host).with_context(|| format!("parsing ISS_HOST {}", host))?;
                host.trim_end_matches('/').to_string()
            }
            None => defaults.iss_host,
        };

        Ok(Self {
            port,
            iss_host,
            board: lookup("ISS_BOARD").unwrap_or(defaults.board),
            default_secid: lookup("DEFAULT_SECID").unwrap_or(defaults.default_secid),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}
