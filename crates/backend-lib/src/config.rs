// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: a TOML file first, then environment
//! variables prefixed `MEDIKA_` (`__` separates nested keys, e.g.
//! `MEDIKA_JWT__SECRET`). The `jwt` section has no defaults: a missing secret
//! or lifetime is a startup error, never a silent zero.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MEDIKA_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration failures, all fatal at startup
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        SettingsError::Load(Box::new(err))
    }
}

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Flat-file user store location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
        }
    }
}

/// Session store connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub url: String,
    /// Connection-establishment timeout
    pub connect_timeout_secs: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Token signing settings. Every field is required.
#[derive(Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl JwtSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Super admin created at startup when missing
#[derive(Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Load settings from `config.toml` in the working directory plus the environment
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from("config.toml")
    }

    /// Load settings from `path` plus the environment, then validate them
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let figment = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Extract and validate settings from an already layered figment
    pub fn from_figment(figment: Figment) -> Result<Self, SettingsError> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would only fail later, at request time
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(SettingsError::Invalid("jwt.secret must not be empty".into()));
        }
        if self.jwt.access_ttl_secs == 0 {
            return Err(SettingsError::Invalid("jwt.access_ttl_secs must be positive".into()));
        }
        if self.jwt.refresh_ttl_secs == 0 {
            return Err(SettingsError::Invalid("jwt.refresh_ttl_secs must be positive".into()));
        }
        if self.redis.connect_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "redis.connect_timeout_secs must be positive".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
            return Err(SettingsError::Invalid(format!(
                "log.level must be one of {LOG_LEVELS:?}, got {:?}",
                self.log.level
            )));
        }
        self.server.host.parse::<IpAddr>().map_err(|_| {
            SettingsError::Invalid(format!("server.host is not an IP address: {}", self.server.host))
        })?;
        Ok(())
    }

    /// Socket address the HTTP server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let ip: IpAddr = self.server.host.parse().map_err(|_| {
            SettingsError::Invalid(format!("server.host is not an IP address: {}", self.server.host))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

#[cfg(test)]
mod config_tests;
