//! # Server Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults          AppConfig::default()                              │
//! │  2. TOML file         $FACTURO_CONFIG or ./facturo.toml (if present)     │
//! │  3. Environment       FACTURO_* variables                               │
//! │  4. validate()        reject unusable values before binding             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example facturo.toml
//! ```toml
//! [server]
//! port = 9000
//!
//! [database]
//! path = "/var/lib/facturo/facturo.db"
//!
//! [auth]
//! admin_email = "owner@example.com"
//! session_secret = "change-me"
//!
//! [invoices]
//! default_tax_bps = 1900
//! due_days = 30
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use facturo_core::invoice::InvoiceDefaults;
use facturo_core::TaxRate;

const DEFAULT_CONFIG_FILE: &str = "facturo.toml";

/// Used when no secret is configured. Fine for local development only.
pub const DEV_SESSION_SECRET: &str = "facturo-dev-secret-change-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub invoices: InvoiceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./facturo.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Account that is always treated as admin. `None` disables the override.
    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default = "default_session_secret")]
    pub session_secret: String,

    /// Lifetime of both the token and the cookie.
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: i64,

    /// Adds `Secure` to the session cookie. Turn off for plain-http local dev.
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

fn default_session_secret() -> String {
    DEV_SESSION_SECRET.to_string()
}

fn default_session_lifetime() -> i64 {
    // 5 days
    60 * 60 * 24 * 5
}

fn default_true() -> bool {
    true
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            admin_email: None,
            session_secret: default_session_secret(),
            session_lifetime_secs: default_session_lifetime(),
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSettings {
    /// Applied when a request omits `taxRate`.
    #[serde(default = "default_tax_bps")]
    pub default_tax_bps: u32,

    /// Days from issue to due date when a request omits `dueDate`.
    #[serde(default = "default_due_days")]
    pub due_days: u32,
}

fn default_tax_bps() -> u32 {
    1900
}

fn default_due_days() -> u32 {
    30
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        InvoiceSettings {
            default_tax_bps: default_tax_bps(),
            due_days: default_due_days(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `FACTURO_*` environment variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        if config.auth.session_secret == DEV_SESSION_SECRET {
            warn!("FACTURO_SESSION_SECRET not set; using the development secret");
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    fn default_config_path() -> Option<PathBuf> {
        match std::env::var("FACTURO_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Applies `FACTURO_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored; the previous layer stays.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("FACTURO_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = parse_var(&lookup, "FACTURO_PORT") {
            debug!(port, "Overriding port from environment");
            self.server.port = port;
        }
        if let Some(path) = lookup("FACTURO_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = parse_var(&lookup, "FACTURO_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }
        if let Some(email) = lookup("FACTURO_ADMIN_EMAIL") {
            let email = email.trim().to_string();
            self.auth.admin_email = (!email.is_empty()).then_some(email);
        }
        if let Some(secret) = lookup("FACTURO_SESSION_SECRET") {
            self.auth.session_secret = secret;
        }
        if let Some(secs) = parse_var(&lookup, "FACTURO_SESSION_LIFETIME_SECS") {
            self.auth.session_lifetime_secs = secs;
        }
        if let Some(secure) = parse_var(&lookup, "FACTURO_SECURE_COOKIES") {
            self.auth.secure_cookies = secure;
        }
        if let Some(bps) = parse_var(&lookup, "FACTURO_DEFAULT_TAX_BPS") {
            self.invoices.default_tax_bps = bps;
        }
        if let Some(days) = parse_var(&lookup, "FACTURO_INVOICE_DUE_DAYS") {
            self.invoices.due_days = days;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.auth.session_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("session_secret must not be empty".into()));
        }

        if self.auth.session_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "session_lifetime_secs must be positive".into(),
            ));
        }

        if self.invoices.default_tax_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "default_tax_bps must be at most 10000, got {}",
                self.invoices.default_tax_bps
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.bind_addr, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bad bind address: {e}")))
    }

    pub fn invoice_defaults(&self) -> InvoiceDefaults {
        InvoiceDefaults {
            tax_rate: TaxRate::from_bps(self.invoices.default_tax_bps),
            due_days: self.invoices.due_days,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}
