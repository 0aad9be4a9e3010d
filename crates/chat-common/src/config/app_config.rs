//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    /// `None` selects the in-process message store
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub relay: RelayConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }

    /// Read `APP_ENV`, falling back to development
    #[must_use]
    pub fn from_env() -> Self {
        env::var("APP_ENV")
            .ok()
            .and_then(|s| Self::parse(&s))
            .unwrap_or_default()
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Hub and session tuning
///
/// Durations are whole seconds on the wire of the environment, exposed as
/// [`Duration`] through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Capacity of each session's outbox
    pub outbox_capacity: usize,
    /// Capacity of the hub's inbound queue
    pub inbound_capacity: usize,
    /// Messages replayed when a session joins a channel
    pub history_limit: usize,
    pub ping_interval_secs: u64,
    pub pong_wait_secs: u64,
    pub write_wait_secs: u64,
    pub store_timeout_secs: u64,
    /// Largest accepted inbound frame
    pub max_message_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 256,
            inbound_capacity: 1024,
            history_limit: 50,
            ping_interval_secs: 54,
            pong_wait_secs: 60,
            write_wait_secs: 10,
            store_timeout_secs: 5,
            max_message_bytes: 4096,
        }
    }
}

impl RelayConfig {
    /// Upper bound for every timing knob
    pub const MAX_WAIT_SECS: u64 = 24 * 60 * 60;

    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    #[must_use]
    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }

    #[must_use]
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_secs)
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Check the relations between the knobs
    ///
    /// # Errors
    /// Returns an error if a capacity or the frame limit is zero, a wait is
    /// zero or above [`MAX_WAIT_SECS`](Self::MAX_WAIT_SECS), or the keepalive
    /// probe would fire after the read deadline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "RELAY_MAX_MESSAGE_BYTES",
                "must be greater than zero".to_string(),
            ));
        }
        for (name, secs) in [
            ("RELAY_PONG_WAIT_SECS", self.pong_wait_secs),
            ("RELAY_WRITE_WAIT_SECS", self.write_wait_secs),
            ("RELAY_STORE_TIMEOUT_SECS", self.store_timeout_secs),
        ] {
            if secs == 0 || secs > Self::MAX_WAIT_SECS {
                return Err(ConfigError::InvalidValue(
                    name,
                    format!("{secs} must be between 1 and {}", Self::MAX_WAIT_SECS),
                ));
            }
        }
        if self.outbox_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "RELAY_OUTBOX_CAPACITY",
                "must be greater than zero".to_string(),
            ));
        }
        if self.inbound_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "RELAY_INBOUND_CAPACITY",
                "must be greater than zero".to_string(),
            ));
        }
        if self.ping_interval_secs == 0 || self.ping_interval_secs >= self.pong_wait_secs {
            return Err(ConfigError::InvalidValue(
                "RELAY_PING_INTERVAL_SECS",
                format!(
                    "{} must be positive and below RELAY_PONG_WAIT_SECS ({})",
                    self.ping_interval_secs, self.pong_wait_secs
                ),
            ));
        }
        Ok(())
    }

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            outbox_capacity: parse_var("RELAY_OUTBOX_CAPACITY", defaults.outbox_capacity)?,
            inbound_capacity: parse_var("RELAY_INBOUND_CAPACITY", defaults.inbound_capacity)?,
            history_limit: parse_var("RELAY_HISTORY_LIMIT", defaults.history_limit)?,
            ping_interval_secs: parse_var("RELAY_PING_INTERVAL_SECS", defaults.ping_interval_secs)?,
            pong_wait_secs: parse_var("RELAY_PONG_WAIT_SECS", defaults.pong_wait_secs)?,
            write_wait_secs: parse_var("RELAY_WRITE_WAIT_SECS", defaults.write_wait_secs)?,
            store_timeout_secs: parse_var("RELAY_STORE_TIMEOUT_SECS", defaults.store_timeout_secs)?,
            max_message_bytes: parse_var("RELAY_MAX_MESSAGE_BYTES", defaults.max_message_bytes)?,
        };
        config.validate()?;
        Ok(config)
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-relay".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    25
}

fn default_min_connections() -> u32 {
    5
}

/// Parse an optional variable, keeping the default when it is absent
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS", default_min_connections())?,
            }),
            _ => None,
        };

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: Environment::from_env(),
            },
            server: ServerConfig {
                host: env::var("RELAY_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("RELAY_PORT", default_port())?,
            },
            database,
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .ok_or(ConfigError::MissingVar("JWT_SECRET"))?,
            },
            relay: RelayConfig::from_env()?,
        })
    }

    /// Build a configuration for tests and local tooling
    ///
    /// Binds to an ephemeral localhost port and uses the in-process store.
    #[must_use]
    pub fn local(jwt_secret: impl Into<String>) -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: None,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
            },
            relay: RelayConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
