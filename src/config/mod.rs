//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default respawn delay after a death
pub const DEFAULT_RESPAWN_DELAY_MS: u64 = 3000;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory holding the static client assets
    pub static_dir: PathBuf,
    /// Allowed client origins for CORS (empty = permissive)
    pub client_origins: Vec<String>,
    /// Arena rules
    pub arena: ArenaConfig,
}

/// Tunables for the authoritative arena
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Delay between a death and the matching respawn
    pub respawn_delay: Duration,
    /// Optional cap on inbound messages per connection per second
    pub input_rate_limit: Option<u32>,
    /// Seed for spawn and colour generation; `None` draws from entropy
    pub rng_seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            respawn_delay: Duration::from_millis(DEFAULT_RESPAWN_DELAY_MS),
            input_rate_limit: None,
            rng_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let client_origins = env::var("CLIENT_ORIGIN")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let respawn_delay_ms =
            parse_var::<u64>("RESPAWN_DELAY_MS")?.unwrap_or(DEFAULT_RESPAWN_DELAY_MS);

        let config = Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            client_origins,
            arena: ArenaConfig {
                respawn_delay: Duration::from_millis(respawn_delay_ms),
                input_rate_limit: parse_var("INPUT_RATE_LIMIT")?,
                rng_seed: parse_var("RNG_SEED")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the type system can't express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arena.respawn_delay.is_zero() {
            return Err(ConfigError::Validation(
                "RESPAWN_DELAY_MS must be greater than 0".to_string(),
            ));
        }
        if self.arena.input_rate_limit == Some(0) {
            return Err(ConfigError::Validation(
                "INPUT_RATE_LIMIT must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse an optional numeric variable. Unset is `None`, garbage is an error.
fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}
