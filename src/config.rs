//! Configuration management for ws-relay
//!
//! Layers built-in defaults, an optional `config.toml` and `WS_RELAY_*`
//! environment variables, in that order of precedence.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_PATH_PREFIX: &str = "/ws";

/// Wildcard entry in `allowed_origins` that admits every origin.
pub const ANY_ORIGIN: &str = "*";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the WebSocket listener binds to.
    /// Environment: WS_RELAY_BIND_ADDRESS
    pub bind_address: String,

    /// Listener port, `0` picks an ephemeral port.
    /// Environment: WS_RELAY_PORT
    pub port: u16,

    /// Path segment in front of the user id, e.g. `/ws` for `/ws/{user_id}`.
    /// Environment: WS_RELAY_PATH_PREFIX
    pub path_prefix: String,

    /// Origins allowed to open a connection, `*` admits all.
    /// Environment: WS_RELAY_ALLOWED_ORIGINS (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            allowed_origins: vec![ANY_ORIGIN.to_string()],
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, `config.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration using `path` (without extension) as the optional file source
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("path_prefix", DEFAULT_PATH_PREFIX)?
            .set_default("allowed_origins", vec![ANY_ORIGIN])?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("WS_RELAY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if !self.path_prefix.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "path_prefix must start with '/': {:?}",
                self.path_prefix
            )));
        }

        // "/" alone would leave an empty prefix and a doubled slash in the route
        if self.path_prefix.ends_with('/') {
            return Err(ConfigError::Message(format!(
                "path_prefix must not end with '/': {:?}",
                self.path_prefix
            )));
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::Message(
                "allowed_origins must list at least one origin (use \"*\" for any)".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Whether every origin is admitted
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == ANY_ORIGIN)
    }
}
