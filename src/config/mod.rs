//! Configuration management.
//!
//! Values come from, in increasing priority: built-in defaults and the
//! well-known environment variables (`OURA_API_TOKEN`, `PORT`), an optional
//! TOML file, and `OURA_MCP_*` environment overrides. Command-line flags are
//! applied on top by the binary.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! token = "your-personal-access-token"
//! token_mode = "env"   # or "path"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [logging]
//! level = "info"
//! format = "text"      # or "json"
//! ```
//!
//! Nested keys can be overridden from the environment with a double
//! underscore, e.g. `OURA_MCP_SERVER__PORT=8080`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::TokenMode;
use crate::models::BearerToken;

/// Environment variable holding the process-wide bearer token
pub const TOKEN_ENV_VAR: &str = "OURA_API_TOKEN";

/// Environment variable holding the HTTP listen port
pub const PORT_ENV_VAR: &str = "PORT";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Personal access token (required in env token mode)
    #[serde(default = "default_token")]
    pub token: Option<String>,

    /// Where the bearer token comes from
    #[serde(default)]
    pub token_mode: TokenMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: default_token(),
            token_mode: TokenMode::default(),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_mode", &self.token_mode)
            .finish()
    }
}

fn default_token() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR).ok()
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    parse_port(std::env::var(PORT_ENV_VAR).ok().as_deref())
}

/// Parse a port value, falling back to [`DEFAULT_PORT`]
pub fn parse_port(value: Option<&str>) -> u16 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for this crate when `RUST_LOG` is unset
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub format: LogFormat,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("OURA_API_TOKEN is not set; a token is required unless the token travels in the resource URI (--token-in-path)")]
    MissingToken,
}

impl Config {
    /// The process-wide bearer token, if one is configured
    pub fn bearer_token(&self) -> Option<BearerToken> {
        self.api.token.clone().and_then(BearerToken::new)
    }

    /// The process-wide bearer token, required in env token mode
    pub fn require_token(&self) -> Result<BearerToken, ConfigError> {
        self.bearer_token().ok_or(ConfigError::MissingToken)
    }

    /// `host:port` for the HTTP transport
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load configuration from a file, with `OURA_MCP_*` overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    build_config(Some(path))
}

/// Load configuration without a file: defaults plus `OURA_MCP_*` overrides
pub fn get_config() -> Result<Config, ConfigError> {
    build_config(None)
}

fn build_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("OURA_MCP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Config>()?)
}

/// Find a configuration file in the default locations.
///
/// Looks for `./oura-mcp.toml`, then `<config dir>/oura-mcp/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("oura-mcp.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("oura-mcp").join("config.toml"))
        .filter(|path| path.is_file())
}
