//! Configuration loading and management
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `appsettings.yaml` in the configuration directory (optional)
//! 3. `appsettings.{environment}.yaml` in the same directory (optional)
//! 4. `APP_JWT_KEY` / `APP_DATABASE_URL` environment variables

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;

/// Environment variable holding the environment name
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

const BASE_FILE: &str = "appsettings.yaml";

/// Hosting environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
    Custom(String),
}

impl Environment {
    /// Parse an environment name, case-insensitively for the known ones
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Environment::Local,
            "development" | "dev" => Environment::Development,
            "staging" => Environment::Staging,
            "production" | "prod" | "" => Environment::Production,
            _ => Environment::Custom(name.trim().to_string()),
        }
    }

    /// Read the environment from `APP_ENVIRONMENT`, defaulting to production
    pub fn from_env() -> Self {
        std::env::var(ENVIRONMENT_VAR)
            .map(|name| Self::parse(&name))
            .unwrap_or(Environment::Production)
    }

    pub fn name(&self) -> &str {
        match self {
            Environment::Local => "Local",
            Environment::Development => "Development",
            Environment::Staging => "Staging",
            Environment::Production => "Production",
            Environment::Custom(name) => name,
        }
    }

    /// Environment name with the first letter of each word upper-cased
    ///
    /// Words that are entirely upper case (acronyms) are kept as they are.
    pub fn title_case(&self) -> String {
        self.name()
            .split_whitespace()
            .map(|word| {
                if word.chars().any(char::is_alphabetic)
                    && !word.chars().any(char::is_lowercase)
                {
                    return word.to_string();
                }
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind, e.g. `0.0.0.0:8080`
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// JWT bearer validation parameters
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    /// Symmetric signing key (HMAC-SHA256)
    pub key: String,
    /// Leeway applied to `exp`/`nbf`, in seconds
    pub clock_skew_secs: u64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            issuer: "articles-api".to_string(),
            audience: "articles-api".to_string(),
            key: String::new(),
            clock_skew_secs: 300,
        }
    }
}

// The key never ends up in logs.
impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("key", &"<redacted>")
            .field("clock_skew_secs", &self.clock_skew_secs)
            .finish()
    }
}

/// CORS allow-list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:4200".to_string(),
                "https://localhost:3000".to_string(),
            ],
        }
    }
}

/// Log sinks and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub filter: String,
    /// Directory of the daily rolling log files; `None` disables the file sink
    pub directory: Option<String>,
    /// File name prefix of the rolling log files
    pub file_prefix: String,
    /// Requests slower than this are logged as warnings
    pub slow_request_threshold_ms: u64,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: Some("logs".to_string()),
            file_prefix: "log-".to_string(),
            slow_request_threshold_ms: 3000,
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection URL; when absent the in-memory store is used
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    pub cors: CorsSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
}

impl AppConfig {
    /// Load the layered configuration from `dir` for `environment`
    ///
    /// Missing files are skipped; unreadable or malformed files are errors.
    pub fn load(dir: impl AsRef<Path>, environment: &Environment) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let env_file = format!("appsettings.{}.yaml", environment.name());

        let mut merged = Value::Mapping(Mapping::new());
        for file in [BASE_FILE, env_file.as_str()] {
            if let Some(layer) = read_layer(&dir.join(file))? {
                merge_values(&mut merged, layer);
            }
        }

        let mut config: Self =
            serde_yaml::from_value(merged).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: "<string>".to_string(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("APP_JWT_KEY") {
            self.jwt.key = key;
        }
        if let Ok(url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = Some(url);
        }
    }
}

fn read_layer(path: &Path) -> Result<Option<Value>, ConfigError> {
    if !path.exists() {
        tracing::debug!("Configuration file {} not found, skipping", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    // An empty file parses as null.
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(value))
}

/// Recursively overlay `overlay` onto `base`; mappings merge, everything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
