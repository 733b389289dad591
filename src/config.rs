//! Configuration management.
//!
//! Settings come from an ordered list of [`ConfigSource`]s; the first source
//! that knows a key wins. The binary uses environment variables prefixed with
//! `OPSCOPE_`, then an optional JSON file named by `OPSCOPE_CONFIG`, then the
//! built-in defaults of [`AppConfig`].

use std::collections::HashMap;
use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Prefix for environment variables read by [`AppConfig::from_env`].
pub const ENV_PREFIX: &str = "OPSCOPE";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration key `{key}` must be {expected}")]
    InvalidType { key: String, expected: &'static str },
    #[error("configuration key `{key}` is out of range: {value}")]
    OutOfRange { key: String, value: i64 },
    #[error("invalid bind address {host}:{port}")]
    InvalidAddress { host: String, port: u16 },
}

/// A configuration value that can be various types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Get a configuration value by (lowercase) key
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// Short description used in logs
    fn name(&self) -> String;
}

/// Environment variable configuration source
///
/// Key `port` with prefix `OPSCOPE` reads `OPSCOPE_PORT`. Values are parsed
/// as integer, then float, then boolean, falling back to a string.
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        env::var(self.env_key(key)).ok().map(|value| {
            if let Ok(int_val) = value.parse::<i64>() {
                ConfigValue::Integer(int_val)
            } else if let Ok(float_val) = value.parse::<f64>() {
                ConfigValue::Float(float_val)
            } else if let Ok(bool_val) = value.parse::<bool>() {
                ConfigValue::Boolean(bool_val)
            } else {
                ConfigValue::String(value)
            }
        })
    }

    fn name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("env({}_*)", prefix.to_uppercase()),
            None => "env".to_string(),
        }
    }
}

/// JSON file configuration source
///
/// The file holds a flat object, e.g. `{"port": 8080, "eager_singletons": true}`.
#[derive(Debug)]
pub struct JsonConfigSource {
    path: PathBuf,
    values: HashMap<String, ConfigValue>,
}

impl JsonConfigSource {
    /// Reads and parses `path` once.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let values = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, values })
    }
}

impl ConfigSource for JsonConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }

    fn name(&self) -> String {
        format!("json({})", self.path.display())
    }
}

/// Configuration provider checking sources in priority order
#[derive(Debug, Default)]
pub struct ConfigProvider {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source (higher priority sources should be added first)
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) -> &mut Self {
        self.sources.push(source);
        self
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// String value, or `default` when absent. Numbers and booleans are
    /// rendered back to text.
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(ConfigValue::String(s)) => s,
            Some(ConfigValue::Integer(i)) => i.to_string(),
            Some(ConfigValue::Float(f)) => f.to_string(),
            Some(ConfigValue::Boolean(b)) => b.to_string(),
            None => default.to_string(),
        }
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.as_i64().ok_or_else(|| ConfigError::InvalidType {
                key: key.to_string(),
                expected: "an integer",
            }),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| ConfigError::InvalidType {
                key: key.to_string(),
                expected: "a boolean",
            }),
        }
    }
}

/// Settings for the `opscope` server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port to bind
    pub port: u16,
    /// Construct singletons at startup instead of on first request
    pub eager_singletons: bool,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            eager_singletons: false,
            log_filter: "info,opscope=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Builds the settings from `config`, falling back to defaults per key.
    pub fn load(config: &ConfigProvider) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = config.get_i64_or("port", i64::from(defaults.port))?;
        let port = u16::try_from(port).map_err(|_| ConfigError::OutOfRange {
            key: "port".to_string(),
            value: port,
        })?;

        Ok(Self {
            host: config.get_string_or("host", &defaults.host),
            port,
            eager_singletons: config.get_bool_or("eager_singletons", defaults.eager_singletons)?,
            log_filter: config.get_string_or("log", &defaults.log_filter),
        })
    }

    /// Environment first, then the JSON file named by `OPSCOPE_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut provider = ConfigProvider::new();
        provider.add_source(Box::new(EnvironmentConfigSource::with_prefix(ENV_PREFIX)));
        if let Ok(path) = env::var(format!("{ENV_PREFIX}_CONFIG")) {
            provider.add_source(Box::new(JsonConfigSource::load(path)?));
        }
        Self::load(&provider)
    }

    /// Resolves `host` (an IP literal or a hostname) and `port` to the first
    /// matching socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        (host, self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidAddress {
                host: self.host.clone(),
                port: self.port,
            })
    }
}
