//! Layered configuration loading.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, GatewayConfig, LogFormat};

/// Source format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML.
    Toml,
    /// JSON.
    Json,
    /// YAML.
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Picks the format from a name such as `"toml"`.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(name.to_string())),
        }
    }

    fn parse(self, content: &str) -> Result<GatewayConfig, ConfigError> {
        Ok(match self {
            Self::Toml => toml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        })
    }
}

/// Configuration loader with a layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML, JSON or YAML)
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use cfgate_config::ConfigLoader;
///
/// # fn main() -> Result<(), cfgate_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("cfgate.toml")?
///     .with_env_prefix("CFGATE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: GatewayConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = GatewayConfig::default();
        self
    }

    /// Load a configuration file, choosing the format by extension.
    ///
    /// Sections missing from the file keep their defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::missing(path));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

        self.config = format.parse(&content)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file) but a missing file is not an error.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the named format.
    ///
    /// ```
    /// use cfgate_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[cli]\nmin_version = \"8.7.0\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.cli.min_version, "8.7.0");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = ConfigFormat::from_name(format)?.parse(content)?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// With prefix `CFGATE`, `CFGATE__SERVER__HTTP_ADDR=0.0.0.0:9000` sets
    /// `server.http_addr`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Apply environment overrides and validate.
    pub fn load(mut self) -> Result<GatewayConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without validating it.
    #[must_use]
    pub fn load_unvalidated(self) -> GatewayConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => self.config.server.http_addr = value.to_string(),
            ["SERVER", "SERVER_URL"] => self.config.server.server_url = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_SECS"] => {
                self.config.server.request_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["AUTH", "ROOT_NAMESPACE"] => self.config.auth.root_namespace = value.to_string(),
            ["AUTH", "CF_USER_CACHE_TTL_SECS"] => {
                self.config.auth.cf_user_cache_ttl_secs = parse_number(key, value)?;
            }

            ["CLI", "MIN_VERSION"] => self.config.cli.min_version = value.to_string(),

            ["JOBS", "DELETION_TIMEOUT_SECS"] => {
                self.config.jobs.deletion_timeout_secs = parse_number(key, value)?;
            }

            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["METRICS", "ADDR"] => self.config.metrics.addr = value.to_string(),

            // Unrelated variables sharing the prefix are ignored.
            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env(key, "expected integer"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
