//! Typed configuration for cfgate.
//!
//! - TOML, JSON and YAML configuration files
//! - Environment variable overrides (`CFGATE__SECTION__KEY`)
//! - `.env` files via `dotenvy`
//! - Strict parsing: unknown keys fail in every section
//!
//! # Example
//!
//! ```no_run
//! use cfgate_config::ConfigLoader;
//!
//! # fn main() -> Result<(), cfgate_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_optional_file("cfgate.toml")?
//!     .with_env_prefix("CFGATE")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! server_url = "https://api.example.com"
//! request_timeout_secs = 60
//! shutdown_timeout_secs = 30
//!
//! [auth]
//! root_namespace = "cf"
//! cf_user_cache_ttl_secs = 120
//!
//! [cli]
//! min_version = "8.5.0"
//!
//! [jobs]
//! deletion_timeout_secs = 120
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![doc(html_root_url = "https://docs.rs/cfgate-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::GatewayConfig;
pub use error::ConfigError;
pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::{
    AuthConfig, CliConfig, JobsConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig,
};
