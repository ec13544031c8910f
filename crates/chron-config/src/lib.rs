//! # chron-config
//!
//! Layered configuration loading for Chronicle using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CHRONICLE_*` prefix, `__` as separator)
//! 2. Project-level `.chronicle/config.toml`
//! 3. User-level `~/.config/chronicle/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CHRONICLE_DATABASE__PATH` -> `database.path`,
//! `CHRONICLE_AUDIT__OMIT` -> `audit.omit`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use chron_config::ChronConfig;
//!
//! let config = ChronConfig::load_with_dotenv().expect("config");
//! let policy = config.audit.policy().expect("valid audit settings");
//! println!("audit log at {}", config.database.path);
//! # let _ = policy;
//! ```

mod audit;
mod database;
mod error;

pub use audit::{AuditConfig, FieldList};
pub use database::DatabaseConfig;
pub use error::ConfigError;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CHRONICLE_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChronConfig {
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl ChronConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source has the wrong shape.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading a `.env` file into the environment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".chronicle/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chronicle").join("config.toml"))
    }

    /// Load `.env` from the current directory or the nearest ancestor.
    /// Does nothing if there is none.
    fn load_dotenv() {
        let _ = dotenvy::dotenv();
    }
}
