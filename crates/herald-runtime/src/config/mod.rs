//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌───────────────────────────────────────────┐
//! │  1. Command-line flags (ConfigResolver)   │
//! ├───────────────────────────────────────────┤
//! │  2. Environment Variables (HERALD_*)      │
//! ├───────────────────────────────────────────┤
//! │  3. Project Config (.herald/config.toml)  │
//! ├───────────────────────────────────────────┤
//! │  4. Global Config (~/.herald/config.toml) │
//! ├───────────────────────────────────────────┤
//! │  5. Default Values (compile-time)         │
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `HERALD_DEBUG` | `debug` | bool |
//! | `HERALD_PREFIX` | `command.prefixes` | comma-separated list |
//! | `HERALD_DEFAULT_AUTHORITY` | `command.default_authority` | u32 |
//! | `HERALD_SHOW_WARNING` | `command.show_warning` | bool |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.herald/config.toml
//! debug = false
//!
//! [command]
//! prefixes = ["!", "/"]
//! default_authority = 1
//! show_warning = true
//! help = true
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{AppConfig, CommandSettings, PartialAppConfig, PartialCommandSettings};

/// Default global config directory.
#[must_use]
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".herald")
}

/// Default global config file path.
#[must_use]
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".herald";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
