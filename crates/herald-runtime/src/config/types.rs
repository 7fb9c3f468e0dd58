//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
/// Every field is optional in a config file.
///
/// # Example
///
/// ```
/// use herald_runtime::config::AppConfig;
///
/// let config = AppConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.command.prefixes, vec!["!".to_string()]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Enable debug mode.
    pub debug: bool,

    /// Command dispatch settings.
    pub command: CommandSettings,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Applies one config layer on top of this one.
    ///
    /// Every key present in `layer` overrides the current value, including
    /// keys that restate a default. Absent keys leave the value alone.
    pub fn apply_layer(&mut self, layer: &PartialAppConfig) {
        if let Some(debug) = layer.debug {
            self.debug = debug;
        }
        self.command.apply_layer(&layer.command);
    }
}

/// Command dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandSettings {
    /// Prefixes that mark a message as a command, tried in order.
    /// Private messages are treated as commands without one.
    pub prefixes: Vec<String>,

    /// Authority of users the memory store creates on first sight.
    pub default_authority: u32,

    /// Global switch for rejection hints; a command's own
    /// `show_warning` can only narrow it.
    pub show_warning: bool,

    /// Register the built-in `help` command.
    pub help: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefixes: vec!["!".into()],
            default_authority: 1,
            show_warning: true,
            help: true,
        }
    }
}

impl CommandSettings {
    fn apply_layer(&mut self, layer: &PartialCommandSettings) {
        if let Some(prefixes) = &layer.prefixes {
            self.prefixes.clone_from(prefixes);
        }
        if let Some(authority) = layer.default_authority {
            self.default_authority = authority;
        }
        if let Some(show_warning) = layer.show_warning {
            self.show_warning = show_warning;
        }
        if let Some(help) = layer.help {
            self.help = help;
        }
    }
}

/// One config file as written: only the keys it sets.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartialAppConfig {
    /// `debug`, if set.
    pub debug: Option<bool>,
    /// `[command]` keys that are set.
    pub command: PartialCommandSettings,
}

impl PartialAppConfig {
    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// `[command]` keys of one config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartialCommandSettings {
    pub prefixes: Option<Vec<String>>,
    pub default_authority: Option<u32>,
    pub show_warning: Option<bool>,
    pub help: Option<bool>,
}
