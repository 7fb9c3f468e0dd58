//! Overrides applied on top of a loaded configuration.
//!
//! ```text
//! ConfigLoader.load()  →  AppConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     AppConfig (final)
//! ```

use super::AppConfig;

/// Applies a set of overrides, such as command-line flags.
///
/// Implementors only touch the values they were given, leaving the rest of
/// the loaded configuration untouched.
pub trait ConfigResolver {
    /// Applies overrides to `config`.
    fn apply(&self, config: &mut AppConfig);
}

/// Resolver that changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut AppConfig) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Prefix(Option<String>);

    impl ConfigResolver for Prefix {
        fn apply(&self, config: &mut AppConfig) {
            if let Some(ref p) = self.0 {
                config.command.prefixes = vec![p.clone()];
            }
        }
    }

    #[test]
    fn noop_leaves_config_alone() {
        let mut config = AppConfig::default();
        NoOpResolver.apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn only_given_values_apply() {
        let mut config = AppConfig::default();
        Prefix(None).apply(&mut config);
        assert_eq!(config.command.prefixes, vec!["!".to_string()]);

        Prefix(Some("/".into())).apply(&mut config);
        assert_eq!(config.command.prefixes, vec!["/".to_string()]);
    }
}
