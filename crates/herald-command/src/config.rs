//! Per-command configuration and patch merging.

use herald_event::Meta;
use herald_types::UserRecord;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A limit that is either fixed or computed from the calling user.
pub enum Threshold<T> {
    /// Same for everybody.
    Fixed(T),
    /// Evaluated against the user record at check time.
    PerUser(Arc<dyn Fn(&UserRecord) -> T + Send + Sync>),
}

impl<T: Clone> Threshold<T> {
    /// Builds a per-user threshold.
    pub fn per_user<F>(f: F) -> Self
    where
        F: Fn(&UserRecord) -> T + Send + Sync + 'static,
    {
        Self::PerUser(Arc::new(f))
    }

    /// Resolves the threshold for `user`.
    #[must_use]
    pub fn resolve(&self, user: &UserRecord) -> T {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::PerUser(f) => f(user),
        }
    }

    /// The fixed value, if there is one.
    #[must_use]
    pub fn fixed(&self) -> Option<&T> {
        match self {
            Self::Fixed(value) => Some(value),
            Self::PerUser(_) => None,
        }
    }
}

impl<T: Clone> Clone for Threshold<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(value) => Self::Fixed(value.clone()),
            Self::PerUser(f) => Self::PerUser(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Threshold<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::PerUser(_) => f.write_str("PerUser(..)"),
        }
    }
}

impl<T> From<T> for Threshold<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

/// Predicate that hides a command from an event.
pub type DisablePredicate = Arc<dyn Fn(&Meta) -> bool + Send + Sync>;

/// Effective configuration of one command.
#[derive(Clone)]
pub struct CommandConfig {
    /// Minimum user authority.
    pub authority: u32,
    /// Daily call cap; `None` is unlimited.
    pub max_usage: Threshold<Option<u32>>,
    /// Minimum time between accepted calls.
    pub min_interval: Threshold<Duration>,
    /// Reject missing required and surplus positional arguments.
    pub check_arg_count: bool,
    /// Reject undeclared options.
    pub check_unknown: bool,
    /// Reject invocations missing a required option.
    pub check_required: bool,
    /// Hides the command for matching events.
    pub disable: Option<DisablePredicate>,
    /// Usage bucket; defaults to the command name.
    pub usage_name: Option<String>,
    /// Send rejection hints back to the conversation.
    pub show_warning: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            authority: 1,
            max_usage: Threshold::Fixed(None),
            min_interval: Threshold::Fixed(Duration::ZERO),
            check_arg_count: false,
            check_unknown: false,
            check_required: true,
            disable: None,
            usage_name: None,
            show_warning: true,
        }
    }
}

impl CommandConfig {
    /// Returns `true` if any usage limit could apply to some user.
    #[must_use]
    pub fn tracks_usage(&self) -> bool {
        let finite_usage = match &self.max_usage {
            Threshold::Fixed(limit) => limit.is_some(),
            Threshold::PerUser(_) => true,
        };
        let positive_interval = match &self.min_interval {
            Threshold::Fixed(interval) => !interval.is_zero(),
            Threshold::PerUser(_) => true,
        };
        finite_usage || positive_interval
    }

    /// Returns `true` if the predicate hides the command from `meta`.
    #[must_use]
    pub fn is_disabled(&self, meta: &Meta) -> bool {
        self.disable.as_ref().is_some_and(|f| f(meta))
    }
}

impl fmt::Debug for CommandConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandConfig")
            .field("authority", &self.authority)
            .field("max_usage", &self.max_usage)
            .field("min_interval", &self.min_interval)
            .field("check_arg_count", &self.check_arg_count)
            .field("check_unknown", &self.check_unknown)
            .field("check_required", &self.check_required)
            .field("disable", &self.disable.is_some())
            .field("usage_name", &self.usage_name)
            .field("show_warning", &self.show_warning)
            .finish()
    }
}

/// Partial configuration passed at registration.
///
/// Only fields that are set override the command's current values, so a
/// later registration of the same path wins key by key.
///
/// # Example
///
/// ```
/// use herald_command::{CommandConfig, CommandConfigPatch};
///
/// let mut config = CommandConfig::default();
/// CommandConfigPatch::new().authority(3).max_usage(2).apply(&mut config);
/// CommandConfigPatch::new().max_usage(5).apply(&mut config);
///
/// assert_eq!(config.authority, 3);
/// assert_eq!(config.max_usage.fixed(), Some(&Some(5)));
/// ```
#[derive(Clone, Default)]
pub struct CommandConfigPatch {
    authority: Option<u32>,
    max_usage: Option<Threshold<Option<u32>>>,
    min_interval: Option<Threshold<Duration>>,
    check_arg_count: Option<bool>,
    check_unknown: Option<bool>,
    check_required: Option<bool>,
    disable: Option<DisablePredicate>,
    usage_name: Option<String>,
    show_warning: Option<bool>,
}

impl CommandConfigPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the authority threshold.
    #[must_use]
    pub fn authority(mut self, authority: u32) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Caps daily calls.
    #[must_use]
    pub fn max_usage(mut self, max: u32) -> Self {
        self.max_usage = Some(Threshold::Fixed(Some(max)));
        self
    }

    /// Computes the daily cap per user; `None` is unlimited.
    #[must_use]
    pub fn max_usage_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&UserRecord) -> Option<u32> + Send + Sync + 'static,
    {
        self.max_usage = Some(Threshold::per_user(f));
        self
    }

    /// Sets the minimum interval between calls.
    #[must_use]
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(Threshold::Fixed(interval));
        self
    }

    /// Computes the minimum interval per user.
    #[must_use]
    pub fn min_interval_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&UserRecord) -> Duration + Send + Sync + 'static,
    {
        self.min_interval = Some(Threshold::per_user(f));
        self
    }

    /// Toggles positional argument count checks.
    #[must_use]
    pub fn check_arg_count(mut self, on: bool) -> Self {
        self.check_arg_count = Some(on);
        self
    }

    /// Toggles unknown option checks.
    #[must_use]
    pub fn check_unknown(mut self, on: bool) -> Self {
        self.check_unknown = Some(on);
        self
    }

    /// Toggles required option checks.
    #[must_use]
    pub fn check_required(mut self, on: bool) -> Self {
        self.check_required = Some(on);
        self
    }

    /// Hides the command from events the predicate accepts.
    #[must_use]
    pub fn disable<F>(mut self, f: F) -> Self
    where
        F: Fn(&Meta) -> bool + Send + Sync + 'static,
    {
        self.disable = Some(Arc::new(f));
        self
    }

    /// Shares a usage bucket under `name`.
    #[must_use]
    pub fn usage_name(mut self, name: impl Into<String>) -> Self {
        self.usage_name = Some(name.into());
        self
    }

    /// Toggles rejection hints.
    #[must_use]
    pub fn show_warning(mut self, on: bool) -> Self {
        self.show_warning = Some(on);
        self
    }

    /// Writes every set field into `config`.
    pub fn apply(self, config: &mut CommandConfig) {
        if let Some(v) = self.authority {
            config.authority = v;
        }
        if let Some(v) = self.max_usage {
            config.max_usage = v;
        }
        if let Some(v) = self.min_interval {
            config.min_interval = v;
        }
        if let Some(v) = self.check_arg_count {
            config.check_arg_count = v;
        }
        if let Some(v) = self.check_unknown {
            config.check_unknown = v;
        }
        if let Some(v) = self.check_required {
            config.check_required = v;
        }
        if let Some(v) = self.disable {
            config.disable = Some(v);
        }
        if let Some(v) = self.usage_name {
            config.usage_name = Some(v);
        }
        if let Some(v) = self.show_warning {
            config.show_warning = v;
        }
    }
}

impl fmt::Debug for CommandConfigPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandConfigPatch")
            .field("authority", &self.authority)
            .field("max_usage", &self.max_usage)
            .field("min_interval", &self.min_interval)
            .field("usage_name", &self.usage_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CommandConfig::default();
        assert_eq!(config.authority, 1);
        assert!(config.show_warning);
        assert!(config.check_required);
        assert!(!config.check_arg_count);
        assert!(!config.tracks_usage());
    }

    #[test]
    fn patch_overrides_only_set_fields() {
        let mut config = CommandConfig::default();
        CommandConfigPatch::new()
            .authority(4)
            .show_warning(false)
            .apply(&mut config);
        CommandConfigPatch::new()
            .min_interval(Duration::from_secs(5))
            .apply(&mut config);

        assert_eq!(config.authority, 4);
        assert!(!config.show_warning);
        assert_eq!(config.min_interval.fixed(), Some(&Duration::from_secs(5)));
        assert!(config.tracks_usage());
    }

    #[test]
    fn per_user_threshold() {
        let mut config = CommandConfig::default();
        CommandConfigPatch::new()
            .max_usage_with(|user| (user.authority < 3).then_some(10))
            .apply(&mut config);

        assert!(config.tracks_usage());
        assert_eq!(config.max_usage.resolve(&UserRecord::new(1, 1)), Some(10));
        assert_eq!(config.max_usage.resolve(&UserRecord::new(1, 4)), None);
    }

    #[test]
    fn disable_predicate() {
        let mut config = CommandConfig::default();
        CommandConfigPatch::new()
            .disable(|meta| meta.user_id == Some(13))
            .apply(&mut config);

        assert!(config.is_disabled(&Meta::private_message(13, "x")));
        assert!(!config.is_disabled(&Meta::private_message(14, "x")));
    }
}
