//! Hook lifecycle points.
//!
//! Every point where the command pipeline invokes registered hooks.

use crate::HookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle points around a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    /// Before any check runs. A `Handled` result aborts the invocation.
    BeforeCommand,
    /// After every check passed, right before the action.
    Command,
    /// After the action finished without falling through.
    AfterCommand,
    /// The action or a middleware returned an error.
    CommandError,
}

impl HookPoint {
    /// All points.
    pub const ALL: [HookPoint; 4] = [
        Self::BeforeCommand,
        Self::Command,
        Self::AfterCommand,
        Self::CommandError,
    ];

    /// Returns `true` if hooks at this point may cancel the operation.
    #[must_use]
    pub fn is_pre(&self) -> bool {
        matches!(self, Self::BeforeCommand)
    }

    /// Returns the canonical event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeCommand => "before-command",
            Self::Command => "command",
            Self::AfterCommand => "after-command",
            Self::CommandError => "command-error",
        }
    }
}

impl FromStr for HookPoint {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|point| point.as_str() == s)
            .ok_or_else(|| HookError::UnknownHookPoint(s.to_string()))
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_points() {
        for point in HookPoint::ALL {
            assert_eq!(point.as_str().parse::<HookPoint>().unwrap(), point);
        }
    }

    #[test]
    fn unknown_point() {
        assert_eq!(
            "after-dinner".parse::<HookPoint>(),
            Err(HookError::UnknownHookPoint("after-dinner".into()))
        );
    }

    #[test]
    fn only_before_command_is_pre() {
        assert!(HookPoint::BeforeCommand.is_pre());
        assert!(!HookPoint::Command.is_pre());
        assert!(!HookPoint::AfterCommand.is_pre());
        assert!(!HookPoint::CommandError.is_pre());
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(HookPoint::AfterCommand.to_string(), "after-command");
    }
}
