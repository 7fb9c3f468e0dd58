//! Invocation rejections and the authority/usage gate.

use crate::storage::{Storage, StorageError, UsageLimits};
use herald_command::{CommandNode, Invocation};
use std::fmt;
use tracing::warn;

/// Why an invocation was turned away.
///
/// Rejections are ordinary outcomes: the caller gets [`Rejection`]'s
/// `Display` text as a hint and the action never runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A required positional argument is missing.
    InsufficientArguments,
    /// More positional values than the declaration accepts.
    RedundantArguments,
    /// Undeclared options were passed.
    UnknownOptions(Vec<String>),
    /// A required option is missing; carries its flags.
    RequiredOptions(String),
    /// The user's authority is below a threshold.
    LowAuthority,
    /// The daily call cap is reached.
    UsageExhausted,
    /// Called again before the minimum interval passed.
    TooFrequent,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientArguments => f.write_str("insufficient arguments, check the command syntax"),
            Self::RedundantArguments => f.write_str("redundant arguments, check the command syntax"),
            Self::UnknownOptions(names) => write!(f, "unknown options: {}", names.join(", ")),
            Self::RequiredOptions(flags) => write!(f, "missing required option: {flags}"),
            Self::LowAuthority => f.write_str("low authority"),
            Self::UsageExhausted => f.write_str("usage limit reached for today"),
            Self::TooFrequent => f.write_str("called too frequently, try again later"),
        }
    }
}

/// Checks the caller's authority and consumes usage.
///
/// Without a user record nothing is gated. Options present in the
/// invocation (defaults included) are checked against their own
/// thresholds; any `not_usage` option among them skips usage accounting.
///
/// # Errors
///
/// Propagates [`StorageError`] from the usage check.
pub async fn check_authority_and_usage(
    node: &CommandNode,
    inv: &Invocation,
    storage: &dyn Storage,
) -> Result<Option<Rejection>, StorageError> {
    let Some(user) = inv.user.as_ref() else {
        return Ok(None);
    };

    let config = node.config();
    if config.authority > user.authority {
        warn!(
            command = node.name(),
            user = user.id,
            required = config.authority,
            actual = user.authority,
            "authority too low"
        );
        return Ok(Some(Rejection::LowAuthority));
    }

    let mut accounted = true;
    for name in inv.options.keys() {
        let Some(decl) = node.option(name) else {
            continue;
        };
        if decl.config.authority > user.authority {
            warn!(
                command = node.name(),
                option = %name,
                user = user.id,
                required = decl.config.authority,
                "authority too low for option"
            );
            return Ok(Some(Rejection::LowAuthority));
        }
        if decl.config.not_usage {
            accounted = false;
        }
    }

    if !accounted || !config.tracks_usage() {
        return Ok(None);
    }

    let limits = UsageLimits {
        max_usage: config.max_usage.resolve(user),
        min_interval: config.min_interval.resolve(user),
    };
    if limits.is_unlimited() {
        return Ok(None);
    }

    storage
        .check_and_consume_usage(node.usage_name(), user.id, limits)
        .await
}
