//! Error types for the hook system.

use herald_types::ErrorCode;
use thiserror::Error;

/// Errors that can occur in the hook system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// Unknown hook point string.
    #[error("unknown hook point: {0}")]
    UnknownHookPoint(String),
}

impl ErrorCode for HookError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownHookPoint(_) => "HOOK_UNKNOWN_POINT",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
