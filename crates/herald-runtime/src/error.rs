//! Runtime error type.

use crate::storage::StorageError;
use herald_command::CommandError;
use herald_types::ErrorCode;
use thiserror::Error;

/// Failure while dispatching an event.
///
/// Rejections are not errors; see [`Rejection`](crate::Rejection).
#[derive(Debug, Error)]
pub enum RouterError {
    /// Loading records or consuming usage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A command action returned an error.
    #[error("command '{command}' failed: {message}")]
    Action {
        /// Command name.
        command: String,
        /// Rendered error chain.
        message: String,
    },

    /// Building the app's own commands failed.
    #[error("command setup failed: {0}")]
    Command(#[from] CommandError),
}

impl RouterError {
    /// Creates an action error.
    pub fn action(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for RouterError {
    fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "ROUTER_STORAGE",
            Self::Action { .. } => "ROUTER_ACTION",
            Self::Command(_) => "ROUTER_COMMAND",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_recoverable(),
            Self::Action { .. } => true,
            Self::Command(_) => false,
        }
    }
}
