//! Hook action: return type from hook handlers.

use serde::{Deserialize, Serialize};

/// What the hook wants the runtime to do after execution.
///
/// `Handled` is the cancellation sentinel: returned from a
/// `before-command` hook it stops the invocation before any check runs.
/// Other points are observational and ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookAction {
    /// Let the operation proceed.
    Continue,

    /// The hook took care of the event; abandon the operation.
    Handled,
}

impl HookAction {
    /// Returns `true` if this is `Continue`.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Returns `true` if this is `Handled`.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled)
    }
}
