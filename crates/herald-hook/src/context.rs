//! Hook context: data passed to hook handlers.

use crate::HookPoint;
use herald_event::Meta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Context passed to hook handlers.
///
/// `payload` carries the invocation (`args`, `options`) for command points
/// and `{"error": "..."}` for [`HookPoint::CommandError`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Which hook point triggered this.
    pub hook_point: HookPoint,

    /// Name of the command being invoked.
    pub command: String,

    /// The event that triggered the invocation.
    pub meta: Meta,

    /// Point-specific payload.
    pub payload: Value,

    /// Free-form annotations for hooks that share state.
    pub metadata: HashMap<String, Value>,
}

impl HookContext {
    /// Creates a new context.
    #[must_use]
    pub fn new(hook_point: HookPoint, command: impl Into<String>, meta: Meta, payload: Value) -> Self {
        Self {
            hook_point,
            command: command.into(),
            meta,
            payload,
            metadata: HashMap::new(),
        }
    }

    /// Returns a copy retargeted at another point.
    #[must_use]
    pub fn at(&self, hook_point: HookPoint) -> Self {
        let mut ctx = self.clone();
        ctx.hook_point = hook_point;
        ctx
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
