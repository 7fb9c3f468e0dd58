//! Hook registry: ordered handler lists per lifecycle point.
//!
//! The registry is wrapped in a lock at the application level. Dispatch is
//! async, so callers take a [`HookChain`] snapshot under the lock and run it
//! after releasing the lock.

use crate::{Hook, HookAction, HookContext, HookPoint};
use herald_types::Identity;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Central registry for all hooks.
///
/// Within each point hooks are kept in registration order. Dispatch runs
/// them concurrently, so the order carries no meaning beyond listing.
pub struct HookRegistry {
    hooks: HashMap<HookPoint, Vec<Arc<dyn Hook>>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    /// Registers a hook at its point.
    pub fn register(&mut self, hook: Arc<dyn Hook>) {
        tracing::debug!(hook_id = hook.id(), point = %hook.hook_point(), "hook registered");
        self.hooks.entry(hook.hook_point()).or_default().push(hook);
    }

    /// Returns the number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Returns `true` if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots the hooks at `point` whose context matches `conversation`.
    #[must_use]
    pub fn chain(&self, point: HookPoint, conversation: Identity) -> HookChain {
        let hooks = self
            .hooks
            .get(&point)
            .map(|hooks| {
                hooks
                    .iter()
                    .filter(|hook| hook.context().matches(conversation))
                    .map(Arc::clone)
                    .collect()
            })
            .unwrap_or_default();
        HookChain { point, hooks }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Hooks selected for one dispatch, detached from the registry lock.
pub struct HookChain {
    point: HookPoint,
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookChain {
    /// Number of hooks in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if nothing would run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Fire every hook concurrently and join. `Handled` if any hook handled.
    ///
    /// A hook task that panics is logged and counted as `Continue`.
    pub async fn run_parallel(self, ctx: HookContext) -> HookAction {
        if self.hooks.is_empty() {
            return HookAction::Continue;
        }

        let mut set = JoinSet::new();
        for hook in self.hooks {
            let ctx = ctx.clone();
            set.spawn(async move { hook.execute(ctx).await });
        }

        let mut result = HookAction::Continue;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(HookAction::Handled) => result = HookAction::Handled,
                Ok(HookAction::Continue) => {}
                Err(e) => {
                    tracing::warn!(point = %self.point, error = %e, "hook task failed");
                }
            }
        }
        result
    }
}
