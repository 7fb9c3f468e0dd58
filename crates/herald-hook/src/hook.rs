//! Hook trait and testing utilities.

use crate::{HookAction, HookContext, HookPoint};
use async_trait::async_trait;
use herald_types::Context;

/// A single hook handler.
///
/// Hooks are registered with the [`HookRegistry`](crate::HookRegistry) and
/// invoked at a lifecycle point for events whose conversation their
/// [`Context`] matches.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Unique identifier for this hook.
    fn id(&self) -> &str;

    /// Conversations this hook observes.
    fn context(&self) -> &Context;

    /// Which lifecycle point this hook fires on.
    fn hook_point(&self) -> HookPoint;

    /// Execute the hook.
    async fn execute(&self, ctx: HookContext) -> HookAction;
}

/// Test utilities for the hook system.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Contexts seen by a mock, in call order.
    pub type Recorded = Arc<Mutex<Vec<HookContext>>>;

    /// A mock hook for testing.
    ///
    /// Returns a fixed [`HookAction`] and records every context it sees.
    pub struct MockHook {
        /// Hook ID.
        pub id: String,
        /// Observed conversations.
        pub context: Context,
        /// Hook point.
        pub point: HookPoint,
        /// The action returned on every call.
        pub action: HookAction,
        /// Number of times execute() has been called.
        pub call_count: Arc<AtomicUsize>,
        /// Contexts passed to execute().
        pub seen: Recorded,
    }

    impl MockHook {
        /// Creates a mock that returns `Continue`.
        pub fn pass_through(id: &str, point: HookPoint) -> Self {
            Self {
                id: id.to_string(),
                context: Context::all(),
                point,
                action: HookAction::Continue,
                call_count: Arc::new(AtomicUsize::new(0)),
                seen: Recorded::default(),
            }
        }

        /// Creates a mock that returns `Handled`.
        pub fn handler(id: &str, point: HookPoint) -> Self {
            Self {
                action: HookAction::Handled,
                ..Self::pass_through(id, point)
            }
        }

        /// Restricts the mock to `context`.
        #[must_use]
        pub fn with_context(mut self, context: Context) -> Self {
            self.context = context;
            self
        }

        /// Returns the number of times this hook has been executed.
        pub fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Hook for MockHook {
        fn id(&self) -> &str {
            &self.id
        }

        fn context(&self) -> &Context {
            &self.context
        }

        fn hook_point(&self) -> HookPoint {
            self.point
        }

        async fn execute(&self, ctx: HookContext) -> HookAction {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(ctx);
            }
            self.action.clone()
        }
    }
}
