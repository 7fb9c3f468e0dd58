//! Command lifecycle hooks for herald.
//!
//! Hooks observe (and, before execution, may cancel) command invocations.
//! Each hook is bound to a [`Context`](herald_types::Context), so a plugin
//! scoped to a set of groups only sees invocations from those groups.
//!
//! # Hook Points
//!
//! | Point | Name | Can cancel |
//! |-------|------|------------|
//! | [`HookPoint::BeforeCommand`] | `before-command` | yes (`Handled`) |
//! | [`HookPoint::Command`] | `command` | no |
//! | [`HookPoint::AfterCommand`] | `after-command` | no |
//! | [`HookPoint::CommandError`] | `command-error` | no |
//!
//! # Dispatch
//!
//! [`HookRegistry::chain`] snapshots the hooks at one point whose context
//! matches the conversation. [`HookChain::run_parallel`] fires all of them,
//! waits for every one, and reports `Handled` if any hook handled the event.
//! The command pipeline uses it for every lifecycle point.
//!
//! # Example
//!
//! ```
//! use herald_event::Meta;
//! use herald_hook::{HookContext, HookPoint, HookRegistry};
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let registry = HookRegistry::new();
//! let ctx = HookContext::new(
//!     HookPoint::BeforeCommand,
//!     "echo",
//!     Meta::private_message(1, "echo hi"),
//!     json!({"args": ["hi"]}),
//! );
//!
//! // No hooks registered → Continue
//! let chain = registry.chain(ctx.hook_point, ctx.meta.conversation);
//! assert!(chain.run_parallel(ctx).await.is_continue());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

mod action;
mod context;
mod error;
pub mod hook;
mod point;
mod registry;

pub use action::HookAction;
pub use context::HookContext;
pub use error::HookError;
pub use hook::Hook;
pub use point::HookPoint;
pub use registry::{HookChain, HookRegistry};

pub mod testing {
    //! Test utilities for the hook system.
    //!
    //! Provides [`MockHook`] for use in tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub use crate::hook::testing::MockHook;
}
