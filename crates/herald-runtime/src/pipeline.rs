//! Execution pipeline.
//!
//! Runs one parsed invocation against its command:
//!
//! ```text
//! before-command hooks ──handled──▶ Cancelled
//!        │
//!        ▼
//! argument count → unknown options → required options → authority/usage
//!        │                  (first failure: hint, Rejected)
//!        ▼
//! command hooks → action ──Next──▶ Executed(Next)
//!                    │
//!                 Handled → after-command hooks → Executed(Handled)
//!                    │
//!                   Err → command-error hooks → RouterError::Action
//! ```
//!
//! Hooks at every point run concurrently and are joined.

use crate::gate::{check_authority_and_usage, Rejection};
use crate::storage::Storage;
use crate::RouterError;
use herald_command::{ArgDecl, CommandNode, Flow, Invocation};
use herald_hook::{HookAction, HookContext, HookPoint, HookRegistry};
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A check failed; the action did not run.
    Rejected(Rejection),
    /// A before-command hook handled the event.
    Cancelled,
    /// The action ran (or there was none, which counts as `Next`).
    Executed(Flow),
}

/// Validates invocations and drives command actions.
pub struct ExecutionPipeline {
    hooks: Arc<RwLock<HookRegistry>>,
    storage: Arc<dyn Storage>,
    show_warning: bool,
}

impl ExecutionPipeline {
    /// Creates a pipeline over shared hooks and storage.
    #[must_use]
    pub fn new(hooks: Arc<RwLock<HookRegistry>>, storage: Arc<dyn Storage>) -> Self {
        Self {
            hooks,
            storage,
            show_warning: true,
        }
    }

    /// Global hint switch. When off, no command sends rejection hints.
    #[must_use]
    pub fn with_show_warning(mut self, on: bool) -> Self {
        self.show_warning = on;
        self
    }

    /// Runs `inv` against `node`.
    ///
    /// # Errors
    ///
    /// [`RouterError::Storage`] when the usage check cannot reach storage,
    /// [`RouterError::Action`] when the action fails.
    pub async fn execute(&self, node: &CommandNode, inv: Invocation) -> Result<Outcome, RouterError> {
        let ctx = HookContext::new(
            HookPoint::BeforeCommand,
            node.name(),
            inv.meta.clone(),
            inv.payload(),
        );

        if self.fire(&ctx).await.is_handled() {
            debug!(command = node.name(), "cancelled by before-command hook");
            return Ok(Outcome::Cancelled);
        }

        if let Some(rejection) = self.check(node, &inv).await? {
            debug!(command = node.name(), %rejection, "invocation rejected");
            self.hint(node, &inv, &rejection).await;
            return Ok(Outcome::Rejected(rejection));
        }

        self.fire(&ctx.at(HookPoint::Command)).await;

        let Some(action) = node.action().cloned() else {
            debug!(command = node.name(), "no action bound, falling through");
            return Ok(Outcome::Executed(Flow::Next));
        };

        info!(
            command = node.name(),
            conversation = %inv.meta.conversation,
            user = ?inv.meta.user_id,
            "executing command"
        );

        match action.run(inv).await {
            Ok(Flow::Handled) => {
                self.fire(&ctx.at(HookPoint::AfterCommand)).await;
                Ok(Outcome::Executed(Flow::Handled))
            }
            Ok(Flow::Next) => Ok(Outcome::Executed(Flow::Next)),
            Err(e) => {
                let message = format!("{e:#}");
                error!(command = node.name(), error = %message, "command failed");
                let mut err_ctx = ctx.at(HookPoint::CommandError);
                err_ctx.payload = json!({ "error": message });
                self.fire(&err_ctx).await;
                Err(RouterError::action(node.name(), message))
            }
        }
    }

    /// Runs the ordered checks; the first failure wins.
    async fn check(&self, node: &CommandNode, inv: &Invocation) -> Result<Option<Rejection>, RouterError> {
        let config = node.config();

        if config.check_arg_count {
            if let Some(rejection) = check_arguments(node.args(), &inv.args) {
                return Ok(Some(rejection));
            }
        }

        if config.check_unknown && !inv.unknown.is_empty() {
            return Ok(Some(Rejection::UnknownOptions(inv.unknown.clone())));
        }

        if config.check_required {
            let missing = node
                .options()
                .iter()
                .find(|o| o.config.required && !inv.options.contains_key(&o.name));
            if let Some(option) = missing {
                return Ok(Some(Rejection::RequiredOptions(option.flag_list())));
            }
        }

        Ok(check_authority_and_usage(node, inv, self.storage.as_ref()).await?)
    }

    async fn fire(&self, ctx: &HookContext) -> HookAction {
        let chain = self.hooks.read().chain(ctx.hook_point, ctx.meta.conversation);
        chain.run_parallel(ctx.clone()).await
    }

    async fn hint(&self, node: &CommandNode, inv: &Invocation, rejection: &Rejection) {
        if !(self.show_warning && node.config().show_warning) {
            return;
        }
        if let Err(e) = inv.reply(rejection.to_string()).await {
            warn!(command = node.name(), error = %e, "failed to send hint");
        }
    }
}

/// Positional count check against the declarations.
fn check_arguments(decls: &[ArgDecl], args: &[String]) -> Option<Rejection> {
    if decls.get(args.len()).is_some_and(|next| next.required) {
        return Some(Rejection::InsufficientArguments);
    }
    if args.len() > decls.len() && !decls.last().is_some_and(ArgDecl::absorbs_rest) {
        return Some(Rejection::RedundantArguments);
    }
    None
}
