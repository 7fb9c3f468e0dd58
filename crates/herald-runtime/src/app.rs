//! Application object and event router.
//!
//! [`App`] owns the command registry, hooks, middleware and the
//! collaborators, and routes every inbound [`Meta`]:
//!
//! ```text
//! Meta ─┬─ message ─▶ prefix / shortcut / path ─▶ CommandNode ─▶ ExecutionPipeline
//!       │                    │ no command, or action returned Next
//!       │                    ▼
//!       │             middleware, serial until handled
//!       │
//!       └─ other ───▶ middleware, all matching, concurrently
//! ```

use crate::config::AppConfig;
use crate::middleware::{EventContext, Middleware};
use crate::pipeline::{ExecutionPipeline, Outcome};
use crate::storage::{MemoryStorage, Storage};
use crate::{help, RouterError};
use herald_command::{
    CommandNode, CommandRegistry, DefaultParser, Flow, Invocation, LineParser, OptionValue,
    ParseError, Transport,
};
use herald_event::Meta;
use herald_hook::HookRegistry;
use herald_types::{Context, IdentityKind};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// What happened to one event.
#[derive(Debug)]
pub enum Dispatch {
    /// A command was resolved and went through the pipeline.
    Command {
        /// Command name.
        name: String,
        /// Pipeline result.
        outcome: Outcome,
    },
    /// The command line could not be parsed; a hint was sent.
    Malformed {
        /// Command name.
        name: String,
        /// Parser error.
        error: ParseError,
    },
    /// A middleware handled the message.
    Middleware,
    /// Nothing handled the message.
    Unhandled,
    /// A non-message event was fanned out.
    Broadcast {
        /// Middleware that returned `Handled`.
        handled: usize,
    },
}

/// A command picked for a message, detached from the registry lock.
struct Target {
    node: CommandNode,
    line: String,
    args: Vec<String>,
    options: BTreeMap<String, OptionValue>,
}

struct Registered {
    context: Context,
    middleware: Arc<dyn Middleware>,
}

struct Inner {
    config: AppConfig,
    commands: Arc<RwLock<CommandRegistry>>,
    hooks: Arc<RwLock<HookRegistry>>,
    middleware: RwLock<Vec<Registered>>,
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn LineParser>,
    pipeline: ExecutionPipeline,
}

/// The bot application.
///
/// Cheap to clone; clones share all state.
///
/// # Example
///
/// ```
/// use herald_command::{Flow, Invocation};
/// use herald_event::Meta;
/// use herald_runtime::{App, RecordingTransport};
/// use herald_types::{Context, Identity};
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let transport = Arc::new(RecordingTransport::new());
/// let app = App::builder(transport.clone()).build()?;
///
/// app.commands()
///     .command(&Context::all(), "echo <message:text>")?
///     .action(|inv: Invocation| async move {
///         inv.reply(inv.arg(0).unwrap_or_default()).await?;
///         anyhow::Ok(Flow::Handled)
///     });
///
/// app.dispatch(Meta::group_message(100, 42, "!echo hello there")).await?;
/// assert_eq!(transport.sent_to(Identity::group(100)), vec!["hello there"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct App {
    inner: Arc<Inner>,
}

impl App {
    /// Starts building an app that replies through `transport`.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>) -> AppBuilder {
        AppBuilder::new(transport)
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Locks the command registry for registration.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn commands(&self) -> RwLockWriteGuard<'_, CommandRegistry> {
        self.inner.commands.write()
    }

    /// Locks the hook registry for registration.
    pub fn hooks(&self) -> RwLockWriteGuard<'_, HookRegistry> {
        self.inner.hooks.write()
    }

    /// Adds a middleware reachable from `context`.
    pub fn middleware<M>(&self, context: &Context, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.inner.middleware.write().push(Registered {
            context: context.clone(),
            middleware: Arc::new(middleware),
        });
    }

    /// Storage collaborator.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Reply transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Routes one event.
    ///
    /// # Errors
    ///
    /// [`RouterError::Storage`] when records cannot be loaded,
    /// [`RouterError::Action`] when the command's action fails.
    pub async fn dispatch(&self, meta: Meta) -> Result<Dispatch, RouterError> {
        if !meta.post_type.is_serial() {
            let handled = self.broadcast(&meta).await;
            return Ok(Dispatch::Broadcast { handled });
        }

        let Some(target) = self.match_command(&meta) else {
            return Ok(if self.run_middleware(&meta).await {
                Dispatch::Middleware
            } else {
                Dispatch::Unhandled
            });
        };

        let name = target.node.name().to_string();
        let mut parsed = match self
            .inner
            .parser
            .parse(&target.line, target.node.args(), target.node.options())
        {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(command = %name, %error, "malformed command line");
                if self.inner.config.command.show_warning && target.node.config().show_warning {
                    let hint = EventContext::new(meta.clone(), Arc::clone(&self.inner.transport));
                    if let Err(e) = hint.reply(error.to_string()).await {
                        warn!(command = %name, error = %e, "failed to send hint");
                    }
                }
                return Ok(Dispatch::Malformed { name, error });
            }
        };

        // Shortcut presets come first and win over parsed options.
        let mut args = target.args;
        args.append(&mut parsed.args);
        parsed.args = args;
        parsed.options.extend(target.options);

        let user = match meta.user_id {
            Some(id) => {
                self.inner
                    .storage
                    .fetch_user(id, &target.node.user_fields_needed())
                    .await?
            }
            None => None,
        };
        let group = match meta.conversation.kind {
            IdentityKind::Group => {
                self.inner
                    .storage
                    .fetch_group(meta.conversation.id, &target.node.group_fields_needed())
                    .await?
            }
            _ => None,
        };

        let inv = Invocation::new(meta.clone(), &name, parsed, Arc::clone(&self.inner.transport))
            .with_user(user)
            .with_group(group);
        let outcome = self.inner.pipeline.execute(&target.node, inv).await?;

        if outcome == Outcome::Executed(Flow::Next) && self.run_middleware(&meta).await {
            return Ok(Dispatch::Middleware);
        }
        Ok(Dispatch::Command { name, outcome })
    }

    /// Dispatches events from `events` until the channel closes, then waits
    /// for the in-flight ones. A failing event is logged and does not stop
    /// the loop.
    pub async fn run(&self, mut events: mpsc::Receiver<Meta>) {
        let mut tasks = JoinSet::new();
        while let Some(meta) = events.recv().await {
            let app = self.clone();
            tasks.spawn(async move {
                let conversation = meta.conversation;
                if let Err(e) = app.dispatch(meta).await {
                    error!(%conversation, error = %e, "event dispatch failed");
                }
            });
            while let Some(joined) = tasks.try_join_next() {
                log_join(joined);
            }
        }
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
    }

    /// Finds the command a message invokes.
    ///
    /// Prefixed messages and private messages may name a command path;
    /// shortcuts are tried first and may also fire without a prefix.
    fn match_command(&self, meta: &Meta) -> Option<Target> {
        let text = meta.message.trim();
        let (body, prefixed) = self
            .inner
            .config
            .command
            .prefixes
            .iter()
            .find_map(|p| text.strip_prefix(p.as_str()))
            .map_or((text, false), |rest| (rest.trim_start(), true));

        let commands = self.inner.commands.read();

        if let Some(m) = commands.match_shortcut(body, prefixed) {
            if let Some(node) = commands.resolve_id(m.shortcut.command, meta) {
                debug!(command = node.name(), trigger = %m.shortcut.trigger, "shortcut matched");
                return Some(Target {
                    node: node.clone(),
                    line: m.rest.to_string(),
                    args: m.shortcut.args.clone(),
                    options: m.shortcut.options.clone(),
                });
            }
        }

        if !prefixed && meta.conversation.kind != IdentityKind::User {
            return None;
        }

        let (path, line) = body
            .split_once(char::is_whitespace)
            .map_or((body, ""), |(path, line)| (path, line.trim_start()));
        if path.is_empty() {
            return None;
        }

        let node = commands.resolve(path, meta)?;
        debug!(command = node.name(), path, "command resolved");
        Some(Target {
            node: node.clone(),
            line: line.to_string(),
            args: Vec::new(),
            options: BTreeMap::new(),
        })
    }

    fn matching_middleware(&self, meta: &Meta) -> Vec<Arc<dyn Middleware>> {
        self.inner
            .middleware
            .read()
            .iter()
            .filter(|r| r.context.matches(meta.conversation))
            .map(|r| Arc::clone(&r.middleware))
            .collect()
    }

    /// Registration order, stop at the first `Handled`. Errors count as `Next`.
    async fn run_middleware(&self, meta: &Meta) -> bool {
        for middleware in self.matching_middleware(meta) {
            let ctx = EventContext::new(meta.clone(), Arc::clone(&self.inner.transport));
            match middleware.handle(ctx).await {
                Ok(Flow::Handled) => return true,
                Ok(Flow::Next) => {}
                Err(e) => error!(conversation = %meta.conversation, error = %format!("{e:#}"), "middleware failed"),
            }
        }
        false
    }

    /// Every matching middleware at once; returns how many handled the event.
    async fn broadcast(&self, meta: &Meta) -> usize {
        let mut set = JoinSet::new();
        for middleware in self.matching_middleware(meta) {
            let ctx = EventContext::new(meta.clone(), Arc::clone(&self.inner.transport));
            set.spawn(async move { middleware.handle(ctx).await });
        }

        let mut handled = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(Flow::Handled)) => handled += 1,
                Ok(Ok(Flow::Next)) => {}
                Ok(Err(e)) => error!(post_type = ?meta.post_type, error = %format!("{e:#}"), "middleware failed"),
                Err(e) => warn!(error = %e, "middleware task did not complete"),
            }
        }
        handled
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "dispatch task did not complete");
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    config: AppConfig,
    transport: Arc<dyn Transport>,
    storage: Option<Arc<dyn Storage>>,
    parser: Arc<dyn LineParser>,
}

impl AppBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            config: AppConfig::default(),
            transport,
            storage: None,
            parser: Arc::new(DefaultParser),
        }
    }

    /// Uses a loaded configuration.
    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses another storage backend instead of [`MemoryStorage`].
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Uses another line parser instead of [`DefaultParser`].
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn LineParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Builds the app and registers built-in commands.
    ///
    /// # Errors
    ///
    /// [`RouterError::Command`] if a built-in command cannot be registered.
    pub fn build(self) -> Result<App, RouterError> {
        let storage: Arc<dyn Storage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new(self.config.command.default_authority)),
        };
        let hooks = Arc::new(RwLock::new(HookRegistry::new()));
        let pipeline = ExecutionPipeline::new(Arc::clone(&hooks), Arc::clone(&storage))
            .with_show_warning(self.config.command.show_warning);

        let commands = Arc::new(RwLock::new(CommandRegistry::new()));
        if self.config.command.help {
            help::register(&commands)?;
        }

        debug!(
            prefixes = ?self.config.command.prefixes,
            help = self.config.command.help,
            "app built"
        );

        Ok(App {
            inner: Arc::new(Inner {
                config: self.config,
                commands,
                hooks,
                middleware: RwLock::new(Vec::new()),
                storage,
                transport: self.transport,
                parser: self.parser,
                pipeline,
            }),
        })
    }
}
