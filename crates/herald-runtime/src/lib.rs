//! herald runtime: the parts that execute commands.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Plugin-facing Layer                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  herald-types   : Identity, Context, records, ErrorCode     │
//! │  herald-event   : Meta, PostType                            │
//! │  herald-hook    : Hook, HookPoint, HookRegistry             │
//! │  herald-command : CommandRegistry, CommandNode, parser      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  app        : App, AppBuilder, event routing                │
//! │  pipeline   : ExecutionPipeline, Outcome                    │
//! │  gate       : Rejection, authority and usage checks         │
//! │  storage    : Storage trait, MemoryStorage                  │
//! │  middleware : Middleware trait, EventContext                │
//! │  config     : AppConfig, ConfigLoader                       │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Frontend Layer (herald-cli)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Dispatch
//!
//! Message events try commands first: a configured prefix (or a private
//! conversation) lets the first word name a command path, and shortcuts
//! may match with or without a prefix. A resolved command is parsed, the
//! user and group fields it needs are loaded, and the
//! [`ExecutionPipeline`] runs its checks and action. When no command
//! matched, or the action returned [`Flow::Next`](herald_command::Flow),
//! middleware runs in registration order until one handles the message.
//!
//! Every other event kind is handed to all matching middleware at once.
//!
//! # Errors
//!
//! Rejected invocations are [`Outcome::Rejected`] values, not errors.
//! Storage failures and failing actions surface as [`RouterError`];
//! [`App::run`] logs them and keeps serving.

pub mod config;

mod app;
mod error;
mod gate;
mod help;
mod middleware;
mod pipeline;
mod storage;
mod transport;

pub use app::{App, AppBuilder, Dispatch};
pub use error::RouterError;
pub use gate::{check_authority_and_usage, Rejection};
pub use middleware::{EventContext, Middleware};
pub use pipeline::{ExecutionPipeline, Outcome};
pub use storage::{Clock, MemoryStorage, Storage, StorageError, UsageLimits};
pub use transport::{RecordingTransport, Transport, TransportError};
