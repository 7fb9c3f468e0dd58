//! Command tree and line parsing for herald.
//!
//! A command is registered under a [`Context`](herald_types::Context) with a
//! definition string `path decl...`:
//!
//! ```
//! use herald_command::{CommandConfigPatch, CommandRegistry, Flow, Invocation, OptionConfig};
//! use herald_types::{Context, IdentityKind};
//!
//! let mut registry = CommandRegistry::new();
//! let groups = Context::everyone(IdentityKind::Group);
//!
//! registry
//!     .command_with(&groups, "roll <dice>", CommandConfigPatch::new().max_usage(20))?
//!     .alias("r")?
//!     .option("-t, --times <n:integer>  roll several times", OptionConfig::default())?
//!     .action(|inv: Invocation| async move {
//!         inv.reply(format!("rolling {}", inv.arg(0).unwrap_or_default())).await?;
//!         anyhow::Ok(Flow::Handled)
//!     });
//!
//! assert_eq!(registry.find("r").map(|c| c.name()), Some("roll"));
//! # Ok::<(), herald_command::CommandError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | registry | [`CommandRegistry`], [`CommandBuilder`], shortcuts |
//! | node | [`CommandNode`], field requirements |
//! | config | [`CommandConfig`], [`CommandConfigPatch`], [`Threshold`] |
//! | declaration | positional [`ArgDecl`] grammar |
//! | option | [`OptionDecl`] flag grammar and values |
//! | parser | [`LineParser`], [`DefaultParser`] |
//! | invocation | [`Invocation`], [`CommandAction`], [`Transport`] |

mod config;
mod declaration;
mod error;
mod invocation;
mod node;
mod option;
mod parser;
mod registry;

pub use config::{CommandConfig, CommandConfigPatch, DisablePredicate, Threshold};
pub use declaration::{parse_declarations, split_definition, ArgDecl};
pub use error::{CommandError, ParseError};
pub use invocation::{CommandAction, Flow, Invocation, Transport, TransportError};
pub use node::{CommandId, CommandNode};
pub use option::{Flag, OptionConfig, OptionDecl, OptionValue, Validator, ValueKind, ValueSpec};
pub use parser::{DefaultParser, LineParser, ParsedLine};
pub use registry::{
    CommandBuilder, CommandObserver, CommandRegistry, Shortcut, ShortcutConfig, ShortcutMatch,
};
