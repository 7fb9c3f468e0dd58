//! Core types for herald.
//!
//! This crate holds the value types every other herald crate shares:
//! conversation identities, the scope algebra, storage records and the
//! error-code convention.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Plugin SDK Layer                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  herald-types   : Identity, ScopeSet, Context  ◄── HERE     │
//! │  herald-event   : Meta (inbound events)                     │
//! │  herald-hook    : Hook trait, HookRegistry                  │
//! │  herald-command : CommandRegistry, CommandNode, parser      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Runtime Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  herald-runtime : App (event routing), ExecutionPipeline    │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Frontend Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  herald-cli     : console driver                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use herald_types::{Context, Identity, IdentityKind};
//!
//! let groups = Context::everyone(IdentityKind::Group);
//! let without_spam = groups.minus(&Context::only(IdentityKind::Group, [666]));
//!
//! assert!(without_spam.matches(Identity::group(1)));
//! assert!(!without_spam.matches(Identity::group(666)));
//! assert!(!without_spam.matches(Identity::user(1)));
//! assert!(groups.contains(&without_spam));
//! ```

mod context;
mod error;
mod identity;
mod record;
mod scope;

pub use context::{Context, NOOP_IDENTIFIER};
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use identity::{Identity, IdentityKind};
pub use record::{FieldSet, GroupField, GroupRecord, UsageCount, UserField, UserRecord};
pub use scope::{ScopeParseError, ScopeSet};
