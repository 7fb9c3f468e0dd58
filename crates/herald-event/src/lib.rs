//! Inbound event model for herald.
//!
//! The chat platform's wire protocol is out of scope; adapters translate it
//! into [`Meta`], which carries exactly what routing needs: the event kind,
//! the conversation it happened in, the sender and the message text.
//!
//! # Routing Flow
//!
//! ```text
//! platform adapter
//!     │ Meta { post_type: Message, conversation: group:100, user_id: 42 }
//!     ▼
//! ┌─────────────────┐
//! │  App::dispatch  │  Context::matches(meta.conversation)
//! └─────────────────┘
//!     │
//!     ├── Message       → serial, stop at first handler that handles it
//!     └── Notice / ...  → every matching handler, concurrently
//! ```
//!
//! # Example
//!
//! ```
//! use herald_event::{Meta, PostType};
//! use herald_types::Identity;
//!
//! let meta = Meta::group_message(100, 42, "!echo hi");
//! assert_eq!(meta.post_type, PostType::Message);
//! assert_eq!(meta.conversation, Identity::group(100));
//! assert_eq!(meta.user_id, Some(42));
//! ```

mod meta;

pub use meta::{Meta, PostType};

// Re-export from herald_types for convenience
pub use herald_types::{Identity, IdentityKind};
