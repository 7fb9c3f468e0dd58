//! Command actions, the invocation record and the reply transport.

use crate::{OptionValue, ParsedLine};
use async_trait::async_trait;
use herald_event::Meta;
use herald_types::{ErrorCode, GroupRecord, Identity, UserRecord};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Stop here.
    Handled,
    /// Fall through to the next handler in the chain.
    Next,
}

/// Bound body of a command.
///
/// Plain async closures implement this:
///
/// ```
/// use herald_command::{CommandAction, Flow, Invocation};
///
/// fn assert_action<A: CommandAction>(_: A) {}
///
/// assert_action(|inv: Invocation| async move {
///     inv.reply(format!("pong {}", inv.args.join(" "))).await?;
///     anyhow::Ok(Flow::Handled)
/// });
/// ```
#[async_trait]
pub trait CommandAction: Send + Sync {
    /// Runs the command. Returning [`Flow::Next`] hands the event on.
    async fn run(&self, inv: Invocation) -> anyhow::Result<Flow>;
}

#[async_trait]
impl<F, Fut> CommandAction for F
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Flow>> + Send + 'static,
{
    async fn run(&self, inv: Invocation) -> anyhow::Result<Flow> {
        (self)(inv).await
    }
}

/// Failure to deliver a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection is gone.
    #[error("transport closed")]
    Closed,

    /// The platform refused the message.
    #[error("message to {to} rejected: {reason}")]
    Rejected {
        /// Destination conversation.
        to: Identity,
        /// Platform reason.
        reason: String,
    },

    /// Local I/O failure.
    #[error("transport I/O error: {0}")]
    Io(String),
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Closed => "TRANSPORT_CLOSED",
            Self::Rejected { .. } => "TRANSPORT_REJECTED",
            Self::Io(_) => "TRANSPORT_IO",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Outbound message channel to the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `text` to a conversation.
    async fn send(&self, to: Identity, text: &str) -> Result<(), TransportError>;
}

/// One execution of a command.
#[derive(Clone)]
pub struct Invocation {
    /// Triggering event.
    pub meta: Meta,
    /// Resolved command name.
    pub command: String,
    /// Positional values.
    pub args: Vec<String>,
    /// Options by canonical name.
    pub options: BTreeMap<String, OptionValue>,
    /// Undeclared option names.
    pub unknown: Vec<String>,
    /// Raw text after `--`.
    pub rest: String,
    /// Caller's record with the requested fields.
    pub user: Option<UserRecord>,
    /// Conversation group's record, for group events.
    pub group: Option<GroupRecord>,
    transport: Arc<dyn Transport>,
}

impl Invocation {
    /// Builds an invocation from a parsed line.
    #[must_use]
    pub fn new(
        meta: Meta,
        command: impl Into<String>,
        parsed: ParsedLine,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            meta,
            command: command.into(),
            args: parsed.args,
            options: parsed.options,
            unknown: parsed.unknown,
            rest: parsed.rest,
            user: None,
            group: None,
            transport,
        }
    }

    /// Attaches the caller's record.
    #[must_use]
    pub fn with_user(mut self, user: Option<UserRecord>) -> Self {
        self.user = user;
        self
    }

    /// Attaches the group record.
    #[must_use]
    pub fn with_group(mut self, group: Option<GroupRecord>) -> Self {
        self.group = group;
        self
    }

    /// Positional value `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Option by canonical name.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Returns `true` if a boolean option is set.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.option(name).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    /// Replies in the originating conversation.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the transport.
    pub async fn reply(&self, text: impl Into<String>) -> Result<(), TransportError> {
        let text = text.into();
        self.transport.send(self.meta.conversation, &text).await
    }

    /// The transport replies go through.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Hook payload: `{"args": [...], "options": {...}}`.
    #[must_use]
    pub fn payload(&self) -> Value {
        json!({
            "args": self.args,
            "options": self.options,
            "unknown": self.unknown,
        })
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.command)
            .field("conversation", &self.meta.conversation)
            .field("args", &self.args)
            .field("options", &self.options)
            .field("unknown", &self.unknown)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::assert_error_codes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sink(Mutex<Vec<(Identity, String)>>);

    #[async_trait]
    impl Transport for Sink {
        async fn send(&self, to: Identity, text: &str) -> Result<(), TransportError> {
            self.0.lock().unwrap().push((to, text.to_string()));
            Ok(())
        }
    }

    fn invocation(sink: Arc<Sink>) -> Invocation {
        let mut parsed = ParsedLine {
            args: vec!["2d6".into()],
            ..ParsedLine::default()
        };
        parsed.options.insert("silent".into(), OptionValue::Bool(true));
        Invocation::new(Meta::group_message(100, 7, "roll 2d6 -s"), "roll", parsed, sink)
    }

    #[tokio::test]
    async fn reply_goes_to_conversation() {
        let sink = Arc::new(Sink::default());
        let inv = invocation(Arc::clone(&sink));
        inv.reply("rolled 7").await.unwrap();

        let sent = sink.0.lock().unwrap();
        assert_eq!(sent.as_slice(), [(Identity::group(100), "rolled 7".to_string())]);
    }

    #[tokio::test]
    async fn closures_are_actions() {
        let sink = Arc::new(Sink::default());
        let action = |inv: Invocation| async move {
            let flow = if inv.flag("silent") {
                Flow::Next
            } else {
                Flow::Handled
            };
            anyhow::Ok(flow)
        };
        let flow = action.run(invocation(sink)).await.unwrap();
        assert_eq!(flow, Flow::Next);
    }

    #[test]
    fn accessors_and_payload() {
        let inv = invocation(Arc::new(Sink::default()));
        assert_eq!(inv.arg(0), Some("2d6"));
        assert_eq!(inv.arg(1), None);
        assert!(inv.flag("silent"));
        assert!(!inv.flag("loud"));
        assert_eq!(inv.payload()["args"], json!(["2d6"]));
        assert_eq!(inv.payload()["options"]["silent"], json!(true));
    }

    #[test]
    fn transport_error_codes() {
        assert_error_codes(
            &[
                TransportError::Closed,
                TransportError::Rejected {
                    to: Identity::user(1),
                    reason: "muted".into(),
                },
                TransportError::Io("broken pipe".into()),
            ],
            "TRANSPORT_",
        );
    }
}
