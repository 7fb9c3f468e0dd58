//! Console transport and line parsing.
//!
//! Each input line is one message. A leading `kind:id[@user]` token picks
//! the conversation and sender:
//!
//! ```text
//! group:100@42 !echo hi     group 100, user 42
//! user:7 whoami             private chat with user 7
//! !echo hi                  default conversation and user
//! ```

use async_trait::async_trait;
use herald_command::{Flow, Invocation, Transport, TransportError};
use herald_event::Meta;
use herald_runtime::{App, EventContext};
use herald_types::{Context, Identity, IdentityKind, UserField};

/// Transport that prints replies to stdout as `[kind:id] text`.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, to: Identity, text: &str) -> Result<(), TransportError> {
        println!("[{to}] {text}");
        Ok(())
    }
}

/// Where lines without a header come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub conversation: Identity,
    pub user: u64,
}

impl Origin {
    /// Private chat with `user`, or `user` speaking in `group`.
    pub fn new(user: u64, group: Option<u64>) -> Self {
        let conversation = group.map_or(Identity::user(user), Identity::group);
        Self { conversation, user }
    }
}

/// Turns an input line into a message event.
///
/// Returns `None` for blank lines.
pub fn parse_line(line: &str, origin: Origin) -> Option<Meta> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let Some((conversation, user)) = parse_header(head) else {
        return Some(Meta::message(origin.conversation, origin.user, line));
    };
    let user = user.unwrap_or(match conversation.kind {
        IdentityKind::User => conversation.id,
        _ => origin.user,
    });
    Some(Meta::message(conversation, user, rest.trim_start()))
}

fn parse_header(head: &str) -> Option<(Identity, Option<u64>)> {
    let (conversation, user) = match head.split_once('@') {
        Some((conversation, user)) => (conversation, Some(user.parse().ok()?)),
        None => (head, None),
    };
    Some((conversation.parse().ok()?, user))
}

/// Registers the commands the console ships with.
pub fn register_builtins(app: &App) -> anyhow::Result<()> {
    let mut commands = app.commands();

    commands
        .command(&Context::all(), "echo <message:text>")?
        .description("repeat a message")
        .action(|inv: Invocation| async move {
            inv.reply(inv.arg(0).unwrap_or_default()).await?;
            anyhow::Ok(Flow::Handled)
        });

    commands
        .command(&Context::all(), "whoami")?
        .description("show your user id and authority")
        .user_fields([UserField::Name, UserField::Authority])
        .action(|inv: Invocation| async move {
            let text = match &inv.user {
                Some(user) => match &user.name {
                    Some(name) => format!("{name} ({}), authority {}", user.id, user.authority),
                    None => format!("user {}, authority {}", user.id, user.authority),
                },
                None => "anonymous".to_string(),
            };
            inv.reply(text).await?;
            anyhow::Ok(Flow::Handled)
        });
    drop(commands);

    app.middleware(
        &Context::everyone(IdentityKind::User),
        |ctx: EventContext| async move {
            ctx.reply("unknown command, send \"help\" for a list").await?;
            anyhow::Ok(Flow::Handled)
        },
    );

    Ok(())
}
