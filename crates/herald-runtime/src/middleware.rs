//! Event middleware.

use async_trait::async_trait;
use herald_command::{Flow, Transport, TransportError};
use herald_event::Meta;
use std::future::Future;
use std::sync::Arc;

/// What a middleware sees of an event.
#[derive(Clone)]
pub struct EventContext {
    /// The event.
    pub meta: Meta,
    transport: Arc<dyn Transport>,
}

impl EventContext {
    /// Wraps an event.
    #[must_use]
    pub fn new(meta: Meta, transport: Arc<dyn Transport>) -> Self {
        Self { meta, transport }
    }

    /// Replies in the event's conversation.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the transport.
    pub async fn reply(&self, text: impl Into<String>) -> Result<(), TransportError> {
        let text = text.into();
        self.transport.send(self.meta.conversation, &text).await
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Handler for events that no command consumed.
///
/// For messages, middleware runs in registration order until one returns
/// [`Flow::Handled`]. Other events reach every matching middleware at once.
///
/// Closures implement this:
///
/// ```
/// use herald_command::Flow;
/// use herald_runtime::{EventContext, Middleware};
///
/// fn assert_middleware<M: Middleware>(_: M) {}
///
/// assert_middleware(|ctx: EventContext| async move {
///     if ctx.meta.message.contains("hello") {
///         ctx.reply("hi").await?;
///         return anyhow::Ok(Flow::Handled);
///     }
///     Ok(Flow::Next)
/// });
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handles an event.
    async fn handle(&self, ctx: EventContext) -> anyhow::Result<Flow>;
}

#[async_trait]
impl<F, Fut> Middleware for F
where
    F: Fn(EventContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Flow>> + Send + 'static,
{
    async fn handle(&self, ctx: EventContext) -> anyhow::Result<Flow> {
        (self)(ctx).await
    }
}
