//! Reply transports.

pub use herald_command::{Transport, TransportError};

use async_trait::async_trait;
use herald_types::Identity;
use parking_lot::Mutex;

/// Transport that keeps every message in memory.
///
/// Useful for tests and for embedding the router where replies are
/// collected rather than sent.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(Identity, String)>>,
}

impl RecordingTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(Identity, String)> {
        self.sent.lock().clone()
    }

    /// Texts sent to `to`, in order.
    #[must_use]
    pub fn sent_to(&self, to: Identity) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(target, _)| *target == to)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Drains the recorded messages.
    pub fn take(&self) -> Vec<(Identity, String)> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, to: Identity, text: &str) -> Result<(), TransportError> {
        self.sent.lock().push((to, text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let transport = RecordingTransport::new();
        transport.send(Identity::group(1), "a").await.unwrap();
        transport.send(Identity::user(2), "b").await.unwrap();
        transport.send(Identity::group(1), "c").await.unwrap();

        assert_eq!(transport.sent_to(Identity::group(1)), vec!["a", "c"]);
        assert_eq!(transport.take().len(), 3);
        assert!(transport.sent().is_empty());
    }
}
