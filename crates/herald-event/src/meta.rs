//! Event metadata.

use herald_types::Identity;
use serde::{Deserialize, Serialize};

/// Top-level event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    /// A chat message; may carry a command invocation.
    Message,
    /// Membership, upload and similar notifications.
    Notice,
    /// Friend or group join requests.
    Request,
    /// Heartbeats and lifecycle events of the platform connection.
    MetaEvent,
}

impl PostType {
    /// Returns `true` if handlers run one after another until one handles
    /// the event. Every other kind fans out to all matching handlers.
    #[must_use]
    pub fn is_serial(&self) -> bool {
        matches!(self, Self::Message)
    }
}

/// A routed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Event kind.
    pub post_type: PostType,
    /// Conversation the event belongs to; contexts match against this.
    pub conversation: Identity,
    /// Acting user, when there is one.
    pub user_id: Option<u64>,
    /// The bot account that received the event.
    #[serde(default)]
    pub self_id: u64,
    /// Message text (empty for non-message events).
    #[serde(default)]
    pub message: String,
    /// Platform-specific refinement of `post_type`.
    #[serde(default)]
    pub sub_type: Option<String>,
}

impl Meta {
    /// Message event in an arbitrary conversation.
    #[must_use]
    pub fn message(conversation: Identity, user_id: u64, text: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Message,
            conversation,
            user_id: Some(user_id),
            self_id: 0,
            message: text.into(),
            sub_type: None,
        }
    }

    /// Private message from `user_id`.
    #[must_use]
    pub fn private_message(user_id: u64, text: impl Into<String>) -> Self {
        Self::message(Identity::user(user_id), user_id, text)
    }

    /// Message from `user_id` in group `group_id`.
    #[must_use]
    pub fn group_message(group_id: u64, user_id: u64, text: impl Into<String>) -> Self {
        Self::message(Identity::group(group_id), user_id, text)
    }

    /// Message from `user_id` in discuss `discuss_id`.
    #[must_use]
    pub fn discuss_message(discuss_id: u64, user_id: u64, text: impl Into<String>) -> Self {
        Self::message(Identity::discuss(discuss_id), user_id, text)
    }

    /// Notice event in `conversation`.
    #[must_use]
    pub fn notice(conversation: Identity, sub_type: impl Into<String>) -> Self {
        Self {
            post_type: PostType::Notice,
            conversation,
            user_id: None,
            self_id: 0,
            message: String::new(),
            sub_type: Some(sub_type.into()),
        }
    }

    /// Sets the receiving bot account.
    #[must_use]
    pub fn with_self_id(mut self, self_id: u64) -> Self {
        self.self_id = self_id;
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Returns `true` for message events.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.post_type == PostType::Message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::IdentityKind;

    #[test]
    fn private_message_targets_user() {
        let meta = Meta::private_message(42, "hi");
        assert_eq!(meta.conversation, Identity::user(42));
        assert_eq!(meta.user_id, Some(42));
        assert!(meta.is_message());
    }

    #[test]
    fn discuss_message_targets_discuss() {
        let meta = Meta::discuss_message(9, 1, "hi");
        assert_eq!(meta.conversation.kind, IdentityKind::Discuss);
    }

    #[test]
    fn notice_has_no_user() {
        let meta = Meta::notice(Identity::group(1), "group_increase").with_user(5);
        assert_eq!(meta.post_type, PostType::Notice);
        assert_eq!(meta.user_id, Some(5));
        assert!(!meta.post_type.is_serial());
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_value(PostType::MetaEvent).unwrap();
        assert_eq!(json, serde_json::json!("meta_event"));
    }
}
