//! Slack Web API surface used by the relay.

mod web_client;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::ConversationChannel;

pub use web_client::{SlackApiError, SlackWebClient};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// One page of `users.conversations`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPage {
    pub channels: Vec<ConversationChannel>,
    /// Cursor for the next page; `None` once the listing is exhausted.
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn create_conversation(&self, name: &str) -> Result<ConversationChannel, SlackApiError>;

    async fn invite_user(&self, channel_id: &str, user_id: &str) -> Result<(), SlackApiError>;

    /// Sets the channel purpose and returns the updated channel.
    async fn set_purpose(
        &self,
        channel_id: &str,
        purpose: &str,
    ) -> Result<ConversationChannel, SlackApiError>;

    /// Lists non-archived conversations `user_id` belongs to, one page at a time.
    async fn conversations_for_user(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<ConversationPage, SlackApiError>;

    /// Posts `text` with `username` shown as the author instead of the bot name.
    async fn post_message_as(
        &self,
        channel_id: &str,
        text: &str,
        username: &str,
    ) -> Result<PostedMessage, SlackApiError>;

    async fn conversation_info(&self, channel_id: &str)
    -> Result<ConversationChannel, SlackApiError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SlackTextValue {
    #[serde(default)]
    pub value: String,
}

/// Channel object as returned by the `conversations.*` methods.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackChannelObject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub purpose: Option<SlackTextValue>,
}

impl From<SlackChannelObject> for ConversationChannel {
    fn from(channel: SlackChannelObject) -> Self {
        ConversationChannel {
            id: channel.id,
            name: channel.name,
            metadata: channel.purpose.map(|p| p.value).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_object_maps_purpose_to_metadata() {
        let raw = serde_json::json!({
            "id": "C123",
            "name": "bob-40742123123",
            "is_archived": false,
            "purpose": {"value": "{\"name\":\"Bob\"}", "creator": "U1", "last_set": 0}
        });
        let channel: SlackChannelObject = serde_json::from_value(raw).unwrap();
        let channel = ConversationChannel::from(channel);
        assert_eq!(channel.id, "C123");
        assert_eq!(channel.metadata, "{\"name\":\"Bob\"}");
    }

    #[test]
    fn channel_without_purpose_has_empty_metadata() {
        let channel: SlackChannelObject =
            serde_json::from_value(serde_json::json!({"id": "C9"})).unwrap();
        assert_eq!(ConversationChannel::from(channel).metadata, "");
    }
}
