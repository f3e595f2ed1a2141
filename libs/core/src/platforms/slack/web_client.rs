use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use super::{
    ConversationPage, DEFAULT_SLACK_API_BASE, PostedMessage, SlackApi, SlackChannelObject,
};
use crate::types::ConversationChannel;

const PAGE_LIMIT: &str = "200";

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("{method}: transport error: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method}: got status {status}: {body}")]
    Status {
        method: &'static str,
        status: StatusCode,
        body: String,
    },
    /// Slack answered `ok: false`; `error` is Slack's error code.
    #[error("{method}: slack error {error}")]
    Api { method: &'static str, error: String },
    #[error("{method}: unexpected response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Slack Web API client authenticated with a bot token.
#[derive(Clone)]
pub struct SlackWebClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

#[derive(Deserialize)]
struct ChannelResponse {
    channel: SlackChannelObject,
}

#[derive(Deserialize)]
struct PurposeResponse {
    #[serde(default)]
    channel: Option<SlackChannelObject>,
    #[serde(default)]
    purpose: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Deserialize)]
struct ConversationsResponse {
    #[serde(default)]
    channels: Vec<SlackChannelObject>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    channel: String,
    ts: String,
}

impl SlackWebClient {
    pub fn new(
        http: reqwest::Client,
        bot_token: impl Into<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.unwrap_or_else(|| DEFAULT_SLACK_API_BASE.into()),
            bot_token: bot_token.into(),
        }
    }

    fn build_url(&self, method: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            method.trim_start_matches('/')
        )
    }

    async fn post_json<T>(&self, method: &'static str, payload: Value) -> Result<T, SlackApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.post(self.build_url(method)).json(&payload);
        self.execute(method, request).await
    }

    async fn get<T>(&self, method: &'static str, query: &[(&str, &str)]) -> Result<T, SlackApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.get(self.build_url(method)).query(query);
        self.execute(method, request).await
    }

    async fn execute<T>(
        &self,
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SlackApiError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .map_err(|source| SlackApiError::Transport { method, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| SlackApiError::Transport { method, source })?;
        if !status.is_success() {
            return Err(SlackApiError::Status {
                method,
                status,
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|source| SlackApiError::Decode { method, source })?;
        if value.get("ok").and_then(Value::as_bool) != Some(true) {
            let error = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            return Err(SlackApiError::Api { method, error });
        }
        serde_json::from_value(value).map_err(|source| SlackApiError::Decode { method, source })
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn create_conversation(&self, name: &str) -> Result<ConversationChannel, SlackApiError> {
        let response: ChannelResponse = self
            .post_json("conversations.create", json!({ "name": name }))
            .await?;
        Ok(response.channel.into())
    }

    async fn invite_user(&self, channel_id: &str, user_id: &str) -> Result<(), SlackApiError> {
        let _: Value = self
            .post_json(
                "conversations.invite",
                json!({ "channel": channel_id, "users": user_id }),
            )
            .await?;
        Ok(())
    }

    async fn set_purpose(
        &self,
        channel_id: &str,
        purpose: &str,
    ) -> Result<ConversationChannel, SlackApiError> {
        let response: PurposeResponse = self
            .post_json(
                "conversations.setPurpose",
                json!({ "channel": channel_id, "purpose": purpose }),
            )
            .await?;
        // Older responses only echo the purpose string.
        let channel = match response.channel {
            Some(channel) => channel.into(),
            None => ConversationChannel::new(
                channel_id,
                String::new(),
                response.purpose.unwrap_or_else(|| purpose.to_string()),
            ),
        };
        Ok(channel)
    }

    async fn conversations_for_user(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<ConversationPage, SlackApiError> {
        let mut query = vec![
            ("user", user_id),
            ("exclude_archived", "true"),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }
        let response: ConversationsResponse = self.get("users.conversations", &query).await?;
        let next_cursor = response
            .response_metadata
            .map(|meta| meta.next_cursor)
            .filter(|cursor| !cursor.trim().is_empty());
        Ok(ConversationPage {
            channels: response.channels.into_iter().map(Into::into).collect(),
            next_cursor,
        })
    }

    async fn post_message_as(
        &self,
        channel_id: &str,
        text: &str,
        username: &str,
    ) -> Result<PostedMessage, SlackApiError> {
        let response: PostMessageResponse = self
            .post_json(
                "chat.postMessage",
                json!({
                    "channel": channel_id,
                    "text": text,
                    "username": username,
                }),
            )
            .await?;
        Ok(PostedMessage {
            channel: response.channel,
            ts: response.ts,
        })
    }

    async fn conversation_info(
        &self,
        channel_id: &str,
    ) -> Result<ConversationChannel, SlackApiError> {
        let response: ChannelResponse = self
            .get("conversations.info", &[("channel", channel_id)])
            .await?;
        Ok(response.channel.into())
    }
}
