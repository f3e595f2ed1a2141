//! In-memory doubles for the platform clients.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Mutex;

use crate::platforms::slack::{ConversationPage, PostedMessage, SlackApi, SlackApiError};
use crate::platforms::whatsapp::{GraphApiError, WhatsappApi};
use crate::types::ConversationChannel;

const SIMULATED_ERROR: &str = "simulated_failure";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedText {
    pub channel: String,
    pub text: String,
    pub username: String,
}

#[derive(Debug, Clone)]
struct StoredChannel {
    channel: ConversationChannel,
    members: Vec<String>,
}

#[derive(Default)]
struct SlackState {
    channels: Vec<StoredChannel>,
    calls: Vec<&'static str>,
    posted: Vec<PostedText>,
    failing: HashSet<&'static str>,
    next_id: usize,
}

/// Slack workspace kept in memory.
///
/// Every API call is recorded by method name; methods listed through
/// [`InMemorySlack::fail_method`] answer with `ok: false`.
#[derive(Clone)]
pub struct InMemorySlack {
    state: Arc<Mutex<SlackState>>,
    page_size: usize,
}

impl Default for InMemorySlack {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySlack {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            page_size: 100,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seeds a channel that `members` already belong to.
    pub async fn add_channel(&self, channel: ConversationChannel, members: &[&str]) {
        let mut state = self.state.lock().await;
        state.channels.push(StoredChannel {
            channel,
            members: members.iter().map(|m| m.to_string()).collect(),
        });
    }

    pub async fn fail_method(&self, method: &'static str) {
        self.state.lock().await.failing.insert(method);
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.state.lock().await.calls.clone()
    }

    pub async fn count_calls(&self, method: &str) -> usize {
        let state = self.state.lock().await;
        state.calls.iter().filter(|call| **call == method).count()
    }

    pub async fn take_posted(&self) -> Vec<PostedText> {
        let mut guard = self.state.lock().await;
        std::mem::take(&mut guard.posted)
    }

    pub async fn channels(&self) -> Vec<ConversationChannel> {
        let state = self.state.lock().await;
        state.channels.iter().map(|c| c.channel.clone()).collect()
    }

    pub async fn members(&self, channel_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .channels
            .iter()
            .find(|c| c.channel.id == channel_id)
            .map(|c| c.members.clone())
            .unwrap_or_default()
    }

    async fn begin(&self, method: &'static str) -> Result<(), SlackApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(method);
        if state.failing.contains(method) {
            return Err(SlackApiError::Api {
                method,
                error: SIMULATED_ERROR.into(),
            });
        }
        Ok(())
    }

    fn not_found(method: &'static str) -> SlackApiError {
        SlackApiError::Api {
            method,
            error: "channel_not_found".into(),
        }
    }
}

#[async_trait]
impl SlackApi for InMemorySlack {
    async fn create_conversation(&self, name: &str) -> Result<ConversationChannel, SlackApiError> {
        self.begin("conversations.create").await?;
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let channel = ConversationChannel::new(format!("C{:04}", state.next_id), name, "");
        state.channels.push(StoredChannel {
            channel: channel.clone(),
            members: Vec::new(),
        });
        Ok(channel)
    }

    async fn invite_user(&self, channel_id: &str, user_id: &str) -> Result<(), SlackApiError> {
        self.begin("conversations.invite").await?;
        let mut state = self.state.lock().await;
        let stored = state
            .channels
            .iter_mut()
            .find(|c| c.channel.id == channel_id)
            .ok_or_else(|| Self::not_found("conversations.invite"))?;
        stored.members.push(user_id.to_string());
        Ok(())
    }

    async fn set_purpose(
        &self,
        channel_id: &str,
        purpose: &str,
    ) -> Result<ConversationChannel, SlackApiError> {
        self.begin("conversations.setPurpose").await?;
        let mut state = self.state.lock().await;
        let stored = state
            .channels
            .iter_mut()
            .find(|c| c.channel.id == channel_id)
            .ok_or_else(|| Self::not_found("conversations.setPurpose"))?;
        stored.channel.metadata = purpose.to_string();
        Ok(stored.channel.clone())
    }

    async fn conversations_for_user(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<ConversationPage, SlackApiError> {
        self.begin("users.conversations").await?;
        // Let concurrent resolutions interleave between listing and creating.
        tokio::task::yield_now().await;
        let state = self.state.lock().await;
        let mine: Vec<ConversationChannel> = state
            .channels
            .iter()
            .filter(|c| c.members.iter().any(|m| m == user_id))
            .map(|c| c.channel.clone())
            .collect();
        let start = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(mine.len());
        let channels = mine.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_cursor = (end < mine.len()).then(|| end.to_string());
        Ok(ConversationPage {
            channels,
            next_cursor,
        })
    }

    async fn post_message_as(
        &self,
        channel_id: &str,
        text: &str,
        username: &str,
    ) -> Result<PostedMessage, SlackApiError> {
        self.begin("chat.postMessage").await?;
        let mut state = self.state.lock().await;
        state.posted.push(PostedText {
            channel: channel_id.to_string(),
            text: text.to_string(),
            username: username.to_string(),
        });
        Ok(PostedMessage {
            channel: channel_id.to_string(),
            ts: format!("{}.000100", state.posted.len()),
        })
    }

    async fn conversation_info(
        &self,
        channel_id: &str,
    ) -> Result<ConversationChannel, SlackApiError> {
        self.begin("conversations.info").await?;
        let state = self.state.lock().await;
        state
            .channels
            .iter()
            .find(|c| c.channel.id == channel_id)
            .map(|c| c.channel.clone())
            .ok_or_else(|| Self::not_found("conversations.info"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub business_phone_number_id: String,
    pub to: String,
    pub body: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceipt {
    pub business_phone_number_id: String,
    pub message_id: String,
}

#[derive(Default)]
struct WhatsappState {
    sent: Vec<SentText>,
    read: Vec<ReadReceipt>,
    fail_send: bool,
    fail_mark_read: bool,
}

/// Records outgoing Graph API calls instead of performing them.
#[derive(Clone, Default)]
pub struct RecordingWhatsapp {
    state: Arc<Mutex<WhatsappState>>,
}

impl RecordingWhatsapp {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_send(&self) {
        self.state.lock().await.fail_send = true;
    }

    pub async fn fail_mark_read(&self) {
        self.state.lock().await.fail_mark_read = true;
    }

    pub async fn take_sent(&self) -> Vec<SentText> {
        let mut guard = self.state.lock().await;
        std::mem::take(&mut guard.sent)
    }

    pub async fn take_read(&self) -> Vec<ReadReceipt> {
        let mut guard = self.state.lock().await;
        std::mem::take(&mut guard.read)
    }

    fn simulated() -> GraphApiError {
        GraphApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: SIMULATED_ERROR.into(),
        }
    }
}

#[async_trait]
impl WhatsappApi for RecordingWhatsapp {
    async fn send_text(
        &self,
        business_phone_number_id: &str,
        to: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), GraphApiError> {
        let mut state = self.state.lock().await;
        if state.fail_send {
            return Err(Self::simulated());
        }
        state.sent.push(SentText {
            business_phone_number_id: business_phone_number_id.to_string(),
            to: to.to_string(),
            body: body.to_string(),
            reply_to: reply_to.map(str::to_string),
        });
        Ok(())
    }

    async fn mark_as_read(
        &self,
        business_phone_number_id: &str,
        message_id: &str,
    ) -> Result<(), GraphApiError> {
        let mut state = self.state.lock().await;
        if state.fail_mark_read {
            return Err(Self::simulated());
        }
        state.read.push(ReadReceipt {
            business_phone_number_id: business_phone_number_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }
}
