use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use super::{DEFAULT_GRAPH_API_BASE, MarkReadRequest, OutboundTextMessage, WhatsappApi};

#[derive(Debug, Error)]
pub enum GraphApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("got status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Graph API client authenticated with a system-user bearer token.
#[derive(Clone)]
pub struct GraphApiSender {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GraphApiSender {
    pub fn new(http: reqwest::Client, token: impl Into<String>, api_base: Option<String>) -> Self {
        let base = api_base.unwrap_or_else(|| DEFAULT_GRAPH_API_BASE.into());
        Self {
            http,
            api_base: base.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn build_url(&self, business_phone_number_id: &str) -> String {
        format!("{}/{}/messages", self.api_base, business_phone_number_id)
    }

    async fn post_messages<T>(
        &self,
        business_phone_number_id: &str,
        payload: &T,
    ) -> Result<(), GraphApiError>
    where
        T: Serialize + Sync,
    {
        let response = self
            .http
            .post(self.build_url(business_phone_number_id))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphApiError::Status { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl WhatsappApi for GraphApiSender {
    async fn send_text(
        &self,
        business_phone_number_id: &str,
        to: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), GraphApiError> {
        let message = OutboundTextMessage::new(to, body, reply_to);
        tracing::debug!(
            phone_number_id = %business_phone_number_id,
            to = %to,
            "sending whatsapp text message"
        );
        self.post_messages(business_phone_number_id, &message).await
    }

    async fn mark_as_read(
        &self,
        business_phone_number_id: &str,
        message_id: &str,
    ) -> Result<(), GraphApiError> {
        let request = MarkReadRequest::new(message_id);
        self.post_messages(business_phone_number_id, &request).await
    }
}
