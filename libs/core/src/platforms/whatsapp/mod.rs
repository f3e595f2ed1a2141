//! WhatsApp Cloud API surface used by the relay.

mod sender;

use async_trait::async_trait;
use serde::Serialize;

pub use sender::{GraphApiError, GraphApiSender};

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v20.0";

#[async_trait]
pub trait WhatsappApi: Send + Sync {
    /// Sends a plain text message from `business_phone_number_id` to `to`.
    ///
    /// `reply_to` threads the message under an earlier WhatsApp message id.
    async fn send_text(
        &self,
        business_phone_number_id: &str,
        to: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), GraphApiError>;

    async fn mark_as_read(
        &self,
        business_phone_number_id: &str,
        message_id: &str,
    ) -> Result<(), GraphApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyContext {
    pub message_id: String,
}

/// Body of `POST /{phone_number_id}/messages` for a text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundTextMessage {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ReplyContext>,
}

impl OutboundTextMessage {
    pub fn new(to: impl Into<String>, body: impl Into<String>, reply_to: Option<&str>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: to.into(),
            kind: "text",
            text: TextBody { body: body.into() },
            context: reply_to.map(|message_id| ReplyContext {
                message_id: message_id.to_string(),
            }),
        }
    }
}

/// Body of `POST /{phone_number_id}/messages` marking a message as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkReadRequest {
    pub messaging_product: &'static str,
    pub status: &'static str,
    pub message_id: String,
}

impl MarkReadRequest {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp",
            status: "read",
            message_id: message_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_message_without_reply_omits_context() {
        let msg = OutboundTextMessage::new("40742123123", "hello", None);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "messaging_product": "whatsapp",
                "to": "40742123123",
                "type": "text",
                "text": {"body": "hello"}
            })
        );
    }

    #[test]
    fn text_message_reply_carries_context() {
        let msg = OutboundTextMessage::new("40742123123", "hello", Some("wamid.1"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["context"], json!({"message_id": "wamid.1"}));
    }

    #[test]
    fn mark_read_shape() {
        assert_eq!(
            serde_json::to_value(MarkReadRequest::new("message_id_123")).unwrap(),
            json!({
                "messaging_product": "whatsapp",
                "status": "read",
                "message_id": "message_id_123"
            })
        );
    }
}
