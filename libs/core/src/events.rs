//! Classification of raw webhook payloads into [`InboundEvent`]s.
//!
//! Classifiers are total: every payload maps to exactly one variant, with
//! anything the relay does not act on landing in [`InboundEvent::Ignored`].

use serde_json::Value;

use crate::error::{RelayError, RelayResult};
use crate::types::WhatsappInitiatorDetails;

/// Contact entry carried next to a WhatsApp message (`value.contacts[]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsappContact {
    pub wa_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    WhatsappTextMessage {
        business_phone_number_id: String,
        message_id: String,
        from_wa_id: String,
        body_text: String,
        contacts: Vec<WhatsappContact>,
    },
    SlackMessageEvent {
        channel_id: String,
        slack_user_id: String,
        body_text: String,
    },
    WhatsappVerificationChallenge {
        mode: String,
        token: String,
        challenge: String,
    },
    SlackUrlVerification {
        challenge: String,
    },
    Ignored {
        reason: String,
    },
}

impl InboundEvent {
    pub fn ignored(reason: impl Into<String>) -> Self {
        InboundEvent::Ignored {
            reason: reason.into(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, InboundEvent::Ignored { .. })
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Classifies a WhatsApp Cloud API webhook body.
///
/// Only the first message of the first change of the first entry is looked at.
pub fn classify_whatsapp(payload: &Value) -> InboundEvent {
    let Some(value) = payload
        .pointer("/entry/0/changes/0/value")
        .filter(|v| v.is_object())
    else {
        return InboundEvent::ignored("no change value in payload");
    };
    let Some(message) = value.pointer("/messages/0") else {
        return InboundEvent::ignored("no message in change");
    };

    let kind = message.get("type").and_then(Value::as_str).unwrap_or("");
    if kind != "text" {
        return InboundEvent::ignored(format!("unsupported message type '{kind}'"));
    }

    let contacts = value
        .get("contacts")
        .and_then(Value::as_array)
        .map(|contacts| {
            contacts
                .iter()
                .map(|contact| WhatsappContact {
                    wa_id: str_field(contact, "wa_id"),
                    name: contact
                        .pointer("/profile/name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    InboundEvent::WhatsappTextMessage {
        business_phone_number_id: value
            .pointer("/metadata/phone_number_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        message_id: str_field(message, "id"),
        from_wa_id: str_field(message, "from"),
        body_text: message
            .pointer("/text/body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        contacts,
    }
}

/// Classifies a Slack Events API body.
pub fn classify_slack(payload: &Value) -> InboundEvent {
    let kind = payload.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "url_verification" => InboundEvent::SlackUrlVerification {
            challenge: str_field(payload, "challenge"),
        },
        "event_callback" => {
            let Some(event) = payload.get("event") else {
                return InboundEvent::ignored("event_callback without event");
            };
            let event_type = event.get("type").and_then(Value::as_str).unwrap_or("");
            if event_type != "message" {
                return InboundEvent::ignored(format!("unsupported event type '{event_type}'"));
            }
            // Edits, joins and bot posts all carry a subtype.
            if let Some(subtype) = event.get("subtype") {
                return InboundEvent::ignored(format!(
                    "message subtype {}",
                    subtype.as_str().unwrap_or("<non-string>")
                ));
            }
            if event.get("bot_id").is_some() {
                return InboundEvent::ignored("message posted by a bot");
            }
            InboundEvent::SlackMessageEvent {
                channel_id: str_field(event, "channel"),
                slack_user_id: str_field(event, "user"),
                body_text: str_field(event, "text"),
            }
        }
        other => InboundEvent::ignored(format!("unsupported payload type '{other}'")),
    }
}

/// Builds the verification event from the `hub.*` query parameters; missing
/// parameters are treated as empty strings.
pub fn whatsapp_verification(
    mode: Option<String>,
    token: Option<String>,
    challenge: Option<String>,
) -> InboundEvent {
    InboundEvent::WhatsappVerificationChallenge {
        mode: mode.unwrap_or_default(),
        token: token.unwrap_or_default(),
        challenge: challenge.unwrap_or_default(),
    }
}

/// Picks the contact who sent the message.
pub fn extract_initiator(
    from_wa_id: &str,
    contacts: &[WhatsappContact],
) -> RelayResult<WhatsappInitiatorDetails> {
    contacts
        .iter()
        .find(|contact| contact.wa_id == from_wa_id)
        .map(|contact| WhatsappInitiatorDetails::new(&contact.name, &contact.wa_id))
        .ok_or_else(|| {
            RelayError::bad_request(format!(
                "could not find associated contact for whatsapp sender {from_wa_id}"
            ))
        })
}
