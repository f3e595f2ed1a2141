use serde::{Deserialize, Serialize};

/// Pairing between one WhatsApp business phone number and one Slack user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub whatsapp_business_phone_number_id: String,
    pub slack_user_id: String,
}

impl LinkedAccount {
    pub fn new(
        whatsapp_business_phone_number_id: impl Into<String>,
        slack_user_id: impl Into<String>,
    ) -> Self {
        Self {
            whatsapp_business_phone_number_id: whatsapp_business_phone_number_id.into(),
            slack_user_id: slack_user_id.into(),
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        self.whatsapp_business_phone_number_id == id || self.slack_user_id == id
    }
}

/// The WhatsApp contact behind an inbound message.
///
/// Serialized into the Slack channel purpose so the conversation can be mapped
/// back to the contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsappInitiatorDetails {
    pub name: String,
    pub whatsapp_phone_number: String,
}

impl WhatsappInitiatorDetails {
    pub fn new(name: impl Into<String>, whatsapp_phone_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            whatsapp_phone_number: whatsapp_phone_number.into(),
        }
    }

    pub fn default_channel_name(&self) -> String {
        format!(
            "{}-{}",
            self.name.to_lowercase(),
            self.whatsapp_phone_number.to_lowercase()
        )
    }

    pub fn to_metadata(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_metadata(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Slack channel standing in for one WhatsApp conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationChannel {
    pub id: String,
    pub name: String,
    /// Channel purpose; holds the serialized [`WhatsappInitiatorDetails`].
    pub metadata: String,
}

impl ConversationChannel {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metadata: metadata.into(),
        }
    }

    pub fn initiator(&self) -> serde_json::Result<WhatsappInitiatorDetails> {
        WhatsappInitiatorDetails::from_metadata(&self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_is_lowercased_composite() {
        let initiator = WhatsappInitiatorDetails::new("Bob Smith", "40742123123");
        assert_eq!(initiator.default_channel_name(), "bob smith-40742123123");
    }

    #[test]
    fn metadata_uses_snake_case_fields() {
        let initiator = WhatsappInitiatorDetails::new("Bob", "40742123123");
        let raw = initiator.to_metadata().unwrap();
        assert_eq!(
            raw,
            r#"{"name":"Bob","whatsapp_phone_number":"40742123123"}"#
        );
        let channel = ConversationChannel::new("C1", "bob-40742123123", raw);
        assert_eq!(channel.initiator().unwrap(), initiator);
    }

    #[test]
    fn foreign_purpose_does_not_decode() {
        let channel = ConversationChannel::new("C1", "general", "Company-wide announcements");
        assert!(channel.initiator().is_err());
    }

    #[test]
    fn linked_account_matches_either_id() {
        let account = LinkedAccount::new("36825", "U123");
        assert!(account.matches("36825"));
        assert!(account.matches("U123"));
        assert!(!account.matches("u123"));
    }
}
