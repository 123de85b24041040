//! Shared builders and mocks for integration tests

use async_trait::async_trait;
use google_gmail1::api::{Message, MessagePart, MessagePartBody, MessagePartHeader};
use mockall::mock;

use squire_triage::client::{GmailClient, LabelInfo};
use squire_triage::Result;

mock! {
    pub Gmail {}

    #[async_trait]
    impl GmailClient for Gmail {
        async fn list_message_ids(&self, query: &str, max_results: u32) -> Result<Vec<String>>;
        async fn get_message(&self, id: &str) -> Result<Message>;
        async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> Result<()>;
        async fn trash_message(&self, id: &str) -> Result<()>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, name: &str) -> Result<LabelInfo>;
    }
}

mock! {
    pub Tokens {}

    #[async_trait]
    impl squire_triage::TokenProvider for Tokens {
        async fn authenticate(&self, interactive: bool) -> Result<squire_triage::Credential>;
        async fn invalidate(&self) -> Result<()>;
    }
}

/// A full-format message with plain-text body and standard headers
pub fn test_message(id: &str, from: &str, subject: &str, body: &str) -> Message {
    Message {
        id: Some(id.to_string()),
        payload: Some(MessagePart {
            mime_type: Some("text/plain".to_string()),
            headers: Some(vec![
                MessagePartHeader {
                    name: Some("From".to_string()),
                    value: Some(from.to_string()),
                },
                MessagePartHeader {
                    name: Some("Subject".to_string()),
                    value: Some(subject.to_string()),
                },
            ]),
            body: Some(MessagePartBody {
                data: Some(body.as_bytes().to_vec()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Classification service response body
pub fn verdict_json(
    id: &str,
    classification: &str,
    action: &str,
    log_id: Option<&str>,
) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": id,
        "classification": classification,
        "real_human_probability_score": 50,
        "summary": format!("Summary of {}", id),
        "reasoning": "test reasoning",
        "suggested_action": action
    });
    if let Some(log_id) = log_id {
        value["classificationLogId"] = serde_json::Value::String(log_id.to_string());
    }
    value
}
