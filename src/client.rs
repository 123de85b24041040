//! Gmail API client used by the triage pipeline
//!
//! Every call is a single attempt. The error mapping in `error.rs` decides
//! whether a failure aborts the run (401/403) or only the current message;
//! there is deliberately no retry or backoff layer here.

use async_trait::async_trait;
use google_gmail1::api::{Label, Message, ModifyMessageRequest};
use tracing::{debug, info};

use crate::auth::GmailHub;
use crate::error::Result;

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// Trait defining the mailbox operations the pipeline needs, kept narrow so
/// tests can mock it
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// List message ids matching a query, newest first, capped at
    /// `max_results`
    async fn list_message_ids(&self, query: &str, max_results: u32) -> Result<Vec<String>>;

    /// Fetch a full message (headers, parts, bodies)
    async fn get_message(&self, id: &str) -> Result<Message>;

    /// Add and remove labels on a message in one mutation
    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> Result<()>;

    /// Move a message to trash
    async fn trash_message(&self, id: &str) -> Result<()>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a user label visible in both the label list and message list
    async fn create_label(&self, name: &str) -> Result<LabelInfo>;
}

/// Production client over the google-gmail1 hub
pub struct ProductionGmailClient {
    hub: GmailHub,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_message_ids(&self, query: &str, max_results: u32) -> Result<Vec<String>> {
        debug!(query = %query, max_results, "Listing messages");

        let (_, response) = self
            .hub
            .users()
            .messages_list("me")
            .q(query)
            .max_results(max_results)
            .doit()
            .await?;

        let ids: Vec<String> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();

        debug!("Found {} matching messages", ids.len());
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        let (_, message) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("full")
            .doit()
            .await?;
        Ok(message)
    }

    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> Result<()> {
        let request = ModifyMessageRequest {
            add_label_ids: (!add.is_empty()).then(|| add.to_vec()),
            remove_label_ids: (!remove.is_empty()).then(|| remove.to_vec()),
        };

        self.hub
            .users()
            .messages_modify(request, "me", id)
            .doit()
            .await?;

        debug!(message_id = %id, ?add, ?remove, "Modified labels");
        Ok(())
    }

    async fn trash_message(&self, id: &str) -> Result<()> {
        self.hub.users().messages_trash("me", id).doit().await?;
        debug!(message_id = %id, "Moved message to trash");
        Ok(())
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let (_, response) = self.hub.users().labels_list("me").doit().await?;

        let labels = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|l| match (l.id, l.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        let label = Label {
            name: Some(name.to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            message_list_visibility: Some("show".to_string()),
            ..Default::default()
        };

        let (_, created) = self.hub.users().labels_create(label, "me").doit().await?;

        let info = LabelInfo {
            id: created.id.unwrap_or_default(),
            name: created.name.unwrap_or_else(|| name.to_string()),
        };
        info!(label = %info.name, id = %info.id, "Created label");
        Ok(info)
    }
}
