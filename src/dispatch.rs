//! Applies the classifier's suggested action to the mailbox

use tracing::{info, warn};

use crate::auth::Credential;
use crate::client::GmailClient;
use crate::draft::DraftClient;
use crate::error::Result;
use crate::labels::LabelStore;
use crate::models::{ActionOutcome, ClassificationResult, DraftRequest, SuggestedAction};

const INBOX_LABEL: &str = "INBOX";

/// Maps a classification verdict to mailbox mutations.
///
/// Borrows the label store from the pipeline for the duration of a run; the
/// cache itself outlives the dispatcher.
pub struct ActionDispatcher<'a> {
    client: &'a dyn GmailClient,
    labels: &'a mut LabelStore,
    draft: &'a DraftClient,
    label_base: &'a str,
    user_id: &'a str,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(
        client: &'a dyn GmailClient,
        labels: &'a mut LabelStore,
        draft: &'a DraftClient,
        label_base: &'a str,
        user_id: &'a str,
    ) -> Self {
        Self {
            client,
            labels,
            draft,
            label_base,
            user_id,
        }
    }

    /// Apply the suggested action for one message.
    ///
    /// Mailbox errors propagate to the caller, which decides whether they
    /// abort the run (401/403) or only skip this message. Draft-request
    /// failures never propagate: the label is already applied and stays.
    pub async fn dispatch(
        &mut self,
        result: &ClassificationResult,
        credential: &Credential,
    ) -> Result<ActionOutcome> {
        let message_id = &result.id;

        let outcome = match result.suggested_action {
            SuggestedAction::Delete => {
                self.client.trash_message(message_id).await?;
                ActionOutcome::Trashed
            }
            SuggestedAction::Archive => {
                self.client
                    .modify_labels(message_id, &[], &[INBOX_LABEL.to_string()])
                    .await?;
                ActionOutcome::Archived
            }
            SuggestedAction::LabelOnly | SuggestedAction::ForwardToAltbot => {
                // Label and archive in one mutation
                let label = self.classification_label(result);
                let label_id = self.labels.get_or_create(self.client, &label).await?;
                self.client
                    .modify_labels(message_id, &[label_id], &[INBOX_LABEL.to_string()])
                    .await?;
                ActionOutcome::LabeledAndArchived { label }
            }
            SuggestedAction::ReviewManually => {
                // Stays in the inbox for the user to handle
                let label = self.classification_label(result);
                let label_id = self.labels.get_or_create(self.client, &label).await?;
                self.client
                    .modify_labels(message_id, &[label_id], &[])
                    .await?;
                ActionOutcome::Labeled { label }
            }
            SuggestedAction::DraftResponse => {
                let label = self.classification_label(result);
                let label_id = self.labels.get_or_create(self.client, &label).await?;
                self.client
                    .modify_labels(message_id, &[label_id], &[])
                    .await?;

                let draft_id = self.file_draft_request(result, credential).await;
                ActionOutcome::LabeledAndDraftRequested { label, draft_id }
            }
            SuggestedAction::Unknown => {
                warn!(
                    message_id = %message_id,
                    "Classifier suggested an unrecognized action, leaving message untouched"
                );
                ActionOutcome::NoOp
            }
        };

        info!(message_id = %message_id, outcome = %outcome.describe(), "Dispatched action");
        Ok(outcome)
    }

    fn classification_label(&self, result: &ClassificationResult) -> String {
        format!("{}/{}", self.label_base, result.classification.as_str())
    }

    /// One-shot draft request. Failures (and a missing log id) are logged and
    /// swallowed; nothing is rolled back.
    async fn file_draft_request(
        &self,
        result: &ClassificationResult,
        credential: &Credential,
    ) -> Option<String> {
        let classification_id = match &result.classification_log_id {
            Some(id) => id.clone(),
            None => {
                warn!(
                    message_id = %result.id,
                    "Classification carried no log id, skipping draft request"
                );
                return None;
            }
        };

        let request = DraftRequest {
            user_id: self.user_id.to_string(),
            gmail_message_id: result.id.clone(),
            classification_id,
            llm_summary: result.summary.clone(),
        };

        match self.draft.request_draft(&request, credential).await {
            Ok(draft_id) => draft_id,
            Err(e) => {
                warn!(message_id = %result.id, error = %e, "Draft request failed");
                None
            }
        }
    }
}
