//! The triage run: token, list, then fetch/normalize/classify/dispatch per
//! message, strictly in order

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{Credential, TokenProvider};
use crate::classifier::ClassifierClient;
use crate::client::GmailClient;
use crate::dispatch::ActionDispatcher;
use crate::draft::DraftClient;
use crate::error::{Result, TriageError};
use crate::labels::LabelStore;
use crate::models::{MessageOutcome, RunResult};
use crate::normalize::normalize;
use crate::state::{now_ms, Checkpoint};

/// Base inbox query; promotional and social tabs are never triaged
pub const BASE_QUERY: &str = "in:inbox is:unread -category:(promotions OR social)";

/// Knobs the pipeline needs from the config
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub user_id: String,
    pub label_base: String,
    pub max_messages_per_run: u32,
}

/// Orchestrates one scan of the inbox.
///
/// Owns the label cache and checkpoint across runs; the Gmail client and
/// token provider sit behind trait objects so tests can substitute them.
pub struct TriagePipeline {
    client: Arc<dyn GmailClient>,
    tokens: Arc<dyn TokenProvider>,
    classifier: ClassifierClient,
    draft: DraftClient,
    labels: LabelStore,
    checkpoint: Checkpoint,
    settings: PipelineSettings,
}

impl TriagePipeline {
    pub fn new(
        client: Arc<dyn GmailClient>,
        tokens: Arc<dyn TokenProvider>,
        classifier: ClassifierClient,
        draft: DraftClient,
        checkpoint: Checkpoint,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            client,
            tokens,
            classifier,
            draft,
            labels: LabelStore::new(),
            checkpoint,
            settings,
        }
    }

    /// Execute one run. `interactive` allows the token provider to prompt;
    /// scheduled runs pass `false`.
    ///
    /// The checkpoint is written once, after the loop, to the run's start
    /// time, so messages that arrive mid-run are picked up next time. It is
    /// advanced even when nothing matched or individual messages failed, but
    /// never when an authorization failure aborted the run.
    pub async fn run(&mut self, interactive: bool) -> Result<RunResult> {
        let mut result = RunResult::new();
        let run_start_ms = now_ms();
        info!(run_id = %result.run_id, "Starting triage run");

        let credential = self.tokens.authenticate(interactive).await?;

        let query = build_query(self.checkpoint.after_seconds().await?);
        let ids = match self
            .client
            .list_message_ids(&query, self.settings.max_messages_per_run)
            .await
        {
            Ok(ids) => ids,
            Err(e) if e.is_auth() => {
                self.abort_on_auth_failure(&mut result, &e).await;
                return Ok(result);
            }
            Err(e) => return Err(e),
        };

        for id in ids {
            match self.process_message(&id, &credential).await {
                Ok(outcome) => {
                    result.processed_ids.push(id);
                    result.outcomes.push(outcome);
                }
                Err(e) if e.is_auth() => {
                    self.abort_on_auth_failure(&mut result, &e).await;
                    break;
                }
                Err(e) => {
                    warn!(message_id = %id, error = %e, "Skipping message after failure");
                    result.failed_ids.push(id);
                }
            }
        }

        if !result.aborted {
            self.checkpoint.save(run_start_ms).await?;
            result.checkpoint_advanced = true;
        }

        info!(
            run_id = %result.run_id,
            processed = result.processed_ids.len(),
            failed = result.failed_ids.len(),
            aborted = result.aborted,
            "Triage run finished"
        );
        Ok(result)
    }

    async fn process_message(&mut self, id: &str, credential: &Credential) -> Result<MessageOutcome> {
        let message = self.client.get_message(id).await?;
        let email = normalize(&message);
        let verdict = self.classifier.classify(&email, &self.settings.user_id).await?;

        let mut dispatcher = ActionDispatcher::new(
            self.client.as_ref(),
            &mut self.labels,
            &self.draft,
            &self.settings.label_base,
            &self.settings.user_id,
        );
        let outcome = dispatcher.dispatch(&verdict, credential).await?;

        Ok(MessageOutcome {
            message_id: id.to_string(),
            outcome,
        })
    }

    /// The mailbox rejected the token mid-run: drop the cached credential and
    /// end the run without touching the checkpoint
    async fn abort_on_auth_failure(&self, result: &mut RunResult, error: &TriageError) {
        warn!(
            run_id = %result.run_id,
            error = %error,
            "Authorization rejected mid-run, invalidating credential and aborting"
        );
        if let Err(e) = self.tokens.invalidate().await {
            warn!(error = %e, "Failed to invalidate cached credential");
        }
        result.aborted = true;
    }
}

fn build_query(after_seconds: Option<i64>) -> String {
    match after_seconds {
        Some(seconds) => format!("{} after:{}", BASE_QUERY, seconds),
        None => BASE_QUERY.to_string(),
    }
}
