use serde::{Deserialize, Serialize};

/// Sender/subject/cleaned-body triple derived from one raw mailbox message.
/// Ephemeral: lives only for the duration of that message's processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedEmail {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
}

/// Categorical verdict returned by the classification service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmailClassification {
    Spam,
    AiPitch,
    HumanPitch,
    WarmIntro,
    Internal,
    Other,
}

impl EmailClassification {
    /// Wire name, also used as the label segment under the label base
    /// (e.g. "Exec Scout/ai_pitch")
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailClassification::Spam => "spam",
            EmailClassification::AiPitch => "ai_pitch",
            EmailClassification::HumanPitch => "human_pitch",
            EmailClassification::WarmIntro => "warm_intro",
            EmailClassification::Internal => "internal",
            EmailClassification::Other => "other",
        }
    }
}

/// Mailbox operation recommended by the classifier
///
/// The service may grow new actions before this client learns about them, so
/// unrecognized values deserialize to `Unknown` and dispatch as a logged no-op
/// rather than failing the message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Delete,
    Archive,
    LabelOnly,
    DraftResponse,
    ReviewManually,
    ForwardToAltbot,
    #[serde(other, skip_serializing)]
    Unknown,
}

/// Response payload from the classification service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Gmail message id this verdict applies to
    pub id: String,
    /// Id of the backend log entry; required to file a draft request
    #[serde(rename = "classificationLogId", default)]
    pub classification_log_id: Option<String>,
    pub classification: EmailClassification,
    /// 0-100
    pub real_human_probability_score: u8,
    pub summary: String,
    pub reasoning: String,
    pub suggested_action: SuggestedAction,
}

/// One-shot payload for the downstream draft-request endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub user_id: String,
    pub gmail_message_id: String,
    pub classification_id: String,
    pub llm_summary: String,
}

/// Terminal state of one message's journey through the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionOutcome {
    Trashed,
    Archived,
    Labeled { label: String },
    LabeledAndArchived { label: String },
    LabeledAndDraftRequested { label: String, draft_id: Option<String> },
    NoOp,
}

impl ActionOutcome {
    /// Human-readable action description for run logs
    pub fn describe(&self) -> String {
        match self {
            ActionOutcome::Trashed => "Trashed".to_string(),
            ActionOutcome::Archived => "Archived (removed INBOX)".to_string(),
            ActionOutcome::Labeled { label } => {
                format!("Labeled '{}', kept in inbox", label)
            }
            ActionOutcome::LabeledAndArchived { label } => {
                format!("Labeled '{}' and archived", label)
            }
            ActionOutcome::LabeledAndDraftRequested { label, draft_id } => match draft_id {
                Some(id) => format!("Labeled '{}', draft request filed (id: {})", label, id),
                None => format!("Labeled '{}', draft request skipped", label),
            },
            ActionOutcome::NoOp => "No action taken".to_string(),
        }
    }
}

/// Outcome of one message within a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageOutcome {
    pub message_id: String,
    pub outcome: ActionOutcome,
}

/// Explicit result of one pipeline run, returned instead of side-effecting
/// writes so callers (and tests) can observe exactly what happened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    /// Message ids that reached a terminal dispatch state this run
    pub processed_ids: Vec<String>,
    /// Message ids skipped because a per-message stage failed
    pub failed_ids: Vec<String>,
    /// Per-message dispatch outcomes, in processing order
    pub outcomes: Vec<MessageOutcome>,
    /// True when a credential failure terminated the run early
    pub aborted: bool,
    /// True when the checkpoint was written at the end of the run
    pub checkpoint_advanced: bool,
}

impl RunResult {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            processed_ids: Vec::new(),
            failed_ids: Vec::new(),
            outcomes: Vec::new(),
            aborted: false,
            checkpoint_advanced: false,
        }
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_result_deserialization() {
        let json = r#"{
            "id": "msg-123",
            "classificationLogId": "log-456",
            "classification": "ai_pitch",
            "real_human_probability_score": 12,
            "summary": "Automated sales pitch",
            "reasoning": "Template greeting, tracking links",
            "suggested_action": "label_only"
        }"#;

        let result: ClassificationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.id, "msg-123");
        assert_eq!(result.classification_log_id.as_deref(), Some("log-456"));
        assert_eq!(result.classification, EmailClassification::AiPitch);
        assert_eq!(result.real_human_probability_score, 12);
        assert_eq!(result.suggested_action, SuggestedAction::LabelOnly);
    }

    #[test]
    fn test_classification_result_without_log_id() {
        let json = r#"{
            "id": "msg-1",
            "classification": "spam",
            "real_human_probability_score": 0,
            "summary": "s",
            "reasoning": "r",
            "suggested_action": "delete"
        }"#;

        let result: ClassificationResult = serde_json::from_str(json).unwrap();
        assert!(result.classification_log_id.is_none());
        assert_eq!(result.suggested_action, SuggestedAction::Delete);
    }

    #[test]
    fn test_unknown_suggested_action_is_tolerated() {
        let json = r#"{
            "id": "msg-1",
            "classification": "other",
            "real_human_probability_score": 50,
            "summary": "s",
            "reasoning": "r",
            "suggested_action": "escalate_to_human"
        }"#;

        let result: ClassificationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.suggested_action, SuggestedAction::Unknown);
    }

    #[test]
    fn test_classification_label_segments() {
        assert_eq!(EmailClassification::Spam.as_str(), "spam");
        assert_eq!(EmailClassification::AiPitch.as_str(), "ai_pitch");
        assert_eq!(EmailClassification::WarmIntro.as_str(), "warm_intro");

        // Wire name and label segment must stay in sync
        let json = serde_json::to_string(&EmailClassification::HumanPitch).unwrap();
        assert_eq!(json, "\"human_pitch\"");
    }

    #[test]
    fn test_draft_request_camel_case() {
        let request = DraftRequest {
            user_id: "user-1".to_string(),
            gmail_message_id: "msg-1".to_string(),
            classification_id: "log-1".to_string(),
            llm_summary: "Warm intro from a former colleague".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["gmailMessageId"], "msg-1");
        assert_eq!(json["classificationId"], "log-1");
        assert!(json["llmSummary"].as_str().unwrap().contains("Warm intro"));
    }

    #[test]
    fn test_action_outcome_describe() {
        let outcome = ActionOutcome::LabeledAndArchived {
            label: "Exec Scout/spam".to_string(),
        };
        assert!(outcome.describe().contains("Exec Scout/spam"));
        assert!(outcome.describe().contains("archived"));

        assert_eq!(ActionOutcome::Trashed.describe(), "Trashed");
    }

    #[test]
    fn test_run_result_ids_are_unique() {
        let a = RunResult::new();
        let b = RunResult::new();
        assert_ne!(a.run_id, b.run_id);
        assert!(!a.aborted);
        assert!(!a.checkpoint_advanced);
    }
}
