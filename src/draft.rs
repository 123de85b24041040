//! Client for the backend draft-request endpoint
//!
//! Called once per `draft_response` action. Fire-and-forget from the
//! pipeline's point of view: the label was already applied, and a failure
//! here is logged without rolling anything back.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::auth::Credential;
use crate::error::{Result, TriageError};
use crate::models::DraftRequest;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct DraftResponseBody {
    #[serde(default)]
    id: Option<String>,
}

/// HTTP client for filing draft-generation requests with the backend
pub struct DraftClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DraftClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// File a draft request, authenticated with the same Google bearer token
    /// the mailbox calls use. Returns the created record id when the backend
    /// supplies one.
    pub async fn request_draft(
        &self,
        request: &DraftRequest,
        credential: &Credential,
    ) -> Result<Option<String>> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(credential.bearer())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::DraftRequest(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: DraftResponseBody = response.json().await.unwrap_or(DraftResponseBody { id: None });
        debug!(
            message_id = %request.gmail_message_id,
            draft_id = ?body.id,
            "Draft request filed"
        );
        Ok(body.id)
    }
}
