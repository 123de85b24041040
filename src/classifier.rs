//! Client for the external email classification service

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TriageError};
use crate::models::{ClassificationResult, NormalizedEmail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request payload sent to the classification endpoint
#[derive(Debug, Serialize)]
struct ClassificationRequest<'a> {
    id: &'a str,
    user_id: &'a str,
    sender: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Thin HTTP client for the classification service.
///
/// One attempt per message; a failure here skips the message and the run
/// moves on.
pub struct ClassifierClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ClassifierClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub async fn classify(
        &self,
        email: &NormalizedEmail,
        user_id: &str,
    ) -> Result<ClassificationResult> {
        let request = ClassificationRequest {
            id: &email.id,
            user_id,
            sender: &email.sender,
            subject: &email.subject,
            body: &email.body,
        };

        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Classification {
                status: status.as_u16(),
                body,
            });
        }

        let result: ClassificationResult = response.json().await?;
        debug!(
            message_id = %email.id,
            classification = result.classification.as_str(),
            score = result.real_human_probability_score,
            "Received classification"
        );
        Ok(result)
    }
}
