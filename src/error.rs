use thiserror::Error;

/// Type alias for Result with TriageError
pub type Result<T> = std::result::Result<T, TriageError>;

/// Error types for the inbox triage pipeline
///
/// The propagation policy is deliberately coarse: authentication failures
/// abort the whole run, everything else is scoped to a single message (or a
/// single label operation) and is logged by the caller before moving on.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Credential could not be obtained; the run must abort before any
    /// mailbox access
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Mailbox API rejected the credential mid-run (401/403); the cached
    /// credential must be invalidated and the run aborted
    #[error("Mailbox authorization error (HTTP {status}): {message}")]
    MailboxAuth { status: u16, message: String },

    /// Any other non-2xx from a mailbox list/fetch/modify/trash/label call;
    /// scoped to the message or label operation that triggered it
    #[error("Mailbox request failed: {0}")]
    MailboxRequest(String),

    /// Classification service returned a non-2xx; body kept for diagnostics
    #[error("Classification service failed: {status} - {body}")]
    Classification { status: u16, body: String },

    /// Applying a suggested action to a message failed
    #[error("Dispatch action failed: {0}")]
    DispatchAction(String),

    /// Draft-request endpoint call failed; label changes are never rolled back
    #[error("Draft request failed: {0}")]
    DraftRequest(String),

    /// Label lookup or creation failed
    #[error("Label error: {0}")]
    Label(String),

    /// Network-level error talking to an external service
    #[error("Network error: {0}")]
    Network(String),

    /// IO error (checkpoint file, token cache, config)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Checkpoint state error
    #[error("State error: {0}")]
    State(String),
}

impl TriageError {
    /// True for errors that must terminate the whole run (credential-class
    /// failures); everything else is swallowed at the per-message boundary
    pub fn is_auth(&self) -> bool {
        matches!(self, TriageError::Auth(_) | TriageError::MailboxAuth { .. })
    }
}

impl From<google_gmail1::Error> for TriageError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    // Rejected credential: caller must invalidate and abort
                    401 | 403 => TriageError::MailboxAuth {
                        status: status_code,
                        message,
                    },
                    // Everything else stays scoped to the current message
                    _ => TriageError::MailboxRequest(message),
                }
            }
            // BadRequest variant (request not understood by server)
            google_gmail1::Error::BadRequest(ref err) => {
                TriageError::MailboxRequest(format!("{}", err))
            }
            // Network/connection errors
            google_gmail1::Error::HttpError(ref err) => {
                TriageError::Network(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => TriageError::Network(err.to_string()),
            // All other errors
            _ => TriageError::MailboxRequest(error.to_string()),
        }
    }
}

impl From<reqwest::Error> for TriageError {
    fn from(error: reqwest::Error) -> Self {
        TriageError::Network(error.to_string())
    }
}
