//! OAuth2 authentication and Gmail hub construction

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use tracing::{info, warn};

use crate::error::{Result, TriageError};

/// gmail.modify covers everything the pipeline does: read, label, archive,
/// trash. No settings or permanent-delete scope.
pub const REQUIRED_SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.modify"];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

type GmailAuthenticator = yup_oauth2::authenticator::Authenticator<
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
>;

/// An access credential obtained from the token provider.
///
/// The bearer string doubles as the Authorization value for the
/// draft-request endpoint, which authenticates with the same Google token.
#[derive(Debug, Clone)]
pub struct Credential {
    bearer: String,
}

impl Credential {
    pub fn new(bearer: impl Into<String>) -> Self {
        Self {
            bearer: bearer.into(),
        }
    }

    pub fn bearer(&self) -> &str {
        &self.bearer
    }
}

/// Supplies and revokes access credentials for the pipeline.
///
/// `interactive` controls whether obtaining a credential may prompt the user;
/// the scheduled path always passes `false` and fails fast when no cached
/// token exists.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn authenticate(&self, interactive: bool) -> Result<Credential>;

    /// Drop the cached credential so the next authenticate starts clean.
    /// Called after the mailbox rejects a token with 401/403.
    async fn invalidate(&self) -> Result<()>;
}

/// Production token provider over yup-oauth2's InstalledFlow with an on-disk
/// token cache
pub struct OauthTokenProvider {
    authenticator: GmailAuthenticator,
    token_cache_path: PathBuf,
}

impl OauthTokenProvider {
    pub async fn new(credentials_path: &Path, token_cache_path: &Path) -> Result<Self> {
        let secret = yup_oauth2::read_application_secret(credentials_path)
            .await
            .map_err(|e| TriageError::Auth(format!("Failed to read credentials: {}", e)))?;

        // HTTPRedirect opens a browser for user authorization when no cached
        // token can satisfy the request
        let authenticator = yup_oauth2::InstalledFlowAuthenticator::builder(
            secret,
            yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(token_cache_path)
        .build()
        .await
        .map_err(|e| TriageError::Auth(format!("Failed to build authenticator: {}", e)))?;

        Ok(Self {
            authenticator,
            token_cache_path: token_cache_path.to_path_buf(),
        })
    }

    /// Build a Gmail hub sharing this provider's authenticator, so hub calls
    /// and bearer tokens always come from the same cached credential
    pub fn build_hub(&self) -> Result<GmailHub> {
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            TriageError::Auth(format!("Failed to load TLS roots: {}", e))
                        })?
                        .https_or_http()
                        .enable_http1()
                        .build(),
                );

        Ok(Gmail::new(client, self.authenticator.clone()))
    }
}

#[async_trait]
impl TokenProvider for OauthTokenProvider {
    async fn authenticate(&self, interactive: bool) -> Result<Credential> {
        // Silent mode must never open a browser: without a cached token the
        // authenticator would start the installed flow, so refuse up front
        if !interactive && !self.token_cache_path.exists() {
            return Err(TriageError::Auth(
                "No cached token; run the `auth` command to authorize".to_string(),
            ));
        }

        let token = self
            .authenticator
            .token(REQUIRED_SCOPES)
            .await
            .map_err(|e| TriageError::Auth(format!("Failed to obtain token: {}", e)))?;

        let bearer = token
            .token()
            .ok_or_else(|| TriageError::Auth("Token response carried no access token".to_string()))?
            .to_string();

        info!("Obtained access token (interactive: {})", interactive);
        Ok(Credential::new(bearer))
    }

    async fn invalidate(&self) -> Result<()> {
        if self.token_cache_path.exists() {
            tokio::fs::remove_file(&self.token_cache_path).await?;
            warn!(
                "Invalidated cached credential at {:?} after authorization failure",
                self.token_cache_path
            );
        }
        Ok(())
    }
}

/// Secure token file permissions on Unix systems (0600, owner only)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows uses ACLs instead of Unix permissions
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
