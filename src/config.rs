//! TOML configuration for the triage daemon

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("triage-state.json")
}

fn default_label_base() -> String {
    "Exec Scout".to_string()
}

fn default_max_messages_per_run() -> u32 {
    10
}

fn default_check_interval_minutes() -> u64 {
    5
}

/// OAuth2 file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_cache_path: default_token_cache_path(),
        }
    }
}

/// Pipeline behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Backend user id sent with classification and draft requests
    pub user_id: String,
    /// Parent segment of classification labels
    #[serde(default = "default_label_base")]
    pub label_base: String,
    /// Per-run cap; a backpressure valve, not pagination
    #[serde(default = "default_max_messages_per_run")]
    pub max_messages_per_run: u32,
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
}

/// External service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub classifier_endpoint: String,
    pub draft_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gmail: GmailConfig,
    pub triage: TriageConfig,
    pub services: ServicesConfig,
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TriageError::Config(format!("Cannot read config file {:?}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| TriageError::Config(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.triage.user_id.trim().is_empty() {
            return Err(TriageError::Config("triage.user_id must be set".to_string()));
        }
        if self.triage.label_base.trim().is_empty() {
            return Err(TriageError::Config(
                "triage.label_base must not be empty".to_string(),
            ));
        }
        if self.triage.max_messages_per_run == 0 {
            return Err(TriageError::Config(
                "triage.max_messages_per_run must be at least 1".to_string(),
            ));
        }
        if self.triage.check_interval_minutes == 0 {
            return Err(TriageError::Config(
                "triage.check_interval_minutes must be at least 1".to_string(),
            ));
        }
        for (key, endpoint) in [
            ("services.classifier_endpoint", &self.services.classifier_endpoint),
            ("services.draft_endpoint", &self.services.draft_endpoint),
        ] {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(TriageError::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    key, endpoint
                )));
            }
        }
        Ok(())
    }

    /// Starter config written by the `init-config` command
    pub fn template() -> &'static str {
        r#"# squire-triage configuration

[gmail]
# OAuth2 desktop-app credentials downloaded from Google Cloud Console
credentials_path = "credentials.json"
# Where the access/refresh token is cached after `squire-triage auth`
token_cache_path = "token.json"

[triage]
# Backend user id sent with classification and draft requests
user_id = ""
# Parent segment of classification labels, e.g. "Exec Scout/ai_pitch"
label_base = "Exec Scout"
# Cap on messages handled per run
max_messages_per_run = 10
# Scan period for `squire-triage watch`
check_interval_minutes = 5
# Scan checkpoint file
checkpoint_path = "triage-state.json"

[services]
classifier_endpoint = "https://api.example.com/classify-email"
draft_endpoint = "https://api.example.com/draft-requests"
"#
    }
}
