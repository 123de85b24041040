use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TriageError};

/// Persisted scan checkpoint
///
/// A single key, kept as a string of epoch milliseconds for compatibility with
/// the value historically stored by the extension. Absent file means "never
/// scanned": the next run queries without a time window.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckpointData {
    #[serde(
        rename = "lastEmailCheckTimestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_check_timestamp: Option<String>,
}

/// Loads and saves the checkpoint file
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint, returning defaults when the file does not exist
    pub async fn load(&self) -> Result<CheckpointData> {
        if !self.path.exists() {
            debug!("No checkpoint file at {:?}, starting fresh", self.path);
            return Ok(CheckpointData::default());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let data: CheckpointData = serde_json::from_str(&content)
            .map_err(|e| TriageError::State(format!("Corrupt checkpoint file: {}", e)))?;
        Ok(data)
    }

    /// Persist a new checkpoint timestamp (epoch milliseconds)
    pub async fn save(&self, timestamp_ms: i64) -> Result<()> {
        let data = CheckpointData {
            last_check_timestamp: Some(timestamp_ms.to_string()),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(&data)?;
        tokio::fs::write(&self.path, content).await?;
        info!("Checkpoint advanced to {}", timestamp_ms);
        Ok(())
    }

    /// Checkpoint as epoch seconds for the Gmail `after:` query operator,
    /// or None when no scan has completed yet
    pub async fn after_seconds(&self) -> Result<Option<i64>> {
        let data = self.load().await?;
        match data.last_check_timestamp {
            Some(ref raw) => {
                let ms: i64 = raw.parse().map_err(|_| {
                    TriageError::State(format!("Invalid checkpoint timestamp: {}", raw))
                })?;
                Ok(Some(ms / 1000))
            }
            None => Ok(None),
        }
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("state.json"));

        let data = checkpoint.load().await.unwrap();
        assert!(data.last_check_timestamp.is_none());
        assert!(checkpoint.after_seconds().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("state.json"));

        checkpoint.save(1_712_345_678_901).await.unwrap();

        let data = checkpoint.load().await.unwrap();
        assert_eq!(
            data.last_check_timestamp.as_deref(),
            Some("1712345678901")
        );
    }

    #[tokio::test]
    async fn test_after_seconds_truncates_milliseconds() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("state.json"));

        checkpoint.save(1_712_345_678_901).await.unwrap();
        assert_eq!(
            checkpoint.after_seconds().await.unwrap(),
            Some(1_712_345_678)
        );
    }

    #[tokio::test]
    async fn test_timestamp_stored_as_string() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let checkpoint = Checkpoint::new(&path);

        checkpoint.save(1_700_000_000_000).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["lastEmailCheckTimestamp"].is_string());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("nested/deeper/state.json"));

        checkpoint.save(42).await.unwrap();
        assert_eq!(checkpoint.after_seconds().await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let checkpoint = Checkpoint::new(&path);
        let err = checkpoint.load().await.unwrap_err();
        assert!(matches!(err, TriageError::State(_)));
    }
}
