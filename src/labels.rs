//! Label name to id resolution with a process-lifetime cache

use std::collections::HashMap;

use tracing::debug;

use crate::client::GmailClient;
use crate::error::Result;

/// Caches label-name → label-id mappings for the life of the process.
///
/// Owned by the pipeline and handed to the dispatcher per run, so the cache's
/// scope and lifetime are explicit rather than hidden in a global.
#[derive(Debug, Default)]
pub struct LabelStore {
    cache: HashMap<String, String>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a label name to its id, creating the label when the account
    /// does not have it yet.
    ///
    /// A cache miss refreshes the whole cache from the account's label list
    /// before deciding to create, so labels added out of band are picked up.
    pub async fn get_or_create(
        &mut self,
        client: &dyn GmailClient,
        name: &str,
    ) -> Result<String> {
        if let Some(id) = self.cache.get(name) {
            return Ok(id.clone());
        }

        let labels = client.list_labels().await?;
        for label in labels {
            self.cache.insert(label.name, label.id);
        }

        if let Some(id) = self.cache.get(name) {
            debug!(label = %name, "Resolved existing label");
            return Ok(id.clone());
        }

        let created = client.create_label(name).await?;
        self.cache.insert(created.name.clone(), created.id.clone());
        Ok(created.id)
    }

    #[cfg(test)]
    pub fn cached_id(&self, name: &str) -> Option<&String> {
        self.cache.get(name)
    }
}
