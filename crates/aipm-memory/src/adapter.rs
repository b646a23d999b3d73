//! Load/save of the single project memory document.
//!
//! No locking and no version check: two load-modify-save cycles that overlap
//! end with the later save winning for the whole document.

use aipm_core::{error::AipmError, model::ProjectMemory, traits::DocumentStore};
use std::sync::Arc;
use tracing::info;

/// Reads and writes the project memory under one fixed key.
#[derive(Clone)]
pub struct MemoryAdapter {
    store: Arc<dyn DocumentStore>,
    key: String,
}

impl MemoryAdapter {
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Current memory. The first call on an empty store creates and
    /// persists the default document.
    pub async fn load(&self) -> Result<ProjectMemory, AipmError> {
        match self.store.get(&self.key).await? {
            Some(body) => serde_json::from_str(&body).map_err(|e| {
                AipmError::Memory(format!("stored document '{}' is unreadable: {e}", self.key))
            }),
            None => {
                let memory = ProjectMemory::new();
                self.write(&memory).await?;
                info!("memory: created default document '{}'", self.key);
                Ok(memory)
            }
        }
    }

    /// Persist the whole document. Always refreshes `metadata.updated_at`.
    pub async fn save(&self, memory: &mut ProjectMemory) -> Result<(), AipmError> {
        memory.touch();
        self.write(memory).await
    }

    async fn write(&self, memory: &ProjectMemory) -> Result<(), AipmError> {
        let body = serde_json::to_string(memory)?;
        self.store.put(&self.key, &body).await
    }
}
