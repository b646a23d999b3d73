//! Keyed whole-document storage.

use super::Store;
use aipm_core::{error::AipmError, traits::DocumentStore};
use async_trait::async_trait;
use tracing::debug;

impl Store {
    /// Fetch the raw body stored under `key`.
    pub async fn get_document(&self, key: &str) -> Result<Option<String>, AipmError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT body FROM documents WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AipmError::Memory(format!("get document failed: {e}")))?;

        Ok(row.map(|(body,)| body))
    }

    /// Replace (or create) the document under `key`.
    pub async fn put_document(&self, key: &str, body: &str) -> Result<(), AipmError> {
        sqlx::query(
            "INSERT INTO documents (key, body) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = datetime('now')",
        )
        .bind(key)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| AipmError::Memory(format!("put document failed: {e}")))?;

        debug!("store: wrote document {key} ({} bytes)", body.len());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>, AipmError> {
        self.get_document(key).await
    }

    async fn put(&self, key: &str, body: &str) -> Result<(), AipmError> {
        self.put_document(key, body).await
    }
}
