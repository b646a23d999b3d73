//! Audit log: one row per caller-facing operation and how it ended.

use aipm_core::error::AipmError;
use sqlx::SqlitePool;
use tracing::debug;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub operation: String,
    /// Task id, file name, or question the operation was about.
    pub subject: Option<String>,
    pub status: AuditStatus,
    pub message: String,
    pub items: Vec<String>,
}

/// How an audited operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Ok,
    NotFound,
    Rejected,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }
}

/// A row read back from the audit log.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub operation: String,
    pub subject: Option<String>,
    pub status: String,
    pub message: String,
    pub created_at: String,
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
    retention: u32,
}

impl AuditLogger {
    /// Create a new audit logger sharing the given pool. Keeps every row.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, retention: 0 }
    }

    /// Keep only the newest `rows` entries. 0 keeps everything.
    pub fn with_retention(mut self, rows: u32) -> Self {
        self.retention = rows;
        self
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), AipmError> {
        let items = serde_json::to_string(&entry.items)?;

        sqlx::query(
            "INSERT INTO audit_log (operation, subject, status, message, items) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.operation)
        .bind(&entry.subject)
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(&items)
        .execute(&self.pool)
        .await
        .map_err(|e| AipmError::Memory(format!("audit log write failed: {e}")))?;

        if self.retention > 0 {
            sqlx::query(
                "DELETE FROM audit_log WHERE id NOT IN \
                 (SELECT id FROM audit_log ORDER BY id DESC LIMIT ?)",
            )
            .bind(i64::from(self.retention))
            .execute(&self.pool)
            .await
            .map_err(|e| AipmError::Memory(format!("audit log prune failed: {e}")))?;
        }

        debug!(
            "audit: {} {} [{}] {}",
            entry.operation,
            entry.subject.as_deref().unwrap_or("-"),
            entry.status.as_str(),
            truncate(&entry.message, 80)
        );

        Ok(())
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRecord>, AipmError> {
        let rows: Vec<(String, Option<String>, String, String, String)> = sqlx::query_as(
            "SELECT operation, subject, status, message, created_at FROM audit_log \
             ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AipmError::Memory(format!("audit log read failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(
                |(operation, subject, status, message, created_at)| AuditRecord {
                    operation,
                    subject,
                    status,
                    message,
                    created_at,
                },
            )
            .collect())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
