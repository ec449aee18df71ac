use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// A corrected answer about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub question: String,
    pub raw_answer: String,
    pub corrected_answer: Option<String>,
    pub citations: Vec<String>,
    pub confidence_score: Option<f32>,
    pub detection_method: Option<String>,
}

/// A persisted log row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub raw_answer: String,
    pub corrected_answer: Option<String>,
    pub citations: Vec<String>,
    pub confidence_score: Option<f32>,
    pub detection_method: Option<String>,
}

/// Append-only store of corrected answers.
#[async_trait]
pub trait CorrectionLogStore: Send + Sync {
    /// Returns the id of the new row.
    async fn append(&self, record: &LogRecord) -> Result<i64>;

    /// Newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<LogEntry>>;
}

/// A complete database backend: the stores plus lifecycle operations.
#[async_trait]
pub trait DatabaseBackend: CorrectionLogStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;

    /// Fails when the database cannot serve a trivial query.
    async fn ping(&self) -> Result<()>;
}
