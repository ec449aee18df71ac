use serde::{Deserialize, Serialize};

use crate::db::LogEntry;

/// Query parameters for `GET /api/v1/logs`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams, utoipa::ToSchema)]
pub struct ListLogsQuery {
    /// Maximum number of entries. Clamped to `1..=100`, defaults to 20.
    pub limit: Option<u32>,
}

impl ListLogsQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LogEntryResponse {
    pub id: i64,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub question: String,
    pub raw_answer: String,
    pub corrected_answer: Option<String>,
    pub citations: Vec<String>,
    pub confidence_score: Option<f32>,
    pub detection_method: Option<String>,
}

impl From<LogEntry> for LogEntryResponse {
    fn from(entry: LogEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp.to_rfc3339(),
            question: entry.question,
            raw_answer: entry.raw_answer,
            corrected_answer: entry.corrected_answer,
            citations: entry.citations,
            confidence_score: entry.confidence_score,
            detection_method: entry.detection_method,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListLogsResponse {
    pub logging_enabled: bool,
    /// Newest first.
    pub logs: Vec<LogEntryResponse>,
}
