use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{params, Connection, Row};

use crate::db::traits::{LogEntry, LogRecord};
use crate::error::{Result, VeracityError};

pub const CITATION_SEPARATOR: &str = "; ";

/// SQLite `CURRENT_TIMESTAMP` format.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct LogRepository;

impl LogRepository {
    pub async fn append(conn: &Connection, record: &LogRecord) -> Result<i64> {
        let citations = record.citations.join(CITATION_SEPARATOR);

        conn.execute(
            r#"
            INSERT INTO logs (
                question, raw_answer, corrected_answer, citations,
                confidence_score, detection_method
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6
            )
            "#,
            params![
                record.question.clone(),
                record.raw_answer.clone(),
                record.corrected_answer.clone(),
                citations,
                record.confidence_score.map(f64::from),
                record.detection_method.clone(),
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    pub async fn list_recent(conn: &Connection, limit: u32) -> Result<Vec<LogEntry>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, timestamp, question, raw_answer, corrected_answer,
                       citations, confidence_score, detection_method
                FROM logs
                ORDER BY id DESC
                LIMIT ?1
                "#,
                params![i64::from(limit)],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_entry(&row)?);
        }

        Ok(results)
    }

    fn row_to_entry(row: &Row) -> Result<LogEntry> {
        let timestamp: String = row.get(1)?;
        let citations: Option<String> = row.get(5)?;
        let confidence_score: Option<f64> = row.get(6)?;

        Ok(LogEntry {
            id: row.get(0)?,
            timestamp: parse_timestamp(&timestamp)?,
            question: row.get(2)?,
            raw_answer: row.get(3)?,
            corrected_answer: row.get(4)?,
            citations: split_citations(citations.as_deref()),
            confidence_score: confidence_score.map(|score| score as f32),
            detection_method: row.get(7)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| VeracityError::Internal(format!("Invalid log timestamp '{value}': {e}")))
}

fn split_citations(value: Option<&str>) -> Vec<String> {
    match value {
        Some(joined) if !joined.is_empty() => joined
            .split(CITATION_SEPARATOR)
            .map(|citation| citation.to_string())
            .collect(),
        _ => Vec::new(),
    }
}
