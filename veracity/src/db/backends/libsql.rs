use async_trait::async_trait;

use crate::db::connection::Database;
use crate::db::repository::LogRepository;
use crate::db::traits::{CorrectionLogStore, DatabaseBackend, LogEntry, LogRecord};
use crate::error::Result;

#[derive(Clone)]
pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CorrectionLogStore for LibSqlBackend {
    async fn append(&self, record: &LogRecord) -> Result<i64> {
        let conn = self.db.connect()?;
        LogRepository::append(&conn, record).await
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<LogEntry>> {
        let conn = self.db.connect()?;
        LogRepository::list_recent(&conn, limit).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}
