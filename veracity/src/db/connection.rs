use libsql::{Builder, Connection};
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Where the correction log lives, derived from `DATABASE_URL` and friends.
#[derive(Debug, Clone, PartialEq)]
enum Location {
    Memory,
    Local(String),
    Remote { url: String, token: String },
    Replica { path: String, url: String, token: String },
}

impl Location {
    fn from_config(config: &DatabaseConfig) -> Self {
        let url = config.url.trim();
        if url.starts_with("libsql://") || url.starts_with("https://") {
            let token = config.auth_token.clone().unwrap_or_default();
            return match &config.local_path {
                Some(path) => Self::Replica {
                    path: path.clone(),
                    url: url.to_string(),
                    token,
                },
                None => Self::Remote {
                    url: url.to_string(),
                    token,
                },
            };
        }
        if url == ":memory:" {
            return Self::Memory;
        }
        Self::Local(url.strip_prefix("file:").unwrap_or(url).to_string())
    }

    /// PRAGMAs only apply to a SQLite file we own.
    fn is_local(&self) -> bool {
        matches!(self, Self::Memory | Self::Local(_) | Self::Replica { .. })
    }
}

#[derive(Clone)]
pub struct Database {
    db: Arc<libsql::Database>,
    location: Location,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let location = Location::from_config(config);
        let db = match &location {
            Location::Memory => Builder::new_local(":memory:").build().await?,
            Location::Local(path) => Builder::new_local(path).build().await?,
            Location::Remote { url, token } => {
                Builder::new_remote(url.clone(), token.clone()).build().await?
            }
            Location::Replica { path, url, token } => {
                Builder::new_remote_replica(path, url.clone(), token.clone())
                    .build()
                    .await?
            }
        };

        let database = Self {
            db: Arc::new(db),
            location,
        };
        if database.location.is_local() {
            database.apply_pragmas(config).await?;
        }
        schema::init_schema(&database.connect()?).await?;

        tracing::info!(location = ?database.location_kind(), "Correction log database ready");
        Ok(database)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(self.db.connect()?)
    }

    fn location_kind(&self) -> &'static str {
        match self.location {
            Location::Memory => "memory",
            Location::Local(_) => "local",
            Location::Remote { .. } => "remote",
            Location::Replica { .. } => "replica",
        }
    }

    async fn apply_pragmas(&self, config: &DatabaseConfig) -> Result<()> {
        let conn = self.connect()?;
        let pragmas = [
            ("busy_timeout", config.busy_timeout_ms.to_string()),
            ("journal_mode", normalize_journal_mode(&config.journal_mode).to_string()),
            ("synchronous", normalize_synchronous(&config.synchronous).to_string()),
        ];

        for (name, value) in pragmas {
            if let Err(error) = conn.execute_batch(&format!("PRAGMA {name} = {value}")).await {
                tracing::warn!(pragma = name, value = %value, error = %error, "Failed to set SQLite pragma");
            }
        }

        Ok(())
    }

    /// Pulls remote frames into the embedded replica. No-op otherwise.
    pub async fn sync(&self) -> Result<()> {
        if let Location::Replica { .. } = self.location {
            let replicated = self.db.sync().await?;
            tracing::debug!(?replicated, "Replica synced");
        }
        Ok(())
    }

    /// Cheap round trip used by the health check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.query("SELECT 1", ()).await?;
        Ok(())
    }
}

fn normalize_journal_mode(value: &str) -> &'static str {
    match value.trim().to_uppercase().as_str() {
        "DELETE" => "DELETE",
        "TRUNCATE" => "TRUNCATE",
        "PERSIST" => "PERSIST",
        "MEMORY" => "MEMORY",
        "OFF" => "OFF",
        _ => "WAL",
    }
}

fn normalize_synchronous(value: &str) -> &'static str {
    match value.trim().to_uppercase().as_str() {
        "OFF" => "OFF",
        "FULL" => "FULL",
        "EXTRA" => "EXTRA",
        _ => "NORMAL",
    }
}
