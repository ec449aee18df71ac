use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per corrected answer
        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            question TEXT NOT NULL,
            raw_answer TEXT NOT NULL,
            corrected_answer TEXT,
            citations TEXT,
            confidence_score REAL
        );

        CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);
        "#,
    )
    .await?;

    migrate_detection_method_column(conn).await?;

    Ok(())
}

/// Databases written before detection methods were recorded lack the column.
async fn migrate_detection_method_column(conn: &Connection) -> Result<()> {
    let column_exists: bool = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info('logs') WHERE name='detection_method'",
            (),
        )
        .await?
        .next()
        .await?
        .map(|row| row.get::<i64>(0).unwrap_or(0) > 0)
        .unwrap_or(false);

    if !column_exists {
        tracing::info!("Migrating logs table: adding detection_method column");
        conn.execute("ALTER TABLE logs ADD COLUMN detection_method TEXT", ())
            .await?;
        tracing::info!("Migration complete: detection_method column added");
    }

    Ok(())
}
