use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::TableError;
use crate::record::Record;

/// Append-only store of ingested records on top of a SQLite table.
/// Insertion order is the table's rowid order, which is what every scan
/// returns. Connections are acquired from the pool per operation, never held
/// across operations.
pub struct RowStore {
    table: String,
    pool: SqlitePool,
}

impl RowStore {
    /// Open (creating if missing) the database at `url` and ensure `table`
    /// exists with the fixed message schema.
    pub async fn new(table: &str, url: &str) -> Result<Self, TableError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|error| TableError::ConnectionError { error })?
            .create_if_missing(true);

        // SQLite supports a single writer; one pooled connection also keeps
        // in-memory databases alive between operations.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|error| TableError::ConnectionError { error })?;

        let base_query = format!(
            r#"
CREATE TABLE IF NOT EXISTS "{0}" (
    message_id INTEGER NOT NULL,
    version INTEGER NOT NULL,
    item_id INTEGER NOT NULL,
    location TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    transaction_datetime TEXT NOT NULL,
    transaction_number INTEGER NOT NULL,
    duplicate INTEGER NOT NULL
)
            "#,
            table
        );

        sqlx::query(&base_query)
            .execute(&pool)
            .await
            .map_err(|error| TableError::QueryError {
                command: "CREATE TABLE".to_owned(),
                error,
            })?;

        Ok(Self {
            table: table.to_owned(),
            pool,
        })
    }

    /// Append one record. We take a reference but the row is immutable once
    /// written; nothing in this crate updates or deletes rows.
    pub async fn insert(&self, record: &Record) -> Result<(), TableError> {
        let base_query = format!(
            r#"
INSERT INTO "{0}"
    (message_id, version, item_id, location, quantity, transaction_datetime, transaction_number, duplicate)
VALUES
    (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            &self.table
        );

        sqlx::query(&base_query)
            .bind(record.message_id)
            .bind(record.version)
            .bind(record.item_id)
            .bind(&record.location)
            .bind(record.quantity)
            .bind(&record.transaction_datetime)
            .bind(record.transaction_number)
            .bind(record.duplicate)
            .execute(&self.pool)
            .await
            .map_err(|error| TableError::QueryError {
                command: "INSERT".to_owned(),
                error,
            })?;

        Ok(())
    }

    /// Every record, in insertion order.
    pub async fn scan_all(&self) -> Result<Vec<Record>, TableError> {
        let base_query = format!(
            r#"
SELECT
    message_id, version, item_id, location, quantity, transaction_datetime, transaction_number, duplicate
FROM
    "{0}"
ORDER BY
    rowid
            "#,
            &self.table
        );

        sqlx::query_as::<_, Record>(&base_query)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| TableError::QueryError {
                command: "SELECT".to_owned(),
                error,
            })
    }

    /// Whether any stored record carries this message id.
    pub async fn exists(&self, message_id: i64) -> Result<bool, TableError> {
        let base_query = format!(
            r#"SELECT 1 FROM "{0}" WHERE message_id = ?1 LIMIT 1"#,
            &self.table
        );

        let row = sqlx::query(&base_query)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| TableError::QueryError {
                command: "SELECT".to_owned(),
                error,
            })?;

        Ok(row.is_some())
    }
}
