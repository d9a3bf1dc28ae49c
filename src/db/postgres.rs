//! PostgreSQL archive backed by an sqlx pool.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{schema, to_db_id, MessageStore};
use crate::error::StorageError;
use crate::model::ArchivedMessage;

/// Rows per statement, bounded by the protocol's 65535 bind parameters.
pub const ROWS_PER_STATEMENT: usize = u16::MAX as usize / schema::COLUMN_COUNT;

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Connects, logs the server version, and creates the schema if missing.
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
    ) -> Result<Self, StorageError> {
        let host = options.get_host().to_string();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let version: String = sqlx::query_scalar("SHOW server_version")
            .fetch_one(&pool)
            .await?;
        info!(
            "Established a connection to PostgreSQL ({}) on {}.",
            version, host
        );

        let store = Self { pool };
        store.execute_init().await?;
        Ok(store)
    }

    pub async fn execute_init(&self) -> Result<(), StorageError> {
        debug!("Database: Initializing schema...");
        sqlx::query(schema::CREATE_MESSAGES)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert_batch(&self, rows: &[ArchivedMessage]) -> Result<u64, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(schema::INSERT_COLUMNS);
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(to_db_id(row.user_id))
                    .push_bind(row.message.as_str())
                    .push_bind(row.guild_name.as_str())
                    .push_bind(to_db_id(row.guild_id))
                    .push_bind(row.channel_id.map(to_db_id))
                    .push_bind(row.timestamp)
                    .push_bind(row.attachment.as_deref());
            });
            builder.push(schema::ON_CONFLICT);

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!("Database: inserted {} of {} rows", inserted, rows.len());
        Ok(inserted)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(schema::COUNT_MESSAGES)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_fit_the_bind_limit() {
        assert!(ROWS_PER_STATEMENT * schema::COLUMN_COUNT <= u16::MAX as usize);
        assert!(ROWS_PER_STATEMENT > 1000);
    }
}
