use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{schema, to_db_id, MessageStore};
use crate::error::StorageError;
use crate::model::ArchivedMessage;

/// Single-connection SQLite archive. Calls run on the blocking pool.
#[derive(Clone)]
pub struct SqliteMessageStore {
    // `None` once closed.
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteMessageStore {
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || Self::open_blocking(&path))
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?
    }

    fn open_blocking(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        info!(
            "Established a connection to SQLite ({}) at {}.",
            rusqlite::version(),
            path
        );

        debug!("Database: Initializing schema...");
        conn.execute_batch(schema::CREATE_MESSAGES)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    async fn run_blocking<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StorageError::Worker("sqlite connection lock poisoned".to_string()))?;
            let conn = guard
                .as_mut()
                .ok_or_else(|| StorageError::Worker("sqlite archive is closed".to_string()))?;
            f(conn)
        })
        .await
        .map_err(|e| StorageError::Worker(e.to_string()))?
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn insert_batch(&self, rows: &[ArchivedMessage]) -> Result<u64, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let rows = rows.to_vec();
        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0u64;
            {
                let sql = format!(
                    "{}VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7){}",
                    schema::INSERT_COLUMNS,
                    schema::ON_CONFLICT
                );
                let mut stmt = tx.prepare(&sql)?;
                for row in &rows {
                    inserted += stmt.execute(params![
                        to_db_id(row.user_id),
                        row.message,
                        row.guild_name,
                        to_db_id(row.guild_id),
                        row.channel_id.map(to_db_id),
                        row.timestamp,
                        row.attachment,
                    ])? as u64;
                }
            }
            tx.commit()?;
            debug!("Database: inserted {} of {} rows", inserted, rows.len());
            Ok(inserted)
        })
        .await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.run_blocking(|conn| {
            let count: i64 = conn.query_row(schema::COUNT_MESSAGES, [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    /// Closes the connection for every clone of this store; later calls fail.
    async fn close(&self) {
        let conn = self.conn.clone();
        let closed = tokio::task::spawn_blocking(move || {
            let taken = conn.lock().ok().and_then(|mut guard| guard.take());
            match taken {
                Some(conn) => conn.close().map_err(|(_, e)| StorageError::Sqlite(e)),
                None => Ok(()),
            }
        })
        .await;

        match closed {
            Ok(Ok(())) => debug!("Database: SQLite archive closed"),
            Ok(Err(e)) => warn!("Database: closing SQLite archive failed: {}", e),
            Err(e) => warn!("Database: closing SQLite archive failed: {}", e),
        }
    }
}
