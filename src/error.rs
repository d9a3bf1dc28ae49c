use thiserror::Error;

/// Failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage worker failed: {0}")]
    Worker(String),
}

/// Errors surfaced by the archival job.
///
/// Channel-level variants are contained by the job and only logged; the rest
/// end the run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("guild {0} not found")]
    GuildNotFound(u64),

    #[error("missing read-history permission in #{channel} ({channel_id})")]
    PermissionDenied { channel_id: u64, channel: String },

    #[error("history of channel {channel_id} failed: {reason}")]
    ChannelHistory { channel_id: u64, reason: String },

    #[error("could not establish a storage connection: {0}")]
    StorageConnection(#[source] StorageError),

    #[error("batch insert failed: {0}")]
    StorageWrite(#[source] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_object() {
        assert_eq!(ArchiveError::GuildNotFound(42).to_string(), "guild 42 not found");
        let denied = ArchiveError::PermissionDenied {
            channel_id: 9,
            channel: "staff".to_string(),
        };
        assert_eq!(
            denied.to_string(),
            "missing read-history permission in #staff (9)"
        );
    }
}
