// Archived messages. A message is identified by its author, text and second of
// creation; re-archiving the same message is a no-op.
pub const CREATE_MESSAGES: &str = "
CREATE TABLE IF NOT EXISTS messages (
    user_id BIGINT NOT NULL,
    message TEXT NOT NULL,
    guild_name TEXT NOT NULL,
    guild_id BIGINT NOT NULL,
    channel_id BIGINT,
    timestamp BIGINT NOT NULL,
    attachment TEXT,
    UNIQUE (user_id, message, timestamp)
)";

pub const INSERT_COLUMNS: &str =
    "INSERT INTO messages (user_id, message, guild_name, guild_id, channel_id, timestamp, attachment) ";

pub const ON_CONFLICT: &str = " ON CONFLICT (user_id, message, timestamp) DO NOTHING";

pub const COUNT_MESSAGES: &str = "SELECT COUNT(*) FROM messages";

/// Bound values per row.
pub const COLUMN_COUNT: usize = 7;
