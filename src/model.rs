//! Plain data carried between the chat source, the filter and storage.

/// A historical message as yielded by a chat source, free of any client types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMessage {
    pub id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    /// Attachment URLs in the order the platform lists them.
    pub attachments: Vec<String>,
    /// Creation time in whole Unix seconds.
    pub created_at: i64,
}

/// One row of the `messages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedMessage {
    pub user_id: u64,
    pub message: String,
    pub guild_name: String,
    pub guild_id: u64,
    pub channel_id: Option<u64>,
    pub timestamp: i64,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
    /// The bot may view the channel and read its history.
    pub can_read_history: bool,
}
