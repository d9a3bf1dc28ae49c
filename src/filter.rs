use crate::model::{ArchivedMessage, ChannelInfo, GuildInfo, SourceMessage};

/// Id of the placeholder account Discord substitutes for deleted users.
pub const DELETED_USER_ID: u64 = 456_226_577_798_135_808;
pub const DELETED_USER_NAME: &str = "Deleted User";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub exclude_deleted_users: bool,
    pub track_channel_id: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            exclude_deleted_users: true,
            track_channel_id: true,
        }
    }
}

pub fn is_deleted_user(message: &SourceMessage) -> bool {
    message.author_id == DELETED_USER_ID || message.author_name == DELETED_USER_NAME
}

/// Maps a fetched message to the row that should be stored, or `None` when the
/// message is not worth archiving.
///
/// Bot authors and messages with neither text (once NULs are stripped) nor
/// attachments are always dropped. Deleted-user placeholders are dropped when configured.
pub fn archive_message(
    message: &SourceMessage,
    guild: &GuildInfo,
    channel: &ChannelInfo,
    options: FilterOptions,
) -> Option<ArchivedMessage> {
    if message.author_is_bot {
        return None;
    }
    if options.exclude_deleted_users && is_deleted_user(message) {
        return None;
    }
    // Emptiness is judged on the stored text, after NULs are stripped.
    let content = message.content.replace('\0', "");
    if content.is_empty() && message.attachments.is_empty() {
        return None;
    }

    Some(ArchivedMessage {
        user_id: message.author_id,
        message: content,
        guild_name: guild.name.clone(),
        guild_id: guild.id,
        channel_id: options.track_channel_id.then_some(channel.id),
        timestamp: message.created_at,
        attachment: message.attachments.first().cloned(),
    })
}
