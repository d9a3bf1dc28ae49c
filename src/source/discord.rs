use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serenity::all::{
    ChannelId, ChannelType, Context, GuildChannel, GuildId, Member, Message, Permissions, UserId,
};
use tracing::{debug, warn};

use super::ChatSource;
use crate::error::ArchiveError;
use crate::model::{ChannelInfo, GuildInfo, SourceMessage};

/// `ChatSource` backed by a live serenity context. Guild and channel state
/// come from the cache, history comes from the HTTP API.
#[derive(Clone)]
pub struct SerenitySource {
    ctx: Context,
}

impl SerenitySource {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// The bot's own member record, from the cache when present.
    async fn bot_member(&self, guild_id: GuildId, bot_id: UserId) -> Option<Member> {
        let cached = self
            .ctx
            .cache
            .guild(guild_id)
            .and_then(|guild| guild.members.get(&bot_id).cloned());
        if cached.is_some() {
            return cached;
        }

        debug!("Own member not cached for guild {}, fetching", guild_id);
        match guild_id.member(&self.ctx, bot_id).await {
            Ok(member) => Some(member),
            Err(e) => {
                warn!("Could not fetch own member in guild {}: {}", guild_id, e);
                None
            }
        }
    }
}

fn is_text_channel(channel: &GuildChannel) -> bool {
    matches!(channel.kind, ChannelType::Text | ChannelType::News)
}

/// Text and news channels, ordered by (position, id) as the client UI lists
/// them. The cache holds channels in an unordered map.
pub fn text_channels_in_order<'a>(
    channels: impl IntoIterator<Item = &'a GuildChannel>,
) -> Vec<&'a GuildChannel> {
    let mut text: Vec<&GuildChannel> = channels
        .into_iter()
        .filter(|c| is_text_channel(c))
        .collect();
    text.sort_by_key(|c| (c.position, c.id));
    text
}

fn can_read_history(permissions: Permissions) -> bool {
    permissions.view_channel() && permissions.read_message_history()
}

pub fn to_source_message(message: &Message) -> SourceMessage {
    SourceMessage {
        id: message.id.get(),
        author_id: message.author.id.get(),
        author_name: message.author.name.clone(),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        attachments: message.attachments.iter().map(|a| a.url.clone()).collect(),
        created_at: message.timestamp.unix_timestamp(),
    }
}

#[async_trait]
impl ChatSource for SerenitySource {
    async fn resolve_guild(&self, guild_id: u64) -> Result<GuildInfo, ArchiveError> {
        let guild = self
            .ctx
            .cache
            .guild(GuildId::new(guild_id))
            .ok_or(ArchiveError::GuildNotFound(guild_id))?;

        Ok(GuildInfo {
            id: guild.id.get(),
            name: guild.name.clone(),
        })
    }

    async fn text_channels(&self, guild: &GuildInfo) -> Result<Vec<ChannelInfo>, ArchiveError> {
        let guild_id = GuildId::new(guild.id);
        let bot_id = self.ctx.cache.current_user().id;
        let member = self.bot_member(guild_id, bot_id).await;

        let cached = self
            .ctx
            .cache
            .guild(guild_id)
            .ok_or(ArchiveError::GuildNotFound(guild.id))?;

        Ok(text_channels_in_order(cached.channels.values())
            .into_iter()
            .map(|channel| {
                let permissions = member
                    .as_ref()
                    .map(|m| cached.user_permissions_in(channel, m))
                    .unwrap_or_else(Permissions::empty);
                ChannelInfo {
                    id: channel.id.get(),
                    name: channel.name.clone(),
                    can_read_history: can_read_history(permissions),
                }
            })
            .collect())
    }

    fn history<'a>(
        &'a self,
        channel: &'a ChannelInfo,
    ) -> BoxStream<'a, Result<SourceMessage, ArchiveError>> {
        let channel_id = channel.id;
        ChannelId::new(channel_id)
            .messages_iter(&self.ctx)
            .map(move |result| {
                result
                    .map(|message| to_source_message(&message))
                    .map_err(|e| ArchiveError::ChannelHistory {
                        channel_id,
                        reason: e.to_string(),
                    })
            })
            .boxed()
    }
}
