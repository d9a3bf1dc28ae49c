use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ArchiveError;
use crate::model::{ChannelInfo, GuildInfo, SourceMessage};

pub mod discord;

pub use discord::SerenitySource;

/// Read-only view of a connected chat client.
///
/// Implementations own their own rate limiting; every method either succeeds
/// or fails with a typed error.
#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Looks up a guild the client can see, failing with `GuildNotFound`.
    async fn resolve_guild(&self, guild_id: u64) -> Result<GuildInfo, ArchiveError>;

    /// Text channels of the guild in the order the client presents them.
    async fn text_channels(&self, guild: &GuildInfo) -> Result<Vec<ChannelInfo>, ArchiveError>;

    /// Full history of a channel, typically newest first.
    fn history<'a>(
        &'a self,
        channel: &'a ChannelInfo,
    ) -> BoxStream<'a, Result<SourceMessage, ArchiveError>>;
}
