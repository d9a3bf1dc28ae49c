//! The archival job: walk every readable text channel of one guild, keep the
//! messages worth archiving, and persist them in a single batch.

use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::db::MessageStore;
use crate::error::ArchiveError;
use crate::filter::{archive_message, FilterOptions};
use crate::model::{ArchivedMessage, ChannelInfo, GuildInfo};
use crate::source::ChatSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub guild_id: u64,
    pub filter: FilterOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Connecting,
    PerChannel { channel_id: u64 },
    Persisting,
    Done,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Messages that passed the filter and were sent to storage.
    pub archived: usize,
    /// Rows actually written; duplicates from earlier runs are not counted.
    pub inserted: u64,
    pub channels_archived: usize,
    pub channels_skipped: usize,
    pub channels_failed: usize,
    pub elapsed: Duration,
}

/// One run of the archival job. Channels are drained sequentially into an
/// in-memory buffer which is written with one conflict-ignoring batch insert.
pub struct Archiver {
    store: Arc<dyn MessageStore>,
    options: ArchiveOptions,
    state: JobState,
}

impl Archiver {
    pub fn new(store: Arc<dyn MessageStore>, options: ArchiveOptions) -> Self {
        Self {
            store,
            options,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    #[instrument(skip_all, fields(guild_id = self.options.guild_id))]
    pub async fn run(&mut self, source: &dyn ChatSource) -> Result<ArchiveReport, ArchiveError> {
        let started = Instant::now();
        self.state = JobState::Connecting;

        let (guild, channels) = match self.enumerate(source).await {
            Ok(found) => found,
            Err(e) => {
                self.state = JobState::Failed;
                error!("Archive aborted: {}", e);
                return Err(e);
            }
        };

        info!(
            "Archiving guild {} ({}) across {} text channels.",
            guild.name,
            guild.id,
            channels.len()
        );

        let mut report = ArchiveReport::default();
        let mut buffer: Vec<ArchivedMessage> = Vec::new();

        for channel in &channels {
            if !channel.can_read_history {
                let denied = ArchiveError::PermissionDenied {
                    channel_id: channel.id,
                    channel: channel.name.clone(),
                };
                warn!("Skipping channel: {}", denied);
                report.channels_skipped += 1;
                continue;
            }

            self.state = JobState::PerChannel {
                channel_id: channel.id,
            };
            info!("Archiving channel {} ({}).", channel.name, channel.id);

            let before = buffer.len();
            match self.drain_channel(source, &guild, channel, &mut buffer).await {
                Ok(()) => {
                    report.channels_archived += 1;
                    info!(
                        "Archived channel {} ({}): {} messages.",
                        channel.name,
                        channel.id,
                        buffer.len() - before
                    );
                }
                Err(e) => {
                    report.channels_failed += 1;
                    warn!(
                        "Abandoning channel {} ({}) after {} messages ({} buffered in total): {}",
                        channel.name,
                        channel.id,
                        buffer.len() - before,
                        buffer.len(),
                        e
                    );
                }
            }
        }

        report.archived = buffer.len();
        info!(
            "Archived guild {} ({}): {} messages from {} channels ({} skipped, {} failed).",
            guild.name,
            guild.id,
            report.archived,
            report.channels_archived,
            report.channels_skipped,
            report.channels_failed
        );

        self.state = JobState::Persisting;
        match self.store.insert_batch(&buffer).await {
            Ok(inserted) => report.inserted = inserted,
            Err(e) => {
                self.state = JobState::Failed;
                let e = ArchiveError::StorageWrite(e);
                error!("Persisting {} archived messages failed: {}", report.archived, e);
                return Err(e);
            }
        }

        self.state = JobState::Done;
        report.elapsed = started.elapsed();
        info!(
            "Inserted {} new rows of {} archived messages in {:.1?}.",
            report.inserted, report.archived, report.elapsed
        );
        Ok(report)
    }

    async fn enumerate(
        &self,
        source: &dyn ChatSource,
    ) -> Result<(GuildInfo, Vec<ChannelInfo>), ArchiveError> {
        let guild = source.resolve_guild(self.options.guild_id).await?;
        let channels = source.text_channels(&guild).await?;
        Ok((guild, channels))
    }

    /// Appends every archivable message of the channel to `buffer`. On error
    /// the messages gathered so far stay in the buffer.
    async fn drain_channel(
        &self,
        source: &dyn ChatSource,
        guild: &GuildInfo,
        channel: &ChannelInfo,
        buffer: &mut Vec<ArchivedMessage>,
    ) -> Result<(), ArchiveError> {
        let mut history = source.history(channel);
        while let Some(item) = history.next().await {
            let message = item?;
            if let Some(row) = archive_message(&message, guild, channel, self.options.filter) {
                debug!(
                    "Archived message {} by {} ({}).",
                    message.id, message.author_name, message.author_id
                );
                buffer.push(row);
            }
        }
        Ok(())
    }
}
