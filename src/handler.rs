use async_trait::async_trait;
use serenity::all::{Context, EventHandler, Guild, GuildId, Ready};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::archiver::{ArchiveOptions, Archiver};
use crate::db::MessageStore;
use crate::source::SerenitySource;

/// Runs the archival job once, as soon as the target guild is cached or known
/// to be unavailable.
pub struct ArchiveHandler {
    store: Arc<dyn MessageStore>,
    options: ArchiveOptions,
    started: AtomicBool,
}

/// Whether the job starts from `ready` itself. A guild missing from the ready
/// payload is never cached, so the run has to report it as not found.
fn archive_on_ready(target: u64, ready_guilds: &[u64]) -> bool {
    !ready_guilds.contains(&target)
}

impl ArchiveHandler {
    pub fn new(store: Arc<dyn MessageStore>, options: ArchiveOptions) -> Self {
        Self {
            store,
            options,
            started: AtomicBool::new(false),
        }
    }

    /// True for the first caller only.
    fn claim_run(&self) -> bool {
        !self.started.swap(true, Ordering::SeqCst)
    }

    async fn run_once(&self, ctx: Context, trigger: &str) {
        if !self.claim_run() {
            debug!("{}: archive already ran", trigger);
            return;
        }

        info!("Starting archive on {}.", trigger);
        let source = SerenitySource::new(ctx);
        let mut archiver = Archiver::new(self.store.clone(), self.options);
        match archiver.run(&source).await {
            Ok(report) => info!(
                "Archive complete: {} archived, {} inserted. Idling until interrupted.",
                report.archived, report.inserted
            ),
            Err(e) => error!("Archive failed: {}", e),
        }
    }
}

#[async_trait]
impl EventHandler for ArchiveHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Logged in as {} ({}) with {} guilds.",
            ready.user.name,
            ready.user.id,
            ready.guilds.len()
        );

        let guilds: Vec<u64> = ready.guilds.iter().map(|g| g.id.get()).collect();
        if archive_on_ready(self.options.guild_id, &guilds) {
            self.run_once(ctx, "ready").await;
        } else {
            debug!("Waiting for guild {} to be cached", self.options.guild_id);
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, _is_new: Option<bool>) {
        if guild.id.get() == self.options.guild_id {
            self.run_once(ctx, "guild create").await;
        }
    }

    async fn cache_ready(&self, ctx: Context, _guilds: Vec<GuildId>) {
        self.run_once(ctx, "cache ready").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteMessageStore;
    use crate::filter::FilterOptions;

    #[tokio::test]
    async fn test_job_is_claimed_once() {
        let store = Arc::new(SqliteMessageStore::open(":memory:").await.unwrap());
        let handler = ArchiveHandler::new(
            store,
            ArchiveOptions {
                guild_id: 1,
                filter: FilterOptions::default(),
            },
        );

        assert!(handler.claim_run());
        assert!(!handler.claim_run());
        assert!(!handler.claim_run());
    }

    #[test]
    fn test_ready_starts_job_when_guild_cannot_arrive() {
        // No guilds at all: nothing will ever be cached.
        assert!(archive_on_ready(10, &[]));
        // The bot is not a member of the target guild.
        assert!(archive_on_ready(10, &[20, 30]));
    }

    #[test]
    fn test_ready_waits_for_a_listed_guild() {
        assert!(!archive_on_ready(10, &[10]));
        assert!(!archive_on_ready(10, &[20, 10, 30]));
    }
}
