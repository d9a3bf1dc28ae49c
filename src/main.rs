use anyhow::Context as _;
use archivist::config::Config;
use archivist::handler::ArchiveHandler;
use serenity::all::{ClientBuilder, GatewayIntents};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    debug!("Loaded configuration: {:?}", config);

    // Without storage there is nothing to archive into.
    let store = archivist::db::connect(&config)
        .await
        .context("Could not establish a connection to the database")?;

    let handler = ArchiveHandler::new(store.clone(), config.archive_options());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for interrupt: {}", e);
            return;
        }
        info!("Interrupt received, shutting down...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting archiver...");
    let result = client.start().await;

    store.close().await;
    info!("Storage closed.");

    result.map_err(|e| anyhow::anyhow!("Client error: {}", e))
}
