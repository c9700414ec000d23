use crate::calendar::GoogleCalendarClient;
use crate::config::Config;
use crate::discord::Handler;
use crate::error::Error;
use crate::shutdown;
use crate::sync::SyncActor;
use serenity::all::{Client, GatewayIntents};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,serenity=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    // Get Discord token
    let token = {
        let config_read = config.read().await;
        config_read.discord_token.clone()
    };

    // Scheduled-event updates require the guild scheduled events intent
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_SCHEDULED_EVENTS;

    // Build the Google Calendar client and spawn the sync actor ahead
    // of the gateway connection, so changes delivered while the
    // handshake is still in flight queue in its mailbox instead of
    // being lost
    let calendar = Arc::new(GoogleCalendarClient::new(Arc::clone(&config)));
    let (mut actor, sync_handle) = SyncActor::new(calendar);
    tokio::spawn(async move {
        actor.run().await;
    });

    let handler = Handler::new(Arc::clone(&config), sync_handle.clone());

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let shutdown_sync = sync_handle.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_sync).await;
    });

    // Start the bot
    info!("Starting bot...");
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(Error::from)?;

    // Create a separate task to handle the client
    let client_handle = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            Err(Error::from(e))
        } else {
            Ok(())
        }
    });

    // Wait for either the client to end or a shutdown signal
    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            Ok(())
        }
    }
}
