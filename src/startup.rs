use crate::commands::{create_error_embed, get_all_application_commands, CommandContext};
use crate::handlers;
use crate::shutdown;
use discord_calendar_sync::components::event_sync::{
    EventSyncHandle, EventSynchronizer, LineParser,
};
use discord_calendar_sync::components::google_calendar::{GoogleCalendarClient, TokenManager};
use discord_calendar_sync::config::Config;
use discord_calendar_sync::error::{other_error, Error};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter directives appended to the base level
const QUIET_CRATES: &str = "serenity=warn,poise=warn";

/// Initialize logging with environment-based configuration.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` picks the base level.
pub fn init_logging() -> miette::Result<()> {
    // LOG_LEVEL may live in .env
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(std::env::var("LOG_LEVEL").ok().as_deref()));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

fn default_filter(level: Option<&str>) -> EnvFilter {
    let level = level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or("info");

    EnvFilter::try_new(format!("{},{}", level, QUIET_CRATES))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{}", QUIET_CRATES)))
}

/// Load the application config. Missing settings are fatal.
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => {
            info!(
                channel_id = config.channel_id,
                calendar_id = %config.google_calendar_id,
                marker_match = ?config.marker_match,
                "Configuration loaded"
            );
            Ok(Arc::new(config))
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Authenticate against Google Calendar and spawn the event sync actor
pub fn build_event_sync(config: &Config) -> miette::Result<EventSyncHandle> {
    let tokens = TokenManager::from_service_account_file(&config.google_credentials_path)?;
    let calendar = GoogleCalendarClient::new(config.google_calendar_id.clone(), Arc::new(tokens))?;

    let parser = LineParser::new(config.marker_match)
        .with_skip_line_prefixes(config.skip_line_prefixes.clone());

    Ok(EventSyncHandle::new(
        parser,
        EventSynchronizer::new(Arc::new(calendar)),
    ))
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<Config>, event_sync: EventSyncHandle) -> miette::Result<()> {
    let token = config.discord_token.clone();
    let activity = config.activity.clone();

    // Set up framework options
    let options = poise::FrameworkOptions {
        commands: get_all_application_commands(),
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(handlers::event_handler(ctx, event, framework, data))
        },
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some("!".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Message content is privileged and has to be enabled for the bot
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    // Create a shared data context for commands and events
    let command_data = CommandContext::new(Arc::clone(&config), event_sync.clone());

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, event_sync).await;
    });

    let client_result = serenity::ClientBuilder::new(token, intents)
        .framework(poise::Framework::new(
            options,
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("{} is connected!", ready.user.name);

                    // Set the bot's status
                    ctx.set_presence(
                        Some(serenity::ActivityData::watching(&activity)),
                        serenity::OnlineStatus::Online,
                    );
                    info!("Setting activity to {}", activity);

                    // Register slash commands
                    if let Err(e) =
                        poise::builtins::register_globally(ctx, &framework.options().commands).await
                    {
                        error!("Failed to register slash commands: {:?}", e);
                    } else {
                        info!("Slash commands registered successfully");
                    }

                    // Catch up on announcements posted while offline
                    let backfill_ctx = ctx.clone();
                    let backfill_data = command_data.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handlers::backfill(&backfill_ctx, &backfill_data).await {
                            error!("Failed to backfill channel messages: {}", e);
                        }
                    });

                    Ok(command_data)
                })
            },
        ))
        .await;

    // Start the bot
    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;

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
                    Err(other_error(&format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            Ok(())
        }
    }
}

/// Handle errors from commands
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .send(
                    poise::CreateReply::default()
                        .embed(create_error_embed("Command failed", &format!("{}", error)))
                        .ephemeral(true),
                )
                .await
            {
                error!("Error while sending error message: {:?}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, .. } => {
            error!("Error in event handler: {:?}", error);
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}

