mod commands;
mod handlers;
mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting discord-calendar-sync");

    // Load configuration
    let config = startup::load_config()?;

    // Build the calendar client before anything talks to Discord
    let event_sync = startup::build_event_sync(&config)?;

    // Start the bot
    startup::start_bot(config, event_sync).await
}
