use discord_calendar_sync::components::EventSyncHandle;
use discord_calendar_sync::config::Config;
use discord_calendar_sync::error::{BotResult, Error};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

// Export submodules
pub mod util;

/// Shared data for commands and event handlers
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub event_sync: EventSyncHandle,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: Arc<Config>, event_sync: EventSyncHandle) -> Self {
        Self { config, event_sync }
    }
}

/// Type alias for command result
pub type CommandResult = BotResult<()>;

/// Type alias for poise context
pub type Context<'a> = poise::Context<'a, CommandContext, Error>;

/// All application commands
pub fn get_all_application_commands() -> Vec<poise::Command<CommandContext, Error>> {
    vec![util::ping()]
}

/// Embed for successful command responses
pub fn create_success_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(serenity::Colour::DARK_GREEN)
}

/// Embed for command failures
pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(serenity::Colour::RED)
}
