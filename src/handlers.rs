use crate::commands::CommandContext;
use discord_calendar_sync::components::event_sync::SyncReport;
use discord_calendar_sync::error::{BotResult, Error};
use poise::serenity_prelude as serenity;
use tracing::{error, info};

/// Framework event handler; only messages in the calendar channel are acted on
pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, CommandContext, Error>,
    data: &CommandContext,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        if new_message.channel_id.get() == data.config.channel_id {
            handle_channel_message(data, new_message).await;
        }
    }

    Ok(())
}

/// Process the most recent channel messages, oldest first
pub async fn backfill(ctx: &serenity::Context, data: &CommandContext) -> BotResult<()> {
    let limit = data.config.backfill_messages;
    if limit == 0 {
        return Ok(());
    }

    let channel_id = serenity::ChannelId::new(data.config.channel_id);
    let mut messages = channel_id
        .messages(&ctx.http, serenity::GetMessages::new().limit(limit))
        .await?;
    messages.reverse();

    info!("Backfilling {} recent messages", messages.len());
    for message in &messages {
        handle_channel_message(data, message).await;
    }

    Ok(())
}

async fn handle_channel_message(data: &CommandContext, message: &serenity::Message) {
    info!(message_id = %message.id, "New message in calendar channel");

    match data.event_sync.process_message(message.content.as_str()).await {
        Ok(report) => log_report(message.id, &report),
        Err(e) => error!("Failed to process message {}: {}", message.id, e),
    }
}

fn log_report(message_id: serenity::MessageId, report: &SyncReport) {
    if report.parsed == 0 {
        return;
    }

    info!(
        message_id = %message_id,
        parsed = report.parsed,
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "Synced message events"
    );
}
