use super::parser::LineParser;
use super::synchronizer::{EventSynchronizer, SyncReport};
use crate::error::{event_sync_error, BotResult};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// The event sync actor, which handles one message at a time
pub struct EventSyncActor {
    parser: LineParser,
    synchronizer: EventSynchronizer,
    command_rx: mpsc::Receiver<EventSyncCommand>,
}

/// Commands that can be sent to the event sync actor
pub enum EventSyncCommand {
    ProcessMessage(String, mpsc::Sender<SyncReport>),
    Shutdown,
}

/// Handle for communicating with the event sync actor
#[derive(Debug, Clone)]
pub struct EventSyncActorHandle {
    command_tx: mpsc::Sender<EventSyncCommand>,
}

impl EventSyncActorHandle {
    /// Parse a message and sync every event found in it
    pub async fn process_message(&self, text: String) -> BotResult<SyncReport> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(EventSyncCommand::ProcessMessage(text, response_tx))
            .await
            .map_err(|e| event_sync_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| event_sync_error("Response channel closed"))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(EventSyncCommand::Shutdown).await;
        Ok(())
    }
}

impl EventSyncActor {
    /// Create a new actor and return its handle
    pub fn new(parser: LineParser, synchronizer: EventSynchronizer) -> (Self, EventSyncActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            parser,
            synchronizer,
            command_rx,
        };

        let handle = EventSyncActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Event sync actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                EventSyncCommand::ProcessMessage(text, response_tx) => {
                    let report = self.process_message(&text).await;
                    let _ = response_tx.send(report).await;
                }
                EventSyncCommand::Shutdown => {
                    info!("Event sync actor shutting down");
                    break;
                }
            }
        }

        info!("Event sync actor shut down");
    }

    /// Sync every event line of a message. A failing line is logged and
    /// does not stop the remaining lines.
    async fn process_message(&self, text: &str) -> SyncReport {
        let mut report = SyncReport::default();

        for (line_number, line) in self.parser.event_lines(text) {
            let Some(event) = self.parser.parse_line(line) else {
                debug!(line = line_number, "No event marker in line");
                continue;
            };
            report.parsed += 1;

            let result = self.synchronizer.sync(&event).await;
            if let Err(e) = &result {
                error!(line = line_number, "Failed to sync event {}: {}", event, e);
            }
            report.record(&result);
        }

        report
    }
}
