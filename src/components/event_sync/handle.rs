use super::actor::{EventSyncActor, EventSyncActorHandle};
use super::parser::LineParser;
use super::synchronizer::{EventSynchronizer, SyncReport};
use crate::error::BotResult;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the event sync actor
#[derive(Debug, Clone)]
pub struct EventSyncHandle {
    actor_handle: EventSyncActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl EventSyncHandle {
    /// Create a new EventSyncHandle and spawn the actor
    pub fn new(parser: LineParser, synchronizer: EventSynchronizer) -> Self {
        let (mut actor, handle) = EventSyncActor::new(parser, synchronizer);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Parse a message and sync every event found in it
    pub async fn process_message(&self, text: impl Into<String>) -> BotResult<SyncReport> {
        self.actor_handle.process_message(text.into()).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}
