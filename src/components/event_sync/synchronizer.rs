use super::parser::ParsedEvent;
use crate::components::google_calendar::{
    CalendarEvent, CalendarService, EventDateTime, NewCalendarEvent,
};
use crate::error::BotResult;
use crate::utils::time::{parse_google_datetime, to_google_datetime};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of syncing one parsed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new calendar event was created
    Inserted,
    /// An identical event already existed
    Skipped,
}

/// Per-message tally of what happened to each event line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub parsed: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncReport {
    /// Count one line's outcome
    pub fn record(&mut self, result: &BotResult<SyncOutcome>) {
        match result {
            Ok(SyncOutcome::Inserted) => self.inserted += 1,
            Ok(SyncOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Inserts parsed events into a calendar unless they already exist
#[derive(Clone)]
pub struct EventSynchronizer {
    calendar: Arc<dyn CalendarService>,
}

impl EventSynchronizer {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }

    /// Check the event's window for a duplicate and insert the event if none exists
    pub async fn sync(&self, event: &ParsedEvent) -> BotResult<SyncOutcome> {
        let candidates = self.calendar.list_events(event.start, event.end).await?;

        if let Some(existing) = candidates.iter().find(|c| is_duplicate(c, event)) {
            info!(
                event_id = %existing.id,
                "Event {} already exists, skipping",
                event
            );
            return Ok(SyncOutcome::Skipped);
        }

        let created = self.calendar.insert_event(&new_calendar_event(event)).await?;
        info!(event_id = %created.id, "Inserted event {}", event);

        Ok(SyncOutcome::Inserted)
    }
}

/// Build the insertion body for a parsed event
pub fn new_calendar_event(event: &ParsedEvent) -> NewCalendarEvent {
    let utc = |time: &DateTime<Utc>| EventDateTime {
        date_time: Some(to_google_datetime(time)),
        date: None,
        time_zone: Some("UTC".to_string()),
    };

    NewCalendarEvent {
        summary: event.description.clone(),
        start: utc(&event.start),
        end: utc(&event.end),
    }
}

/// An existing event is a duplicate when its summary matches exactly and it
/// covers exactly the same instants
pub fn is_duplicate(candidate: &CalendarEvent, event: &ParsedEvent) -> bool {
    if candidate.summary.as_deref() != Some(event.description.as_str()) {
        return false;
    }

    let same_instant = |value: &Option<String>, expected: DateTime<Utc>| match value.as_deref() {
        Some(value) => match parse_google_datetime(value) {
            Ok(time) => time == expected,
            Err(e) => {
                debug!("Ignoring candidate {}: {}", candidate.id, e);
                false
            }
        },
        // All-day events never match a timed event
        None => false,
    };

    same_instant(&candidate.start_date_time, event.start)
        && same_instant(&candidate.end_date_time, event.end)
}
