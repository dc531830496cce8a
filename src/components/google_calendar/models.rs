use serde::{Deserialize, Serialize};

/// Simplified calendar event representation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start_date_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date_time: Option<String>,
    pub end_date: Option<String>,
}

/// Body of an event insertion request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

/// Start or end of an event as the Google Calendar API encodes it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Event resource as returned by `events.list` and `events.insert`
#[derive(Debug, Deserialize)]
pub struct ApiEvent {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
}

/// Response of `events.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventList {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

impl From<ApiEvent> for CalendarEvent {
    fn from(event: ApiEvent) -> Self {
        CalendarEvent {
            id: event.id,
            summary: event.summary,
            start_date_time: event.start.date_time,
            start_date: event.start.date,
            end_date_time: event.end.date_time,
            end_date: event.end.date,
        }
    }
}
