use super::models::{ApiEvent, ApiEventList, CalendarEvent, NewCalendarEvent};
use super::token::TokenSource;
use crate::error::{calendar_insert_error, calendar_query_error, config_error, BotResult};
use crate::utils::time::to_google_datetime;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Google Calendar v3 REST endpoint
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Operations the event synchronizer needs from a calendar
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// List single-occurrence events overlapping `[time_min, time_max]`, ordered by start
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BotResult<Vec<CalendarEvent>>;

    /// Insert a new event and return it as stored
    async fn insert_event(&self, event: &NewCalendarEvent) -> BotResult<CalendarEvent>;
}

/// Google Calendar REST client for a single calendar
#[derive(Clone)]
pub struct GoogleCalendarClient {
    calendar_id: String,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
    client: Client,
}

impl GoogleCalendarClient {
    /// Create a client for the public Google Calendar API
    pub fn new(calendar_id: impl Into<String>, tokens: Arc<dyn TokenSource>) -> BotResult<Self> {
        Self::with_base_url(calendar_id, tokens, GOOGLE_CALENDAR_API_BASE)
    }

    /// Create a client against a different API root
    pub fn with_base_url(
        calendar_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        base_url: &str,
    ) -> BotResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| config_error(&format!("Failed to parse URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("Not a base URL: {}", base_url)));
        }

        Ok(Self {
            calendar_id: calendar_id.into(),
            base_url,
            tokens,
            client: Client::new(),
        })
    }

    /// The calendar this client reads and writes
    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// `{base}/calendars/{calendar_id}/events`, with the id percent-encoded
    fn events_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["calendars", self.calendar_id.as_str(), "events"]);
        }
        url
    }

    /// Read the body of a failed response for the error message
    async fn error_body(response: Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string())
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BotResult<Vec<CalendarEvent>> {
        let access_token = self.tokens.access_token().await?;
        let time_min = to_google_datetime(&time_min);
        let time_max = to_google_datetime(&time_max);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.events_url();
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("timeMin", &time_min)
                    .append_pair("timeMax", &time_max)
                    .append_pair("singleEvents", "true")
                    .append_pair("orderBy", "startTime");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(&access_token)
                .send()
                .await
                .map_err(|e| calendar_query_error(&format!("Failed to fetch events: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_body = Self::error_body(response).await;
                return Err(calendar_query_error(&format!(
                    "Failed to fetch events: HTTP {} - {}",
                    status, error_body
                )));
            }

            let page: ApiEventList = response.json().await.map_err(|e| {
                calendar_query_error(&format!("Failed to parse events response: {}", e))
            })?;

            events.extend(page.items.into_iter().map(CalendarEvent::from));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Found {} events between {} and {}",
            events.len(),
            time_min,
            time_max
        );

        Ok(events)
    }

    async fn insert_event(&self, event: &NewCalendarEvent) -> BotResult<CalendarEvent> {
        let access_token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(&access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| calendar_insert_error(&format!("Failed to insert event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = Self::error_body(response).await;
            return Err(calendar_insert_error(&format!(
                "Failed to insert event: HTTP {} - {}",
                status, error_body
            )));
        }

        let created: ApiEvent = response.json().await.map_err(|e| {
            calendar_insert_error(&format!("Failed to parse insert response: {}", e))
        })?;

        Ok(created.into())
    }
}
