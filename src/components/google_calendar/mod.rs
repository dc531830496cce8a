mod client;
pub mod models;
pub mod token;

pub use client::{CalendarService, GoogleCalendarClient, GOOGLE_CALENDAR_API_BASE};
pub use models::{CalendarEvent, EventDateTime, NewCalendarEvent};
pub use token::{ServiceAccountKey, TokenManager, TokenSource};
