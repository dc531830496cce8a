pub mod event_sync;
pub mod google_calendar;

pub use event_sync::EventSyncHandle;
pub use google_calendar::GoogleCalendarClient;
