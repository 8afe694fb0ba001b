//! The calendar operations the dispatcher needs.

use crate::error::CalendarError;
use crate::types::{ApiEvent, Calendar, EventBody};

/// Remote calendar operations.
///
/// [`crate::CalendarClient`] implements this against the Google Calendar API;
/// tests substitute in-memory implementations.
#[allow(async_fn_in_trait)]
pub trait CalendarService {
    /// Every calendar in the user's calendar list, all pages.
    async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError>;

    /// Every event in one calendar, all pages.
    async fn list_events(&self, calendar_id: &str) -> Result<Vec<ApiEvent>, CalendarError>;

    /// Full event resource.
    async fn get_event(&self, calendar_id: &str, event_id: &str)
        -> Result<EventBody, CalendarError>;

    /// Create an event from a raw resource body.
    async fn insert_event(
        &self,
        calendar_id: &str,
        body: &EventBody,
    ) -> Result<ApiEvent, CalendarError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError>;
}
