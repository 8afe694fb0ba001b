//! Calendar API types and data structures.

use serde::Deserialize;

use crate::pagination::Page;
use crate::selector::NamedPair;

/// Full event resource as returned by `events.get`.
///
/// Kept as a raw JSON object so copies carry every field the provider sends,
/// including ones this tool does not model.
pub type EventBody = serde_json::Map<String, serde_json::Value>;

/// Calendar metadata.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    pub is_primary: bool,
    pub access_role: AccessRole,
}

impl Calendar {
    /// Whether events in this calendar can be deleted or inserted.
    pub fn is_writable(&self) -> bool {
        matches!(self.access_role, AccessRole::Owner | AccessRole::Writer)
    }
}

/// Calendar access role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessRole {
    Owner,
    Writer,
    #[default]
    Reader,
    FreeBusyReader,
}

impl From<&Calendar> for NamedPair {
    fn from(calendar: &Calendar) -> Self {
        NamedPair::new(calendar.summary.clone(), calendar.id.clone())
    }
}

// API Response Types

/// Event as it appears in `events.list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub html_link: Option<String>,
}

impl From<&ApiEvent> for NamedPair {
    fn from(event: &ApiEvent) -> Self {
        NamedPair::new(event.summary.clone().unwrap_or_default(), event.id.clone())
    }
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

impl From<EventListResponse> for Page<ApiEvent> {
    fn from(resp: EventListResponse) -> Self {
        Page {
            items: resp.items,
            next_page_token: resp.next_page_token,
        }
    }
}

/// API response for calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<ApiCalendar>,
    pub next_page_token: Option<String>,
}

impl From<CalendarListResponse> for Page<Calendar> {
    fn from(resp: CalendarListResponse) -> Self {
        Page {
            items: resp.items.into_iter().map(Calendar::from).collect(),
            next_page_token: resp.next_page_token,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCalendar {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub access_role: Option<String>,
}

impl From<ApiCalendar> for Calendar {
    fn from(api: ApiCalendar) -> Self {
        let access_role = match api.access_role.as_deref() {
            Some("owner") => AccessRole::Owner,
            Some("writer") => AccessRole::Writer,
            Some("reader") => AccessRole::Reader,
            Some("freeBusyReader") => AccessRole::FreeBusyReader,
            _ => AccessRole::Reader,
        };

        Self {
            id: api.id,
            summary: api.summary.unwrap_or_default(),
            description: api.description,
            time_zone: api.time_zone,
            is_primary: api.primary,
            access_role,
        }
    }
}
