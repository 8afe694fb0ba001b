//! Google Calendar access for calbatch.
//!
//! Provides the Calendar API client, page accumulation and the
//! name/id selector filter.

pub mod client;
pub mod error;
pub mod pagination;
pub mod selector;
pub mod service;
pub mod types;

pub use client::CalendarClient;
pub use error::CalendarError;
pub use pagination::{collect_pages, Page};
pub use selector::{filter, select_one, NamedPair, Selector};
pub use service::CalendarService;
pub use types::{AccessRole, ApiEvent, Calendar, EventBody};
