//! Google Calendar API client.

use tracing::instrument;

use crate::error::CalendarError;
use crate::pagination::{collect_pages, Page};
use crate::service::CalendarService;
use crate::types::*;

const DEFAULT_PAGE_SIZE: u32 = 2500;

pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    page_size: u32,
}

impl CalendarClient {
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// `maxResults` for event list pages.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// One page of the user's calendar list.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_calendars_page(
        &self,
        page_token: Option<&str>,
    ) -> Result<CalendarListResponse, CalendarError> {
        let mut url = format!("{}/users/me/calendarList", self.base_url);

        if let Some(pt) = page_token {
            url.push_str(&format!("?pageToken={}", urlencoding::encode(pt)));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// One page of events from a calendar.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_events_page(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> Result<EventListResponse, CalendarError> {
        let mut url = format!(
            "{}/calendars/{}/events?maxResults={}",
            self.base_url,
            urlencoding::encode(calendar_id),
            self.page_size,
        );

        if let Some(pt) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(pt)));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        self.handle_response(response).await
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/calendars/{}/events/{}",
            self.base_url,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        )
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CalendarError> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| CalendarError::ApiError(format!("JSON parse error: {}", e)))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CalendarError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            401 => Err(CalendarError::TokenExpired),
            403 => Err(CalendarError::AuthRequired(
                response.text().await.unwrap_or_default(),
            )),
            404 => Err(CalendarError::NotFound(
                response.text().await.unwrap_or_default(),
            )),
            409 => Err(CalendarError::Conflict(
                response.text().await.unwrap_or_default(),
            )),
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                Err(CalendarError::RateLimited(retry_after))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(CalendarError::ApiError(format!("{}: {}", status, text)))
            }
        }
    }
}

impl CalendarService for CalendarClient {
    #[instrument(skip(self), level = "info")]
    async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        collect_pages(|page_token| async move {
            self.list_calendars_page(page_token.as_deref())
                .await
                .map(Page::<Calendar>::from)
        })
        .await
    }

    #[instrument(skip(self), level = "info")]
    async fn list_events(&self, calendar_id: &str) -> Result<Vec<ApiEvent>, CalendarError> {
        collect_pages(|page_token| async move {
            self.list_events_page(calendar_id, page_token.as_deref())
                .await
                .map(Page::<ApiEvent>::from)
        })
        .await
    }

    #[instrument(skip(self), level = "info")]
    async fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<EventBody, CalendarError> {
        let response = self
            .client
            .get(self.event_url(calendar_id, event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        self.handle_response(response).await
    }

    #[instrument(skip(self, body), level = "info")]
    async fn insert_event(
        &self,
        calendar_id: &str,
        body: &EventBody,
    ) -> Result<ApiEvent, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id),
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    #[instrument(skip(self), level = "info")]
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(self.event_url(calendar_id, event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        // Delete returns 204 No Content on success
        Self::check_status(response).await?;
        Ok(())
    }
}
