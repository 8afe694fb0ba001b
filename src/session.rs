//! Per-run context: the calendar service plus the calendar list fetched once.

use calbatch_calendar::{Calendar, CalendarError, CalendarService, NamedPair, Selector};

pub struct Session<S> {
    service: S,
    calendars: Option<Vec<Calendar>>,
}

impl<S: CalendarService> Session<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            calendars: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// The user's calendars, fetched on first use.
    pub async fn calendars(&mut self) -> Result<&[Calendar], CalendarError> {
        if self.calendars.is_none() {
            let calendars = self.service.list_calendars().await?;
            tracing::debug!("Fetched {} calendars", calendars.len());
            self.calendars = Some(calendars);
        }

        Ok(self.calendars.as_deref().unwrap_or_default())
    }

    /// Calendars the selector matches, in calendar list order.
    pub async fn matched_calendars(
        &mut self,
        selector: &Selector,
    ) -> Result<Vec<Calendar>, CalendarError> {
        let calendars = self.calendars().await?;

        Ok(calendars
            .iter()
            .filter(|c| selector.matches(&NamedPair::from(*c)))
            .cloned()
            .collect())
    }

    /// Drop the cached calendar list so the next call refetches it.
    pub fn invalidate(&mut self) {
        self.calendars = None;
    }
}
