//! Runs one [`Invocation`] against a calendar service.
//!
//! Calendars are narrowed first, then the events of each matched calendar.
//! Remote calls are issued one at a time: calendars in list order, events in
//! list order, copy prefixes in the order given.

use std::io::Write;

use calbatch_calendar::{
    filter, select_one, Calendar, CalendarService, EventBody, NamedPair,
};
use calbatch_core::{AppError, Config, CopyConfig, ErrorPolicy};
use serde_json::Value;

use crate::command::{usage, Command, Invocation};
use crate::session::Session;

/// The parts of [`Config`] the dispatcher reads.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub copy: CopyConfig,
    pub on_error: ErrorPolicy,
}

impl From<&Config> for DispatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            copy: config.copy.clone(),
            on_error: config.batch.on_error,
        }
    }
}

/// Summary of a copy: `"01 Prefix: Original summary"`.
pub fn copy_summary(index: usize, prefix: &str, summary: &str) -> String {
    format!("{:02} {}: {}", index + 1, prefix, summary)
}

/// Round-robin event color, 1-based.
pub fn copy_color_id(index: usize, color_cycle: u32) -> u32 {
    (index as u32 % color_cycle.max(1)) + 1
}

/// Counts batch operations and applies the failure policy.
struct BatchTally {
    policy: ErrorPolicy,
    total: usize,
    failed: usize,
}

impl BatchTally {
    fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            total: 0,
            failed: 0,
        }
    }

    fn record(&mut self, result: Result<(), AppError>) -> Result<(), AppError> {
        self.total += 1;

        match (result, self.policy) {
            (Ok(()), _) => Ok(()),
            (Err(e), ErrorPolicy::Abort) => Err(e),
            // Output errors are never per-item failures.
            (Err(e @ AppError::Io(_)), ErrorPolicy::Continue) => Err(e),
            (Err(e), ErrorPolicy::Continue) => {
                self.failed += 1;
                tracing::error!("{}", e);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<(), AppError> {
        if self.failed > 0 {
            return Err(AppError::Batch {
                failed: self.failed,
                total: self.total,
            });
        }

        tracing::info!("{} operations completed", self.total);
        Ok(())
    }
}

/// Execute the invocation, writing user-facing lines to `out`.
pub async fn run<S, W>(
    invocation: &Invocation,
    session: &mut Session<S>,
    settings: &DispatchSettings,
    out: &mut W,
) -> Result<(), AppError>
where
    S: CalendarService,
    W: Write,
{
    match &invocation.command {
        Command::Usage => {
            write!(out, "{}", usage())?;
            Ok(())
        }
        Command::ListCalendars => {
            for calendar in session.calendars().await? {
                writeln!(out, "Calendar: {}", NamedPair::from(calendar))?;
            }
            Ok(())
        }
        Command::Show => show(invocation, session, out).await,
        Command::List | Command::Delete | Command::Copy { .. } => {
            batch(invocation, session, settings, out).await
        }
    }
}

async fn batch<S, W>(
    invocation: &Invocation,
    session: &mut Session<S>,
    settings: &DispatchSettings,
    out: &mut W,
) -> Result<(), AppError>
where
    S: CalendarService,
    W: Write,
{
    let calendars = session.matched_calendars(&invocation.calendar).await?;
    tracing::info!(
        "{} calendar(s) match {}",
        calendars.len(),
        invocation.calendar
    );

    let mut tally = BatchTally::new(settings.on_error);
    let service = session.service();

    for calendar in &calendars {
        let calendar_pair = NamedPair::from(calendar);
        writeln!(out, "Calendar: {}", calendar_pair)?;

        if !matches!(invocation.command, Command::List) && !calendar.is_writable() {
            tracing::warn!(
                "Calendar \"{}\" is read-only; changes will be rejected",
                calendar.summary
            );
        }

        let events: Vec<NamedPair> = service
            .list_events(&calendar.id)
            .await?
            .iter()
            .map(NamedPair::from)
            .collect();

        for event in filter(&events, &invocation.event) {
            match &invocation.command {
                Command::List => writeln!(out, "Event: {}", event)?,
                Command::Delete => {
                    writeln!(
                        out,
                        "deleting event \"{}\" from \"{}\"",
                        event.name, calendar_pair.name
                    )?;
                    let result = service
                        .delete_event(&calendar.id, &event.id)
                        .await
                        .map_err(AppError::from);
                    tally.record(result)?;
                }
                Command::Copy { prefixes } => {
                    writeln!(
                        out,
                        "copying event \"{}\" to {}",
                        event.name,
                        prefixes.join(", ")
                    )?;
                    let result =
                        copy_event(service, calendar, &event, prefixes, &settings.copy, out).await;
                    tally.record(result)?;
                }
                Command::Usage | Command::ListCalendars | Command::Show => {}
            }
        }
    }

    tally.finish()
}

async fn copy_event<S, W>(
    service: &S,
    calendar: &Calendar,
    event: &NamedPair,
    prefixes: &[String],
    copy: &CopyConfig,
    out: &mut W,
) -> Result<(), AppError>
where
    S: CalendarService,
    W: Write,
{
    let mut body: EventBody = service.get_event(&calendar.id, &event.id).await?;

    let summary = body
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    for field in &copy.stripped_fields {
        body.remove(field);
    }

    for (i, prefix) in prefixes.iter().enumerate() {
        body.insert(
            "summary".to_string(),
            Value::String(copy_summary(i, prefix, &summary)),
        );
        body.insert(
            "colorId".to_string(),
            Value::String(copy_color_id(i, copy.color_cycle).to_string()),
        );

        let created = service.insert_event(&calendar.id, &body).await?;
        writeln!(out, "New Event: {}", NamedPair::from(&created))?;
    }

    Ok(())
}

/// Print every field of the single event the selectors resolve to.
///
/// Zero or several matches print the candidates and fail instead of guessing.
async fn show<S, W>(
    invocation: &Invocation,
    session: &mut Session<S>,
    out: &mut W,
) -> Result<(), AppError>
where
    S: CalendarService,
    W: Write,
{
    let calendars: Vec<NamedPair> = session
        .calendars()
        .await?
        .iter()
        .map(NamedPair::from)
        .collect();

    let calendar = match select_one(&calendars, &invocation.calendar, "calendar") {
        Ok(calendar) => calendar,
        Err(e) => {
            writeln!(out, "{}", e.candidate_listing())?;
            return Err(e.into());
        }
    };
    writeln!(out, "Calendar: {}", calendar)?;

    let service = session.service();
    let events: Vec<NamedPair> = service
        .list_events(&calendar.id)
        .await?
        .iter()
        .map(NamedPair::from)
        .collect();

    let event = match select_one(&events, &invocation.event, "event") {
        Ok(event) => event,
        Err(e) => {
            writeln!(out, "{}", e.candidate_listing())?;
            return Err(e.into());
        }
    };

    let body = service.get_event(&calendar.id, &event.id).await?;
    for (key, value) in &body {
        match value {
            Value::String(s) => writeln!(out, "{}: {}", key, s)?,
            other => writeln!(out, "{}: {}", key, other)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use calbatch_calendar::{AccessRole, ApiEvent, CalendarError, Selector};
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};

    /// In-memory calendar service recording every mutation.
    #[derive(Default)]
    struct FakeCalendar {
        calendars: Vec<Calendar>,
        events: HashMap<String, Vec<EventBody>>,
        fail_ids: HashSet<String>,
        calendar_list_calls: Cell<usize>,
        event_list_calls: RefCell<Vec<String>>,
        deleted: RefCell<Vec<(String, String)>>,
        inserted: RefCell<Vec<(String, EventBody)>>,
    }

    impl FakeCalendar {
        fn with_calendar(mut self, id: &str, summary: &str, events: &[(&str, &str)]) -> Self {
            self.calendars.push(Calendar {
                id: id.to_string(),
                summary: summary.to_string(),
                description: None,
                time_zone: None,
                is_primary: false,
                access_role: AccessRole::Owner,
            });
            let bodies = events
                .iter()
                .map(|(event_id, event_summary)| {
                    serde_json::json!({
                        "id": event_id,
                        "summary": event_summary,
                        "etag": "\"3181161784712000\"",
                        "created": "2024-01-01T00:00:00.000Z",
                        "updated": "2024-01-02T00:00:00.000Z",
                        "creator": {"email": "me@example.com"},
                        "htmlLink": "https://www.google.com/calendar/event?eid=x",
                        "iCalUID": format!("{}@google.com", event_id),
                        "sequence": 0,
                        "start": {"dateTime": "2024-02-01T10:00:00Z"},
                        "end": {"dateTime": "2024-02-01T11:00:00Z"}
                    })
                    .as_object()
                    .unwrap()
                    .clone()
                })
                .collect();
            self.events.insert(id.to_string(), bodies);
            self
        }

        fn failing(mut self, event_id: &str) -> Self {
            self.fail_ids.insert(event_id.to_string());
            self
        }
    }

    impl CalendarService for FakeCalendar {
        async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
            self.calendar_list_calls.set(self.calendar_list_calls.get() + 1);
            Ok(self.calendars.clone())
        }

        async fn list_events(&self, calendar_id: &str) -> Result<Vec<ApiEvent>, CalendarError> {
            self.event_list_calls.borrow_mut().push(calendar_id.to_string());
            Ok(self
                .events
                .get(calendar_id)
                .map(|bodies| {
                    bodies
                        .iter()
                        .map(|b| ApiEvent {
                            id: b["id"].as_str().unwrap().to_string(),
                            summary: b["summary"].as_str().map(|s| s.to_string()),
                            status: None,
                            html_link: None,
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn get_event(
            &self,
            calendar_id: &str,
            event_id: &str,
        ) -> Result<EventBody, CalendarError> {
            self.events
                .get(calendar_id)
                .and_then(|bodies| bodies.iter().find(|b| b["id"] == event_id))
                .cloned()
                .ok_or_else(|| CalendarError::NotFound(event_id.to_string()))
        }

        async fn insert_event(
            &self,
            calendar_id: &str,
            body: &EventBody,
        ) -> Result<ApiEvent, CalendarError> {
            let mut inserted = self.inserted.borrow_mut();
            inserted.push((calendar_id.to_string(), body.clone()));
            Ok(ApiEvent {
                id: format!("new{}", inserted.len()),
                summary: body["summary"].as_str().map(|s| s.to_string()),
                status: None,
                html_link: None,
            })
        }

        async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
            if self.fail_ids.contains(event_id) {
                return Err(CalendarError::ApiError(format!("500: cannot delete {}", event_id)));
            }
            self.deleted
                .borrow_mut()
                .push((calendar_id.to_string(), event_id.to_string()));
            Ok(())
        }
    }

    fn fake() -> FakeCalendar {
        FakeCalendar::default()
            .with_calendar(
                "work@group.calendar.google.com",
                "Work",
                &[("e1", "Standup"), ("e2", "Meeting"), ("e3", "Standup notes")],
            )
            .with_calendar("me@gmail.com", "Personal", &[("p1", "Dentist")])
            .with_calendar(
                "travel@group.calendar.google.com",
                "Work Travel",
                &[("t1", "Flight"), ("t2", "Standup")],
            )
    }

    fn invocation(args: &[&str]) -> Invocation {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Invocation::from_args(&args, true)
    }

    fn settings() -> DispatchSettings {
        DispatchSettings::from(&Config::default())
    }

    async fn run_with(
        session: &mut Session<FakeCalendar>,
        args: &[&str],
        settings: &DispatchSettings,
    ) -> (Result<(), AppError>, String) {
        let mut out = Vec::new();
        let result = run(&invocation(args), session, settings, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_copy_summary_and_color() {
        assert_eq!(copy_summary(0, "A", "Meeting"), "01 A: Meeting");
        assert_eq!(copy_summary(1, "B", "Meeting"), "02 B: Meeting");
        assert_eq!(copy_summary(11, "L", ""), "12 L: ");
        assert_eq!(copy_color_id(0, 10), 1);
        assert_eq!(copy_color_id(9, 10), 10);
        assert_eq!(copy_color_id(10, 10), 1);
        assert_eq!(copy_color_id(3, 0), 1);
    }

    #[tokio::test]
    async fn test_usage_does_not_touch_service() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &[], &settings()).await;

        result.unwrap();
        assert!(out.starts_with("Usage:"));
        assert_eq!(session.service().calendar_list_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_list_calendars() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["list"], &settings()).await;

        result.unwrap();
        assert_eq!(
            out,
            "Calendar: \"Work\" id: work@group.calendar.google.com\n\
             Calendar: \"Personal\" id: me@gmail.com\n\
             Calendar: \"Work Travel\" id: travel@group.calendar.google.com\n"
        );
        assert!(session.service().event_list_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_calendars_then_events() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["Work", "Standup"], &settings()).await;

        result.unwrap();
        assert_eq!(
            out,
            "Calendar: \"Work\" id: work@group.calendar.google.com\n\
             Event: \"Standup\" id: e1\n\
             Event: \"Standup notes\" id: e3\n\
             Calendar: \"Work Travel\" id: travel@group.calendar.google.com\n\
             Event: \"Standup\" id: t2\n"
        );
        assert!(session.service().deleted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_nonexistent_calendar_lists_nothing() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["Nonexistent"], &settings()).await;

        result.unwrap();
        assert!(out.is_empty());
        assert!(session.service().event_list_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_calendar_selected_by_exact_id() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["me@gmail.com"], &settings()).await;

        result.unwrap();
        assert_eq!(
            out,
            "Calendar: \"Personal\" id: me@gmail.com\nEvent: \"Dentist\" id: p1\n"
        );
    }

    #[tokio::test]
    async fn test_delete_matching_events() {
        let mut session = Session::new(fake());
        let (result, out) =
            run_with(&mut session, &["Work Travel", "Standup", "delete"], &settings()).await;

        result.unwrap();
        assert!(out.contains("deleting event \"Standup\" from \"Work Travel\""));
        assert_eq!(
            *session.service().deleted.borrow(),
            vec![(
                "travel@group.calendar.google.com".to_string(),
                "t2".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_delete_aborts_on_first_failure() {
        let mut session = Session::new(fake().failing("e1"));
        let (result, out) = run_with(&mut session, &["Work", "Standup", "delete"], &settings()).await;

        assert!(matches!(result, Err(AppError::Remote(_))));
        assert!(out.contains("deleting event \"Standup\" from \"Work\""));
        assert!(!out.contains("Standup notes"));
        assert!(session.service().deleted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_delete_continue_policy_collects_failures() {
        let mut session = Session::new(fake().failing("e1"));
        let settings = DispatchSettings {
            on_error: ErrorPolicy::Continue,
            ..settings()
        };
        let (result, _) = run_with(&mut session, &["Work", "Standup", "delete"], &settings).await;

        assert!(matches!(
            result,
            Err(AppError::Batch {
                failed: 1,
                total: 3
            })
        ));
        let deleted: Vec<String> = session
            .service()
            .deleted
            .borrow()
            .iter()
            .map(|(_, id)| id.clone())
            .collect();
        assert_eq!(deleted, vec!["e3", "t2"]);
    }

    #[tokio::test]
    async fn test_copy_prefixes_summaries_and_colors() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(
            &mut session,
            &["work@group.calendar.google.com", "Meeting", "copy", "A", "B"],
            &settings(),
        )
        .await;

        result.unwrap();
        assert_eq!(
            out,
            "Calendar: \"Work\" id: work@group.calendar.google.com\n\
             copying event \"Meeting\" to A, B\n\
             New Event: \"01 A: Meeting\" id: new1\n\
             New Event: \"02 B: Meeting\" id: new2\n"
        );

        let inserted = session.service().inserted.borrow();
        assert_eq!(inserted.len(), 2);
        assert_eq!(inserted[0].1["summary"], "01 A: Meeting");
        assert_eq!(inserted[0].1["colorId"], "1");
        assert_eq!(inserted[1].1["summary"], "02 B: Meeting");
        assert_eq!(inserted[1].1["colorId"], "2");
    }

    #[tokio::test]
    async fn test_copy_strips_provider_fields() {
        let mut session = Session::new(fake());
        let (result, _) =
            run_with(&mut session, &["Personal", "Dentist", "copy", "X"], &settings()).await;

        result.unwrap();
        let inserted = session.service().inserted.borrow();
        let body = &inserted[0].1;
        for field in ["created", "creator", "etag", "htmlLink", "iCalUID", "id", "sequence", "updated"] {
            assert!(!body.contains_key(field), "{} should be stripped", field);
        }
        assert!(body.contains_key("start"));
        assert!(body.contains_key("end"));
        assert_eq!(inserted[0].0, "me@gmail.com");
    }

    #[tokio::test]
    async fn test_copy_without_prefixes_prints_usage() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["Work", "Meeting", "copy"], &settings()).await;

        result.unwrap();
        assert!(out.starts_with("Usage:"));
        assert!(session.service().inserted.borrow().is_empty());
        assert_eq!(session.service().calendar_list_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_show_single_event() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["Personal", "Dentist", "show"], &settings()).await;

        result.unwrap();
        assert!(out.starts_with("Calendar: \"Personal\" id: me@gmail.com\n"));
        assert!(out.contains("summary: Dentist\n"));
        assert!(out.contains("id: p1\n"));
        assert!(out.contains("sequence: 0\n"));
    }

    #[tokio::test]
    async fn test_show_ambiguous_calendar_prints_candidates() {
        let mut session = Session::new(fake());
        let (result, out) = run_with(&mut session, &["Work", "Standup", "show"], &settings()).await;

        assert!(matches!(result, Err(AppError::Selection(_))));
        assert_eq!(
            out,
            "1. Work: work@group.calendar.google.com\n\
             2. Work Travel: travel@group.calendar.google.com\n"
        );
        assert!(session.service().event_list_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_calendar_list_is_fetched_once_per_session() {
        let mut session = Session::new(fake());
        run_with(&mut session, &["list"], &settings()).await.0.unwrap();
        run_with(&mut session, &["Work"], &settings()).await.0.unwrap();
        assert_eq!(session.service().calendar_list_calls.get(), 1);

        session.invalidate();
        let matched = session
            .matched_calendars(&Selector::new("Personal"))
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(session.service().calendar_list_calls.get(), 2);
    }
}
