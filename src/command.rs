//! Positional argument grammar.
//!
//! ```text
//! calbatch [CALENDAR_SELECTOR] [EVENT_SELECTOR] [list|delete|copy|show] [PREFIX...]
//! ```

use calbatch_calendar::Selector;

pub const PROGRAM: &str = "calbatch";

/// What one run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print help and exit without contacting the API
    Usage,
    /// Print every calendar
    ListCalendars,
    /// Print matching calendars and their matching events
    List,
    /// Delete every matching event
    Delete,
    /// Insert one copy of every matching event per prefix.
    /// Only constructed with at least one prefix.
    Copy { prefixes: Vec<String> },
    /// Print the full detail of exactly one event
    Show,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub calendar: Selector,
    pub event: Selector,
    pub command: Command,
}

impl Invocation {
    /// Interpret the positional arguments.
    ///
    /// No arguments, an unknown keyword, or `copy` without prefixes give
    /// [`Command::Usage`]. A missing calendar selector (the `list` word when
    /// `list_is_wildcard` is set) lists calendars.
    pub fn from_args(args: &[String], list_is_wildcard: bool) -> Self {
        let calendar = Selector::parse(args.first().map(String::as_str), list_is_wildcard);
        let event = Selector::parse(args.get(1).map(String::as_str), list_is_wildcard);

        if args.is_empty() {
            return Self {
                calendar,
                event,
                command: Command::Usage,
            };
        }

        let keyword = args
            .get(2)
            .map(|k| k.to_lowercase())
            .unwrap_or_else(|| "list".to_string());
        let rest = args.get(3..).unwrap_or_default();

        let command = match keyword.as_str() {
            "list" => Command::List,
            "delete" => Command::Delete,
            "show" => Command::Show,
            "copy" if rest.is_empty() => Command::Usage,
            "copy" => Command::Copy {
                prefixes: rest.to_vec(),
            },
            other => {
                tracing::warn!("Unknown command {:?}", other);
                Command::Usage
            }
        };

        if !rest.is_empty() && !matches!(command, Command::Copy { .. } | Command::Usage) {
            tracing::warn!("Ignoring {} extra argument(s) after {:?}", rest.len(), keyword);
        }

        let command = match command {
            Command::Usage => Command::Usage,
            _ if calendar.is_any() => Command::ListCalendars,
            command => command,
        };

        Self {
            calendar,
            event,
            command,
        }
    }
}

pub fn usage() -> String {
    format!(
        "\
Usage:
    {0} [Calendar Selector] [Event Selector] [list|delete|copy|show] [copy ARGS]
    {0}                                               : print usage
    {0} list                                          : print list of calendars
    {0} CalendarSelector [list]                       : print all events in calendar matching CalendarSelector
    {0} CalendarSelector EventSelector [list]         : print matching events
    {0} CalendarSelector EventSelector delete         : delete matching events
    {0} CalendarSelector EventSelector copy PREFIX(s) : create new event with each PREFIX added to the subject
    {0} CalendarSelector EventSelector show           : print every field of exactly one matching event

A selector matches when it is part of the name or equal to the id.

note: provide oauth credentials in file credentials.json (see --credentials)
",
        PROGRAM
    )
}
