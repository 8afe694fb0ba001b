//! Name/id selectors.
//!
//! A selector narrows a list of calendars or events. It matches an item when
//! the item's display name contains it, or the item's id equals it exactly.
//! An absent selector matches everything.

use std::fmt;

use calbatch_core::SelectionError;

/// Display name and identifier of a calendar or event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPair {
    pub name: String,
    pub id: String,
}

impl NamedPair {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// `"<name>: <id>"`, used in candidate listings.
    pub fn short(&self) -> String {
        format!("{}: {}", self.name, self.id)
    }
}

impl fmt::Display for NamedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" id: {}", self.name, self.id)
    }
}

/// Optional selector text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector(Option<String>);

impl Selector {
    /// Matches everything.
    pub fn any() -> Self {
        Self(None)
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }

    /// Build from a command line argument.
    ///
    /// With `list_is_wildcard`, the word `list` in any case means "no selector".
    pub fn parse(arg: Option<&str>, list_is_wildcard: bool) -> Self {
        match arg {
            None => Self::any(),
            Some(text) if list_is_wildcard && text.eq_ignore_ascii_case("list") => Self::any(),
            Some(text) => Self::new(text),
        }
    }

    pub fn is_any(&self) -> bool {
        self.0.is_none()
    }

    pub fn matches(&self, pair: &NamedPair) -> bool {
        match &self.0 {
            None => true,
            Some(text) => pair.id == *text || pair.name.contains(text.as_str()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("*"))
    }
}

/// Keep the items the selector matches, in their original order.
pub fn filter(collection: &[NamedPair], selector: &Selector) -> Vec<NamedPair> {
    if selector.is_any() {
        return collection.to_vec();
    }

    collection
        .iter()
        .filter(|pair| selector.matches(pair))
        .cloned()
        .collect()
}

/// Resolve a selector to exactly one item.
///
/// No match carries the whole collection as candidates; several matches
/// carry just the matches.
pub fn select_one(
    collection: &[NamedPair],
    selector: &Selector,
    kind: &'static str,
) -> Result<NamedPair, SelectionError> {
    let mut matches = filter(collection, selector);

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(SelectionError::NotFound {
            kind,
            selector: selector.to_string(),
            candidates: collection.iter().map(NamedPair::short).collect(),
        }),
        _ => Err(SelectionError::Ambiguous {
            kind,
            selector: selector.to_string(),
            candidates: matches.iter().map(NamedPair::short).collect(),
        }),
    }
}
