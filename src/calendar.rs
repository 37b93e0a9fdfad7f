use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::entry::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    EmptyName,
    AlreadyExists(String),
    NotFound(String),
    EntryOutOfRange { position: usize, len: usize },
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::EmptyName => write!(f, "calendar name must not be empty"),
            CalendarError::AlreadyExists(name) => write!(f, "calendar '{name}' already exists"),
            CalendarError::NotFound(name) => write!(f, "calendar '{name}' not found"),
            CalendarError::EntryOutOfRange { position, len } => write!(
                f,
                "no entry at position {position} (calendar has {len} entries)"
            ),
        }
    }
}

impl std::error::Error for CalendarError {}

/// An ordered list of entries. Order is insertion order and defines the
/// positions used for deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    #[serde(default)]
    events: Vec<Entry>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { events: entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push(&mut self, entry: Entry) {
        self.events.push(entry);
    }

    pub fn extend<I: IntoIterator<Item = Entry>>(&mut self, entries: I) {
        self.events.extend(entries);
    }

    pub fn remove(&mut self, position: usize) -> Result<Entry, CalendarError> {
        if position >= self.events.len() {
            return Err(CalendarError::EntryOutOfRange {
                position,
                len: self.events.len(),
            });
        }
        Ok(self.events.remove(position))
    }

    pub fn goals(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_goal())
    }

    /// Entries dated in the given month, with their positions. Entries whose
    /// date cannot be parsed are left out.
    pub fn entries_in_month(&self, year: i32, month: u32) -> Vec<(usize, &Entry)> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry
                    .timestamp()
                    .map(|ts| ts.year() == year && ts.month() == month)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn days_with_entries(&self, year: i32, month: u32) -> BTreeSet<NaiveDate> {
        self.entries_in_month(year, month)
            .into_iter()
            .filter_map(|(_, entry)| entry.timestamp().ok().map(|ts| ts.date()))
            .collect()
    }
}

/// Calendar name to calendar; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarCollection {
    calendars: BTreeMap<String, Calendar>,
}

impl CalendarCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.calendars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Calendar)> {
        self.calendars.iter().map(|(name, cal)| (name.as_str(), cal))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.calendars.contains_key(name)
    }

    pub fn calendar(&self, name: &str) -> Option<&Calendar> {
        self.calendars.get(name)
    }

    pub fn calendar_mut(&mut self, name: &str) -> Option<&mut Calendar> {
        self.calendars.get_mut(name)
    }

    /// Create an empty calendar. The name is trimmed and must be new.
    pub fn add_calendar(&mut self, name: &str) -> Result<&mut Calendar, CalendarError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CalendarError::EmptyName);
        }
        if self.calendars.contains_key(name) {
            return Err(CalendarError::AlreadyExists(name.to_string()));
        }
        Ok(self.calendars.entry(name.to_string()).or_default())
    }

    pub fn insert(&mut self, name: impl Into<String>, calendar: Calendar) -> Option<Calendar> {
        self.calendars.insert(name.into(), calendar)
    }

    pub fn remove_calendar(&mut self, name: &str) -> Result<Calendar, CalendarError> {
        self.calendars
            .remove(name)
            .ok_or_else(|| CalendarError::NotFound(name.to_string()))
    }

    pub fn entry_count(&self) -> usize {
        self.calendars.values().map(Calendar::len).sum()
    }

    pub fn into_inner(self) -> BTreeMap<String, Calendar> {
        self.calendars
    }
}

impl FromIterator<(String, Calendar)> for CalendarCollection {
    fn from_iter<I: IntoIterator<Item = (String, Calendar)>>(iter: I) -> Self {
        Self {
            calendars: iter.into_iter().collect(),
        }
    }
}
