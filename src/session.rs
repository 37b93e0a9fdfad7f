use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::fmt;

use crate::calendar::{Calendar, CalendarCollection, CalendarError};
use crate::entry::Entry;
use crate::goal_validation::validate_hours_per_week;
use crate::persistence::{CalendarStore, StoreError};

#[derive(Debug)]
pub enum SessionError {
    EmptyCalendarName,
    CalendarExists(String),
    UnknownCalendar(String),
    NoCalendarSelected,
    EmptyDescription,
    InvalidHoursPerWeek(i64),
    EntryOutOfRange { position: usize, len: usize },
    Store(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyCalendarName => write!(f, "Please enter a valid name."),
            SessionError::CalendarExists(name) => write!(f, "Calendar '{name}' already exists."),
            SessionError::UnknownCalendar(name) => write!(f, "Calendar '{name}' does not exist."),
            SessionError::NoCalendarSelected => write!(f, "Please add or select a calendar."),
            SessionError::EmptyDescription => write!(f, "Please enter a description."),
            SessionError::InvalidHoursPerWeek(value) => {
                write!(f, "Hours per week must be at least 1 (got {value}).")
            }
            SessionError::EntryOutOfRange { position, len } => {
                write!(f, "No entry at position {position} ({len} entries).")
            }
            SessionError::Store(err) => write!(f, "Could not save calendars: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<CalendarError> for SessionError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::EmptyName => SessionError::EmptyCalendarName,
            CalendarError::AlreadyExists(name) => SessionError::CalendarExists(name),
            CalendarError::NotFound(name) => SessionError::UnknownCalendar(name),
            CalendarError::EntryOutOfRange { position, len } => {
                SessionError::EntryOutOfRange { position, len }
            }
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Interactive state: the collection being edited, which calendar is
/// selected and which month is displayed.
///
/// Every mutation is written through the store. When the write fails the
/// mutation stays in memory and the error is returned; [`Session::save`]
/// can be called again later.
pub struct Session {
    store: Box<dyn CalendarStore>,
    calendars: CalendarCollection,
    selected: Option<String>,
    reference_month: (i32, u32),
    month_offset: i32,
}

impl Session {
    /// Load the collection from `store` (empty on first run) and display
    /// the month containing `today`.
    pub fn open(store: Box<dyn CalendarStore>, today: NaiveDate) -> SessionResult<Self> {
        let calendars = store.load_calendars()?.unwrap_or_default();
        let selected = calendars.names().next().map(str::to_string);
        tracing::info!(calendars = calendars.len(), "session opened");
        Ok(Self {
            store,
            calendars,
            selected,
            reference_month: (today.year(), today.month()),
            month_offset: 0,
        })
    }

    pub fn calendars(&self) -> &CalendarCollection {
        &self.calendars
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_calendar(&self) -> SessionResult<&Calendar> {
        let name = self.selected.as_deref().ok_or(SessionError::NoCalendarSelected)?;
        self.calendars
            .calendar(name)
            .ok_or_else(|| SessionError::UnknownCalendar(name.to_string()))
    }

    fn selected_calendar_mut(&mut self) -> SessionResult<&mut Calendar> {
        let name = self.selected.as_deref().ok_or(SessionError::NoCalendarSelected)?;
        self.calendars
            .calendar_mut(name)
            .ok_or_else(|| SessionError::UnknownCalendar(name.to_string()))
    }

    pub fn save(&self) -> SessionResult<()> {
        self.store.save_calendars(&self.calendars)?;
        Ok(())
    }

    pub fn create_calendar(&mut self, name: &str) -> SessionResult<()> {
        self.calendars.add_calendar(name)?;
        let name = name.trim().to_string();
        tracing::info!(calendar = %name, "calendar added");
        self.selected = Some(name);
        self.save()
    }

    pub fn select_calendar(&mut self, name: &str) -> SessionResult<()> {
        let name = name.trim();
        if !self.calendars.contains(name) {
            return Err(SessionError::UnknownCalendar(name.to_string()));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    /// Delete the selected calendar. Returns its name.
    pub fn delete_calendar(&mut self) -> SessionResult<String> {
        let name = self.selected.take().ok_or(SessionError::NoCalendarSelected)?;
        if let Err(err) = self.calendars.remove_calendar(&name) {
            self.selected = Some(name);
            return Err(err.into());
        }
        tracing::info!(calendar = %name, "calendar deleted");
        self.selected = self.calendars.names().next().map(str::to_string);
        self.save()?;
        Ok(name)
    }

    pub fn add_event(&mut self, date: NaiveDateTime, description: &str) -> SessionResult<()> {
        let description = non_empty_description(description)?;
        self.selected_calendar_mut()?
            .push(Entry::event(date, description));
        self.save()
    }

    pub fn add_goal(
        &mut self,
        deadline: NaiveDateTime,
        description: &str,
        hours_per_week: i64,
    ) -> SessionResult<()> {
        let description = non_empty_description(description)?;
        validate_hours_per_week(hours_per_week)
            .map_err(|_| SessionError::InvalidHoursPerWeek(hours_per_week))?;
        self.selected_calendar_mut()?
            .push(Entry::goal(deadline, description, hours_per_week));
        self.save()
    }

    /// Append `entries` to the selected calendar. Returns how many were added.
    pub fn import_entries(&mut self, entries: Vec<Entry>) -> SessionResult<usize> {
        let count = entries.len();
        self.selected_calendar_mut()?.extend(entries);
        tracing::info!(entries = count, "entries imported");
        self.save()?;
        Ok(count)
    }

    /// Delete the entry at `position` in the selected calendar.
    pub fn delete_entry(&mut self, position: usize) -> SessionResult<Entry> {
        let removed = self.selected_calendar_mut()?.remove(position)?;
        self.save()?;
        Ok(removed)
    }

    /// Jump to a given month. Returns false for an invalid month.
    pub fn set_displayed_month(&mut self, year: i32, month: u32) -> bool {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return false;
        }
        self.reference_month = (year, month);
        self.month_offset = 0;
        true
    }

    pub fn next_month(&mut self) {
        self.month_offset += 1;
    }

    pub fn previous_month(&mut self) {
        self.month_offset -= 1;
    }

    /// `(year, month)` currently displayed.
    pub fn displayed_month(&self) -> (i32, u32) {
        let (year, month) = self.reference_month;
        let zero_based = month as i32 - 1 + self.month_offset;
        (
            year + zero_based.div_euclid(12),
            zero_based.rem_euclid(12) as u32 + 1,
        )
    }

    pub fn entries_for_displayed_month(&self) -> SessionResult<Vec<(usize, &Entry)>> {
        let (year, month) = self.displayed_month();
        Ok(self.selected_calendar()?.entries_in_month(year, month))
    }
}

fn non_empty_description(description: &str) -> SessionResult<&str> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(SessionError::EmptyDescription);
    }
    Ok(trimmed)
}
