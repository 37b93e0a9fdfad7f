use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;

/// Half-open range of hours of the day, `start` inclusive and `end` exclusive.
///
/// A window with `start >= end` is valid and simply never contains an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHourWindow")]
pub struct HourWindow {
    start: u32,
    end: u32,
}

#[derive(Deserialize)]
struct RawHourWindow {
    start: u32,
    end: u32,
}

impl TryFrom<RawHourWindow> for HourWindow {
    type Error = ConfigError;

    fn try_from(raw: RawHourWindow) -> Result<Self, Self::Error> {
        HourWindow::new(raw.start, raw.end)
    }
}

impl HourWindow {
    pub const DEFAULT_WEEKDAY: HourWindow = HourWindow { start: 16, end: 22 };
    pub const DEFAULT_SATURDAY: HourWindow = HourWindow { start: 10, end: 16 };

    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        if start > 23 {
            return Err(ConfigError::WindowStartOutOfRange(start));
        }
        if end > 24 {
            return Err(ConfigError::WindowEndOutOfRange(end));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

impl std::str::FromStr for HourWindow {
    type Err = ConfigError;

    /// Parses `START-END`, e.g. `16-22`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| ConfigError::InvalidWindowSyntax(value.to_string()))?;
        let start = start
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidWindowSyntax(value.to_string()))?;
        let end = end
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidWindowSyntax(value.to_string()))?;
        HourWindow::new(start, end)
    }
}

/// How a calendar day is treated by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Weekday,
    Saturday,
    Sunday,
}

impl DayKind {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => DayKind::Saturday,
            Weekday::Sun => DayKind::Sunday,
            _ => DayKind::Weekday,
        }
    }
}

/// Weekly availability: one window for Monday-Friday, one for Saturday,
/// Sunday never available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyAvailability {
    weekday: HourWindow,
    saturday: HourWindow,
}

impl WeeklyAvailability {
    pub fn new(weekday: HourWindow, saturday: HourWindow) -> Self {
        Self { weekday, saturday }
    }

    pub fn weekday_window(&self) -> HourWindow {
        self.weekday
    }

    pub fn saturday_window(&self) -> HourWindow {
        self.saturday
    }

    pub fn window_for(&self, date: NaiveDate) -> Option<HourWindow> {
        match DayKind::of(date) {
            DayKind::Weekday => Some(self.weekday),
            DayKind::Saturday => Some(self.saturday),
            DayKind::Sunday => None,
        }
    }

    pub fn is_available(&self, date: NaiveDate, hour: u32) -> bool {
        self.window_for(date)
            .map(|window| window.contains(hour))
            .unwrap_or(false)
    }

    /// Hour at which the day after `left` is entered when rolling over midnight.
    ///
    /// Chosen from the day being left: Monday-Friday hand over the weekday
    /// start, Saturday and Sunday hand over the Saturday start.
    pub fn rollover_hour(&self, left: NaiveDate) -> u32 {
        match DayKind::of(left) {
            DayKind::Weekday => self.weekday.start,
            DayKind::Saturday | DayKind::Sunday => self.saturday.start,
        }
    }

    /// Hour at which `date` is first visited, given the walk started on `start_day`.
    pub fn entry_hour(&self, start_day: NaiveDate, date: NaiveDate) -> u32 {
        match date.pred_opt() {
            Some(previous) if date != start_day => self.rollover_hour(previous),
            _ => self.weekday.start,
        }
    }

    /// Count the hours of `date` that are available at or after `from_hour`.
    pub fn available_hours_from(&self, date: NaiveDate, from_hour: u32) -> u32 {
        match self.window_for(date) {
            Some(window) if !window.is_empty() => {
                let first = window.start.max(from_hour);
                window.end.min(24).saturating_sub(first)
            }
            _ => 0,
        }
    }
}

/// First Monday strictly after `date`, `None` past the end of the calendar.
pub fn next_monday(date: NaiveDate) -> Option<NaiveDate> {
    let days_ahead = 7 - u64::from(date.weekday().num_days_from_monday());
    date.checked_add_days(Days::new(days_ahead))
}
