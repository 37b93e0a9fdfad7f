use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of calendar item. Serialized with the literals used in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Event,
    Goal,
    #[serde(rename = "Sub-Goal")]
    SubGoal,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Event => "Event",
            EntryType::Goal => "Goal",
            EntryType::SubGoal => "Sub-Goal",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "Event" => Some(EntryType::Event),
            "Goal" => Some(EntryType::Goal),
            "Sub-Goal" => Some(EntryType::SubGoal),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekly hours of a goal as found in the data file.
///
/// Values that are not integers are kept verbatim, so they are written back
/// unchanged and only the goal carrying them is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoursPerWeek {
    Count(i64),
    Malformed(Value),
}

impl HoursPerWeek {
    pub fn count(&self) -> Option<i64> {
        match self {
            HoursPerWeek::Count(hours) => Some(*hours),
            HoursPerWeek::Malformed(_) => None,
        }
    }
}

/// A single calendar item.
///
/// `date` is kept as the text found in the data file so that one malformed
/// entry never prevents the rest of a calendar from loading. A missing or
/// `null` date or description reads as an empty string, any other non-string
/// value as its JSON text. Use [`Entry::timestamp`] to read the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<HoursPerWeek>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl Entry {
    pub fn event(date: NaiveDateTime, description: impl Into<String>) -> Self {
        Self {
            date: format_timestamp(date),
            description: description.into(),
            entry_type: EntryType::Event,
            hours_per_week: None,
        }
    }

    pub fn goal(deadline: NaiveDateTime, description: impl Into<String>, hours_per_week: i64) -> Self {
        Self {
            date: format_timestamp(deadline),
            description: description.into(),
            entry_type: EntryType::Goal,
            hours_per_week: Some(HoursPerWeek::Count(hours_per_week)),
        }
    }

    pub fn sub_goal(slot: NaiveDateTime, description: impl Into<String>) -> Self {
        Self {
            date: format_timestamp(slot),
            description: description.into(),
            entry_type: EntryType::SubGoal,
            hours_per_week: None,
        }
    }

    /// Weekly hours when they are a well-formed integer.
    pub fn weekly_hours(&self) -> Option<i64> {
        self.hours_per_week.as_ref().and_then(HoursPerWeek::count)
    }

    pub fn is_goal(&self) -> bool {
        self.entry_type == EntryType::Goal
    }

    pub fn timestamp(&self) -> Result<NaiveDateTime, TimestampError> {
        parse_timestamp(&self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampError {
    input: String,
}

impl TimestampError {
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid timestamp '{}'", self.input)
    }
}

impl std::error::Error for TimestampError {}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp as naive local time.
///
/// A bare date maps to midnight. An RFC 3339 offset is accepted and dropped,
/// keeping the wall-clock reading.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = input.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.naive_local());
    }
    Err(TimestampError {
        input: input.to_string(),
    })
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    if value.nanosecond() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
