use chrono::NaiveDateTime;
use std::fmt;

use crate::entry::{Entry, EntryType, HoursPerWeek};

/// Reasons a single goal cannot be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalError {
    NotAGoal(EntryType),
    MissingHoursPerWeek,
    InvalidHoursPerWeek(i64),
    MalformedHoursPerWeek(String),
    InvalidDeadline(String),
}

impl fmt::Display for GoalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalError::NotAGoal(kind) => write!(f, "entry of type {kind} is not a goal"),
            GoalError::MissingHoursPerWeek => write!(f, "goal has no hours_per_week"),
            GoalError::InvalidHoursPerWeek(value) => {
                write!(f, "goal hours_per_week must be at least 1 (got {value})")
            }
            GoalError::MalformedHoursPerWeek(raw) => {
                write!(f, "goal hours_per_week {raw} is not an integer")
            }
            GoalError::InvalidDeadline(value) => write!(f, "goal deadline '{value}' is not a valid timestamp"),
        }
    }
}

impl std::error::Error for GoalError {}

/// A goal entry that passed validation and can be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSpec {
    pub label: String,
    pub deadline: NaiveDateTime,
    pub weekly_quota: u32,
}

pub fn validate_hours_per_week(value: i64) -> Result<u32, GoalError> {
    if value < 1 {
        return Err(GoalError::InvalidHoursPerWeek(value));
    }
    u32::try_from(value).map_err(|_| GoalError::InvalidHoursPerWeek(value))
}

pub fn goal_spec(entry: &Entry) -> Result<GoalSpec, GoalError> {
    if entry.entry_type != EntryType::Goal {
        return Err(GoalError::NotAGoal(entry.entry_type));
    }
    let hours = match &entry.hours_per_week {
        None => return Err(GoalError::MissingHoursPerWeek),
        Some(HoursPerWeek::Count(hours)) => *hours,
        Some(HoursPerWeek::Malformed(raw)) => {
            return Err(GoalError::MalformedHoursPerWeek(raw.to_string()));
        }
    };
    let weekly_quota = validate_hours_per_week(hours)?;
    let deadline = entry
        .timestamp()
        .map_err(|err| GoalError::InvalidDeadline(err.input().to_string()))?;
    Ok(GoalSpec {
        label: entry.description.clone(),
        deadline,
        weekly_quota,
    })
}
