use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::availability::{HourWindow, WeeklyAvailability};

pub const DEFAULT_DAILY_CAP: u32 = 3;

#[derive(Debug)]
pub enum ConfigError {
    WindowStartOutOfRange(u32),
    WindowEndOutOfRange(u32),
    InvalidWindowSyntax(String),
    ZeroDailyCap,
    NegativeHorizon(i64),
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WindowStartOutOfRange(hour) => {
                write!(f, "window start hour {hour} must be between 0 and 23")
            }
            ConfigError::WindowEndOutOfRange(hour) => {
                write!(f, "window end hour {hour} must be between 0 and 24")
            }
            ConfigError::InvalidWindowSyntax(value) => {
                write!(f, "invalid hour window '{value}' (expected START-END, e.g. 16-22)")
            }
            ConfigError::ZeroDailyCap => write!(f, "daily_cap must be at least 1"),
            ConfigError::NegativeHorizon(days) => {
                write!(f, "max_horizon_days must not be negative (got {days})")
            }
            ConfigError::Io(err) => write!(f, "io error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Parameters of a goal expansion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub weekday_window: HourWindow,
    pub saturday_window: HourWindow,
    pub daily_cap: u32,
    /// Days past the start date a goal is expanded; `None` (the default) means unbounded.
    pub max_horizon_days: Option<i64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weekday_window: HourWindow::DEFAULT_WEEKDAY,
            saturday_window: HourWindow::DEFAULT_SATURDAY,
            daily_cap: DEFAULT_DAILY_CAP,
            max_horizon_days: None,
        }
    }
}

impl SchedulerConfig {
    pub fn new(weekday_window: HourWindow, saturday_window: HourWindow) -> Self {
        Self {
            weekday_window,
            saturday_window,
            ..Self::default()
        }
    }

    pub fn with_daily_cap(mut self, daily_cap: u32) -> Self {
        self.daily_cap = daily_cap;
        self
    }

    pub fn with_max_horizon_days(mut self, days: Option<i64>) -> Self {
        self.max_horizon_days = days;
        self
    }

    pub fn availability(&self) -> WeeklyAvailability {
        WeeklyAvailability::new(self.weekday_window, self.saturday_window)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_cap == 0 {
            return Err(ConfigError::ZeroDailyCap);
        }
        if let Some(days) = self.max_horizon_days {
            if days < 0 {
                return Err(ConfigError::NegativeHorizon(days));
            }
        }
        Ok(())
    }
}

pub fn load_scheduler_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig, ConfigError> {
    let file = File::open(path)?;
    let config: SchedulerConfig = serde_json::from_reader(file)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_batch_contract() {
        let config = SchedulerConfig::default();
        assert_eq!(config.weekday_window, HourWindow::new(16, 22).unwrap());
        assert_eq!(config.saturday_window, HourWindow::new(10, 16).unwrap());
        assert_eq!(config.daily_cap, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{ "weekday_window": { "start": 8, "end": 12 } }"#).unwrap();
        assert_eq!(config.weekday_window, HourWindow::new(8, 12).unwrap());
        assert_eq!(config.saturday_window, HourWindow::new(10, 16).unwrap());
        assert_eq!(config.max_horizon_days, None);
    }

    #[test]
    fn out_of_range_window_is_rejected_while_parsing() {
        let result: Result<SchedulerConfig, _> =
            serde_json::from_str(r#"{ "saturday_window": { "start": 30, "end": 31 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn zero_daily_cap_is_invalid() {
        let config = SchedulerConfig::default().with_daily_cap(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDailyCap)));
    }

    #[test]
    fn horizon_is_opt_in() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{ "max_horizon_days": 365 }"#).unwrap();
        assert_eq!(config.max_horizon_days, Some(365));
        let config: SchedulerConfig =
            serde_json::from_str(r#"{ "max_horizon_days": null }"#).unwrap();
        assert_eq!(config.max_horizon_days, None);
    }
}
