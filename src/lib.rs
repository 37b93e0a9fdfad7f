pub mod availability;
pub mod calendar;
pub mod config;
pub mod entry;
pub mod goal_validation;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod month_view;
pub mod persistence;
pub mod scheduler;
pub mod session;

pub use availability::{DayKind, HourWindow, WeeklyAvailability};
pub use calendar::{Calendar, CalendarCollection, CalendarError};
pub use config::{ConfigError, SchedulerConfig, load_scheduler_config};
pub use entry::{
    Entry, EntryType, HoursPerWeek, TimestampError, format_timestamp, parse_timestamp,
};
pub use goal_validation::{GoalError, GoalSpec, goal_spec};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteCalendarStore;
pub use persistence::{
    CalendarStore, JsonFileStore, MemoryStore, SharedStore, StoreError, StoreResult,
    export_calendar_to_csv, import_calendar_from_csv, load_calendars_from_json, open_store,
    save_calendars_to_json,
};
pub use scheduler::{ExpansionReport, GoalRef, GoalSkip, expand, generate_slots};
pub use session::{Session, SessionError, SessionResult};
