use crate::CalendarCollection;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum StoreError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Serialization(err) => write!(f, "serialization error: {err}"),
            StoreError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            StoreError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            StoreError::Csv(err) => write!(f, "csv error: {err}"),
            StoreError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<SerdeJsonError> for StoreError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for StoreError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<tempfile::PersistError> for StoreError {
    fn from(value: tempfile::PersistError) -> Self {
        Self::Io(value.error)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Whole-collection repository: every load reads everything, every save
/// replaces everything.
pub trait CalendarStore {
    fn save_calendars(&self, calendars: &CalendarCollection) -> StoreResult<()>;
    /// `Ok(None)` when nothing has been stored yet.
    fn load_calendars(&self) -> StoreResult<Option<CalendarCollection>>;
}

pub type SharedStore = Box<dyn CalendarStore + Send + Sync>;

const SQLITE_PREFIX: &str = "sqlite:";

/// Opens the store named by a data location: `sqlite:<path>` selects the
/// SQLite store, anything else is a JSON file path.
pub fn open_store(location: &str) -> StoreResult<SharedStore> {
    match location.strip_prefix(SQLITE_PREFIX) {
        #[cfg(feature = "sqlite")]
        Some(path) => Ok(Box::new(sqlite::SqliteCalendarStore::new(path)?)),
        #[cfg(not(feature = "sqlite"))]
        Some(_) => Err(StoreError::InvalidData(format!(
            "'{location}' needs a build with the `sqlite` feature"
        ))),
        None => Ok(Box::new(file::JsonFileStore::new(location))),
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonFileStore, export_calendar_to_csv, import_calendar_from_csv, load_calendars_from_json,
    save_calendars_to_json,
};
pub use memory::MemoryStore;
