use super::{CalendarStore, StoreError, StoreResult};
use crate::calendar::{Calendar, CalendarCollection};
use crate::entry::{Entry, EntryType, HoursPerWeek};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `calendars` as pretty JSON.
///
/// The data goes to a temporary file next to `path` which then replaces
/// `path` in one rename, so a failed write leaves the old file intact.
pub fn save_calendars_to_json<P: AsRef<Path>>(
    calendars: &CalendarCollection,
    path: P,
) -> StoreResult<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, calendars)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    tracing::debug!(path = %path.display(), calendars = calendars.len(), "calendars saved");
    Ok(())
}

pub fn load_calendars_from_json<P: AsRef<Path>>(path: P) -> StoreResult<CalendarCollection> {
    let file = File::open(path)?;
    let calendars: CalendarCollection = serde_json::from_reader(BufReader::new(file))?;
    Ok(calendars)
}

/// JSON file holding the whole collection. A missing file means "nothing
/// stored yet".
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalendarStore for JsonFileStore {
    fn save_calendars(&self, calendars: &CalendarCollection) -> StoreResult<()> {
        save_calendars_to_json(calendars, &self.path)
    }

    fn load_calendars(&self) -> StoreResult<Option<CalendarCollection>> {
        match load_calendars_from_json(&self.path) {
            Ok(calendars) => Ok(Some(calendars)),
            Err(StoreError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct EntryCsvRecord {
    date: String,
    description: String,
    #[serde(rename = "type")]
    entry_type: String,
    hours_per_week: String,
}

impl From<&Entry> for EntryCsvRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            date: entry.date.clone(),
            description: entry.description.clone(),
            entry_type: entry.entry_type.as_str().to_string(),
            hours_per_week: match &entry.hours_per_week {
                None => String::new(),
                Some(HoursPerWeek::Count(hours)) => hours.to_string(),
                Some(HoursPerWeek::Malformed(serde_json::Value::String(raw))) => raw.clone(),
                Some(HoursPerWeek::Malformed(raw)) => raw.to_string(),
            },
        }
    }
}

impl EntryCsvRecord {
    fn into_entry(self) -> StoreResult<Entry> {
        let entry_type = EntryType::from_str(self.entry_type.trim()).ok_or_else(|| {
            StoreError::InvalidData(format!("invalid entry type '{}'", self.entry_type))
        })?;
        let raw = self.hours_per_week.trim();
        let hours_per_week = if raw.is_empty() {
            None
        } else {
            Some(match raw.parse::<i64>() {
                Ok(hours) => HoursPerWeek::Count(hours),
                Err(_) => HoursPerWeek::Malformed(serde_json::Value::String(raw.to_string())),
            })
        };
        Ok(Entry {
            date: self.date,
            description: self.description,
            entry_type,
            hours_per_week,
        })
    }
}

pub fn export_calendar_to_csv<P: AsRef<Path>>(calendar: &Calendar, path: P) -> StoreResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in calendar.entries() {
        writer.serialize(EntryCsvRecord::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn import_calendar_from_csv<P: AsRef<Path>>(path: P) -> StoreResult<Calendar> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut entries = Vec::new();
    for record in reader.deserialize::<EntryCsvRecord>() {
        entries.push(record?.into_entry()?);
    }
    Ok(Calendar::from_entries(entries))
}
