use super::{CalendarStore, StoreResult};
use crate::calendar::{Calendar, CalendarCollection};
use crate::entry::Entry;
use rusqlite::{Connection, params};
use std::sync::Mutex;

pub struct SqliteCalendarStore {
    connection: Mutex<Connection>,
}

impl SqliteCalendarStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS calendars (
                name TEXT PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS entries (
                calendar TEXT NOT NULL REFERENCES calendars(name) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                entry_json TEXT NOT NULL,
                PRIMARY KEY (calendar, position)
            );
            CREATE TABLE IF NOT EXISTS store_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_calendar(
        &self,
        tx: &rusqlite::Transaction,
        name: &str,
        calendar: &Calendar,
    ) -> StoreResult<()> {
        tx.execute("INSERT INTO calendars (name) VALUES (?1)", params![name])?;
        let mut stmt =
            tx.prepare("INSERT INTO entries (calendar, position, entry_json) VALUES (?1, ?2, ?3)")?;
        for (position, entry) in calendar.entries().iter().enumerate() {
            let json = serde_json::to_string(entry)?;
            stmt.execute(params![name, position as i64, json])?;
        }
        Ok(())
    }
}

impl CalendarStore for SqliteCalendarStore {
    fn save_calendars(&self, calendars: &CalendarCollection) -> StoreResult<()> {
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        tx.execute("DELETE FROM calendars", [])?;
        for (name, calendar) in calendars.iter() {
            self.save_calendar(&tx, name, calendar)?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO store_state (id, saved_at) VALUES (1, datetime('now'))",
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_calendars(&self) -> StoreResult<Option<CalendarCollection>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let saved: i64 = conn.query_row("SELECT COUNT(*) FROM store_state", [], |row| row.get(0))?;
        if saved == 0 {
            return Ok(None);
        }

        let mut collection = CalendarCollection::new();
        let mut stmt = conn.prepare("SELECT name FROM calendars ORDER BY name ASC")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for name in names {
            collection.insert(name?, Calendar::new());
        }

        let mut stmt =
            conn.prepare("SELECT calendar, entry_json FROM entries ORDER BY calendar ASC, position ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (name, json) = row?;
            let entry: Entry = serde_json::from_str(&json)?;
            if let Some(calendar) = collection.calendar_mut(&name) {
                calendar.push(entry);
            }
        }

        Ok(Some(collection))
    }
}
