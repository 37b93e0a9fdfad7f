use super::{CalendarStore, StoreError, StoreResult};
use crate::CalendarCollection;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-process store, used by tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<CalendarCollection>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendars(calendars: CalendarCollection) -> Self {
        Self {
            saved: Mutex::new(Some(calendars)),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail with an I/O error until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Option<CalendarCollection> {
        self.saved.lock().expect("memory store mutex poisoned").clone()
    }
}

impl CalendarStore for MemoryStore {
    fn save_calendars(&self, calendars: &CalendarCollection) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::other("store is read-only")));
        }
        *self.saved.lock().expect("memory store mutex poisoned") = Some(calendars.clone());
        Ok(())
    }

    fn load_calendars(&self) -> StoreResult<Option<CalendarCollection>> {
        Ok(self.snapshot())
    }
}
