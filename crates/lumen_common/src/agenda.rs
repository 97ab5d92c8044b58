//! Calendar and reminders collaborator.
//!
//! The platform agenda is behind `AgendaService`. The CLI host ships a local
//! JSON-file store; tests use the in-memory one, which can refuse access.

use crate::error::{AugmentError, Result};
use crate::types::TimeRange;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Local>,
    #[serde(default)]
    pub end: Option<DateTime<Local>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub all_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub due: Option<DateTime<Local>>,
    #[serde(default)]
    pub completed: bool,
}

#[async_trait]
pub trait AgendaService: Send + Sync {
    /// Ask for calendar/reminder access. `false` means the user refused.
    async fn request_access(&self) -> Result<bool>;

    async fn fetch_events(&self, range: TimeRange) -> Result<Vec<CalendarEvent>>;

    /// Open reminders, soonest first
    async fn fetch_reminders(&self) -> Result<Vec<Reminder>>;

    async fn create_reminder(&self, title: &str, due: Option<DateTime<Local>>) -> Result<Reminder>;
}

/// Half-open window `[start, end)` for a time range
pub fn range_bounds(range: TimeRange, now: DateTime<Local>) -> (DateTime<Local>, DateTime<Local>) {
    let midnight = |date: chrono::NaiveDate| {
        Local
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .unwrap_or(now)
    };
    let today = now.date_naive();
    match range {
        TimeRange::Today => (midnight(today), midnight(today + Duration::days(1))),
        TimeRange::Tomorrow => (
            midnight(today + Duration::days(1)),
            midnight(today + Duration::days(2)),
        ),
        TimeRange::ThisWeek => {
            let days_left = 7 - i64::from(today.weekday().num_days_from_monday());
            (midnight(today), midnight(today + Duration::days(days_left)))
        }
    }
}

fn events_in(events: &[CalendarEvent], range: TimeRange, now: DateTime<Local>) -> Vec<CalendarEvent> {
    let (start, end) = range_bounds(range, now);
    let mut hits: Vec<CalendarEvent> = events
        .iter()
        .filter(|e| e.start >= start && e.start < end)
        .cloned()
        .collect();
    hits.sort_by_key(|e| e.start);
    hits
}

fn open_reminders(reminders: &[Reminder]) -> Vec<Reminder> {
    let mut open: Vec<Reminder> = reminders.iter().filter(|r| !r.completed).cloned().collect();
    // undated reminders last
    open.sort_by_key(|r| (r.due.is_none(), r.due));
    open
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AgendaFile {
    #[serde(default)]
    events: Vec<CalendarEvent>,
    #[serde(default)]
    reminders: Vec<Reminder>,
}

impl AgendaFile {
    fn next_id(&self) -> u64 {
        self.reminders.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }
}

// ============================================================================
// Local JSON store
// ============================================================================

/// Agenda kept in a JSON file next to the settings
pub struct LocalAgendaStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalAgendaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<AgendaFile> {
        if !self.path.exists() {
            return Ok(AgendaFile::default());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, file: &AgendaFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(file)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Add an event (used by `lumenctl` and tests to seed the calendar)
    pub fn add_event(&self, event: CalendarEvent) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read()?;
        file.events.push(event);
        self.write(&file)
    }
}

#[async_trait]
impl AgendaService for LocalAgendaStore {
    async fn request_access(&self) -> Result<bool> {
        // a local file needs no grant, only a readable path
        match self.read() {
            Ok(_) => Ok(true),
            Err(AugmentError::Io(e)) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_events(&self, range: TimeRange) -> Result<Vec<CalendarEvent>> {
        let file = self.read()?;
        Ok(events_in(&file.events, range, Local::now()))
    }

    async fn fetch_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(open_reminders(&self.read()?.reminders))
    }

    async fn create_reminder(&self, title: &str, due: Option<DateTime<Local>>) -> Result<Reminder> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read()?;
        let reminder = Reminder {
            id: file.next_id(),
            title: title.to_string(),
            due,
            completed: false,
        };
        file.reminders.push(reminder.clone());
        self.write(&file)?;
        info!("Created reminder #{}", reminder.id);
        Ok(reminder)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory agenda with access control and call counters
pub struct MemoryAgenda {
    granted: bool,
    state: Mutex<AgendaFile>,
    access_requests: AtomicUsize,
    reads: AtomicUsize,
}

impl Default for MemoryAgenda {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAgenda {
    pub fn new() -> Self {
        Self {
            granted: true,
            state: Mutex::new(AgendaFile::default()),
            access_requests: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    /// Every access request is refused
    pub fn denying() -> Self {
        Self {
            granted: false,
            ..Self::new()
        }
    }

    pub fn with_events(self, events: Vec<CalendarEvent>) -> Self {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events = events;
        self
    }

    pub fn with_reminders(self, reminders: Vec<Reminder>) -> Self {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reminders = reminders;
        self
    }

    pub fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }

    /// Event/reminder reads plus creations
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reminders
            .clone()
    }
}

#[async_trait]
impl AgendaService for MemoryAgenda {
    async fn request_access(&self) -> Result<bool> {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.granted)
    }

    async fn fetch_events(&self, range: TimeRange) -> Result<Vec<CalendarEvent>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(events_in(&state.events, range, Local::now()))
    }

    async fn fetch_reminders(&self) -> Result<Vec<Reminder>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(open_reminders(&state.reminders))
    }

    async fn create_reminder(&self, title: &str, due: Option<DateTime<Local>>) -> Result<Reminder> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let reminder = Reminder {
            id: state.next_id(),
            title: title.to_string(),
            due,
            completed: false,
        };
        state.reminders.push(reminder.clone());
        debug!("memory agenda: {} reminders", state.reminders.len());
        Ok(reminder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap()
    }

    fn event(title: &str, start: DateTime<Local>) -> CalendarEvent {
        CalendarEvent {
            title: title.to_string(),
            start,
            end: None,
            location: None,
            all_day: false,
        }
    }

    #[test]
    fn test_range_bounds() {
        // 2026-03-11 is a Wednesday
        let now = at(2026, 3, 11, 15);
        let (start, end) = range_bounds(TimeRange::Today, now);
        assert_eq!(start, at(2026, 3, 11, 0));
        assert_eq!(end, at(2026, 3, 12, 0));

        let (start, _) = range_bounds(TimeRange::Tomorrow, now);
        assert_eq!(start.day(), 12);
        assert_eq!(start.hour(), 0);

        let (_, end) = range_bounds(TimeRange::ThisWeek, now);
        assert_eq!(end, at(2026, 3, 16, 0));
    }

    #[test]
    fn test_events_filtered_and_sorted() {
        let now = at(2026, 3, 11, 8);
        let events = vec![
            event("late", at(2026, 3, 11, 17)),
            event("tomorrow", at(2026, 3, 12, 9)),
            event("early", at(2026, 3, 11, 9)),
        ];
        let today = events_in(&events, TimeRange::Today, now);
        let titles: Vec<_> = today.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[test]
    fn test_open_reminders_order() {
        let reminders = vec![
            Reminder { id: 1, title: "undated".into(), due: None, completed: false },
            Reminder { id: 2, title: "done".into(), due: Some(at(2026, 1, 1, 9)), completed: true },
            Reminder { id: 3, title: "soon".into(), due: Some(at(2026, 1, 2, 9)), completed: false },
        ];
        let open = open_reminders(&reminders);
        let titles: Vec<_> = open.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "undated"]);
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAgendaStore::new(dir.path().join("agenda.json"));
        assert!(store.request_access().await.unwrap());
        assert!(store.fetch_reminders().await.unwrap().is_empty());

        let first = store.create_reminder("call mom", None).await.unwrap();
        let second = store.create_reminder("pay rent", None).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let reopened = LocalAgendaStore::new(dir.path().join("agenda.json"));
        let titles: Vec<_> = reopened
            .fetch_reminders()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["call mom", "pay rent"]);
    }

    #[tokio::test]
    async fn test_memory_agenda_denies() {
        let agenda = MemoryAgenda::denying();
        assert!(!agenda.request_access().await.unwrap());
        assert_eq!(agenda.access_requests(), 1);
        assert_eq!(agenda.reads(), 0);
    }
}
