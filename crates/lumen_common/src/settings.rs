//! Settings and usage store.
//!
//! Holds the web-search toggle, the search API key and the per-month search
//! counter. One instance is constructed by the host and shared by reference;
//! every mutation is a read-modify-write under a single lock and is persisted
//! before it becomes visible.

use crate::error::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Free-tier search allowance per calendar month
pub const DEFAULT_MONTHLY_LIMIT: u32 = 2000;

/// Durable settings, round-tripped exactly across restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Search count keyed by "YYYY-MM"
    #[serde(default)]
    pub usage: BTreeMap<String, u32>,
}

/// Count for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub month_key: String,
    pub count: u32,
}

/// Storage owned by the host app
pub trait SettingsBackend: Send + Sync {
    fn load(&self) -> Result<PersistedSettings>;
    fn save(&self, settings: &PersistedSettings) -> Result<()>;
}

// ============================================================================
// Backends
// ============================================================================

/// JSON file backend. Writes go to a temp file and are renamed into place.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsBackend for JsonFileBackend {
    fn load(&self) -> Result<PersistedSettings> {
        if !self.path.exists() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(PersistedSettings::default());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, settings: &PersistedSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryBackend {
    saved: Mutex<PersistedSettings>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: PersistedSettings) -> Self {
        Self {
            saved: Mutex::new(settings),
        }
    }

    pub fn snapshot(&self) -> PersistedSettings {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettingsBackend for MemoryBackend {
    fn load(&self) -> Result<PersistedSettings> {
        Ok(self.snapshot())
    }

    fn save(&self, settings: &PersistedSettings) -> Result<()> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}

// ============================================================================
// Store
// ============================================================================

type MonthSource = Box<dyn Fn() -> String + Send + Sync>;

fn current_month_key() -> String {
    Local::now().format("%Y-%m").to_string()
}

pub struct SettingsStore {
    backend: Box<dyn SettingsBackend>,
    state: Mutex<PersistedSettings>,
    monthly_limit: u32,
    month_source: MonthSource,
}

impl SettingsStore {
    /// Load persisted state from `backend`
    pub fn open(backend: Box<dyn SettingsBackend>, monthly_limit: u32) -> Result<Self> {
        let state = backend.load()?;
        Ok(Self {
            backend,
            state: Mutex::new(state),
            monthly_limit,
            month_source: Box::new(current_month_key),
        })
    }

    /// Fresh in-memory store with the default limit
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            state: Mutex::new(PersistedSettings::default()),
            monthly_limit: DEFAULT_MONTHLY_LIMIT,
            month_source: Box::new(current_month_key),
        }
    }

    /// Override the month key source (rollover tests)
    pub fn with_month_source(mut self, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.month_source = Box::new(source);
        self
    }

    fn lock(&self) -> MutexGuard<'_, PersistedSettings> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to a copy, persist it, then publish it
    fn update<R>(&self, change: impl FnOnce(&mut PersistedSettings) -> R) -> Result<R> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        let out = change(&mut next);
        self.backend.save(&next)?;
        *guard = next;
        Ok(out)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|s| s.enabled = enabled)?;
        info!("Web search {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Store the API key. Blank input clears it.
    pub fn set_api_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        let value = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        self.update(|s| s.api_key = value)?;
        info!("Search API key {}", if key.is_empty() { "cleared" } else { "updated" });
        Ok(())
    }

    pub fn clear_api_key(&self) -> Result<()> {
        self.set_api_key("")
    }

    pub fn api_key(&self) -> Option<String> {
        self.lock().api_key.clone()
    }

    pub fn has_api_key(&self) -> bool {
        self.lock().api_key.is_some()
    }

    pub fn monthly_limit(&self) -> u32 {
        self.monthly_limit
    }

    pub fn searches_this_month(&self) -> u32 {
        let month = (self.month_source)();
        self.lock().usage.get(&month).copied().unwrap_or(0)
    }

    pub fn remaining_searches(&self) -> u32 {
        self.monthly_limit.saturating_sub(self.searches_this_month())
    }

    pub fn has_quota(&self) -> bool {
        self.remaining_searches() > 0
    }

    pub fn usage_record(&self) -> UsageRecord {
        let month_key = (self.month_source)();
        let count = self.lock().usage.get(&month_key).copied().unwrap_or(0);
        UsageRecord { month_key, count }
    }

    /// Count one outbound search against the current month. Returns the new count.
    pub fn record_search(&self) -> Result<u32> {
        let month = (self.month_source)();
        let count = self.update(|s| {
            let entry = s.usage.entry(month.clone()).or_insert(0);
            *entry = entry.saturating_add(1);
            *entry
        })?;
        debug!("Search usage for {}: {}/{}", month, count, self.monthly_limit);
        Ok(count)
    }
}
