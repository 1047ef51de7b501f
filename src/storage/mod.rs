//! Key/value persistence for events, tags and settings.

pub mod snapshot;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalendarError, CalendarResult};

pub use snapshot::{export_file_name, ImportPayload, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Events,
    Tags,
    Settings,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Events => "calendar-events",
            StorageKey::Tags => "calendar-tags",
            StorageKey::Settings => "calendar-settings",
        }
    }
}

/// Where the store keeps its data between runs.
pub trait Persistence {
    /// Raw stored JSON for `key`, or `None` if nothing was saved yet.
    fn load(&self, key: StorageKey) -> CalendarResult<Option<String>>;

    fn save(&self, key: StorageKey, contents: &str) -> CalendarResult<()>;

    fn remove(&self, key: StorageKey) -> CalendarResult<()>;
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> CalendarResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            CalendarError::Persistence(format!("Could not create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl Persistence for FileStorage {
    fn load(&self, key: StorageKey) -> CalendarResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| {
            CalendarError::Persistence(format!("Could not read {}: {e}", path.display()))
        })?;
        Ok(Some(contents))
    }

    fn save(&self, key: StorageKey, contents: &str) -> CalendarResult<()> {
        let path = self.path_for(key);
        // tmp + rename, readers only ever see a complete file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                CalendarError::Persistence(format!("Could not write {}: {e}", path.display()))
            })?;
        debug!(key = key.as_str(), bytes = contents.len(), "saved");
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> CalendarResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                CalendarError::Persistence(format!("Could not remove {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }
}

/// In-memory storage. Clones share the same map, so a test can keep a handle
/// to inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<StorageKey, String>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save`/`remove` fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    pub fn get(&self, key: StorageKey) -> Option<String> {
        self.inner.lock().ok()?.entries.get(&key).cloned()
    }

    pub fn put(&self, key: StorageKey, contents: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.insert(key, contents.into());
        }
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut MemoryInner) -> CalendarResult<T>) -> CalendarResult<T> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CalendarError::Persistence("memory storage poisoned".into()))?;
        f(&mut inner)
    }
}

impl Persistence for MemoryStorage {
    fn load(&self, key: StorageKey) -> CalendarResult<Option<String>> {
        self.with_inner(|inner| Ok(inner.entries.get(&key).cloned()))
    }

    fn save(&self, key: StorageKey, contents: &str) -> CalendarResult<()> {
        self.with_inner(|inner| {
            if inner.fail_writes {
                return Err(CalendarError::Persistence("storage quota exceeded".into()));
            }
            inner.entries.insert(key, contents.to_string());
            Ok(())
        })
    }

    fn remove(&self, key: StorageKey) -> CalendarResult<()> {
        self.with_inner(|inner| {
            if inner.fail_writes {
                return Err(CalendarError::Persistence("storage unavailable".into()));
            }
            inner.entries.remove(&key);
            Ok(())
        })
    }
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_view() -> String {
    "month".to_string()
}

fn default_city() -> String {
    "London".to_string()
}

fn default_true() -> bool {
    true
}

/// User preferences stored next to the events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_view")]
    pub default_view: String,
    #[serde(default = "default_city")]
    pub weather_city: String,
    /// 0 = Sunday, 1 = Monday
    #[serde(default)]
    pub week_starts_on: u8,
    #[serde(default = "default_true")]
    pub show_weather: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            default_view: default_view(),
            weather_city: default_city(),
            week_starts_on: 0,
            show_weather: true,
            notifications: true,
        }
    }
}
