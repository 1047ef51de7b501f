//! Whole-store export and import.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::Settings;
use crate::calendar::{EventMap, Store, TagRegistry};
use crate::error::{CalendarError, CalendarResult};

/// Top-level keys that mark a document as a full snapshot rather than a bare
/// event map.
const SNAPSHOT_KEYS: [&str; 4] = ["events", "tags", "settings", "exportDate"];

/// Everything the store holds, stamped with the export time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub events: EventMap,
    pub tags: TagRegistry,
    pub settings: Settings,
    pub export_date: DateTime<Utc>,
}

/// A parsed import document. Sections that are `None` leave the store's
/// current data alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    pub events: Option<EventMap>,
    pub tags: Option<TagRegistry>,
    pub settings: Option<Settings>,
    pub export_date: Option<DateTime<Utc>>,
}

impl ImportPayload {
    /// Parse either a full snapshot or a bare date-keyed event map.
    ///
    /// Nothing is applied here, so a document that fails to parse can never
    /// leave the store half-imported.
    pub fn parse(raw: &str) -> CalendarResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CalendarError::Parse(format!("Invalid JSON file: {e}")))?;

        let Value::Object(ref fields) = value else {
            return Err(CalendarError::Parse("Expected a JSON object at the top level".into()));
        };

        let payload = if fields.is_empty() || SNAPSHOT_KEYS.iter().any(|k| fields.contains_key(*k)) {
            serde_json::from_value(value)
                .map_err(|e| CalendarError::Parse(format!("Invalid calendar snapshot: {e}")))?
        } else {
            let events: EventMap = serde_json::from_value(value)
                .map_err(|e| CalendarError::Parse(format!("Invalid event map: {e}")))?;
            Self {
                events: Some(events),
                ..Default::default()
            }
        };
        payload.sanitized()
    }

    /// Hold imported events to the same rules as ones created in the app:
    /// trimmed non-empty titles, normalized tags, ids unique across the map.
    fn sanitized(mut self) -> CalendarResult<Self> {
        if let Some(events) = self.events.take() {
            let mut seen = HashSet::new();
            let mut clean = EventMap::new();
            for (day, list) in events {
                let mut day_events = Vec::with_capacity(list.len());
                for event in list {
                    if !seen.insert(event.id.clone()) {
                        return Err(CalendarError::Parse(format!(
                            "Duplicate event id '{}' on {day}",
                            event.id
                        )));
                    }
                    let id = event.id.clone();
                    let event = event.sanitized().map_err(|e| {
                        CalendarError::Parse(format!("Invalid event '{id}' on {day}: {e}"))
                    })?;
                    day_events.push(event);
                }
                clean.insert(day, day_events);
            }
            self.events = Some(clean);
        }
        Ok(self)
    }
}

impl From<Snapshot> for ImportPayload {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            events: Some(snapshot.events),
            tags: Some(snapshot.tags),
            settings: Some(snapshot.settings),
            export_date: Some(snapshot.export_date),
        }
    }
}

/// What an import replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub events: Option<usize>,
    pub tags: Option<usize>,
    pub settings: bool,
}

impl ImportSummary {
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(n) = self.events {
            parts.push(format!("{n} event{}", if n == 1 { "" } else { "s" }));
        }
        if let Some(n) = self.tags {
            parts.push(format!("{n} tag{}", if n == 1 { "" } else { "s" }));
        }
        if self.settings {
            parts.push("settings".to_string());
        }
        if parts.is_empty() {
            "nothing to import".to_string()
        } else {
            format!("Imported {}", parts.join(", "))
        }
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("calendar-events-{}.json", date.format("%Y-%m-%d"))
}

impl Store {
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            events: self.events().clone(),
            tags: self.tags().clone(),
            settings: self.settings().clone(),
            export_date: Utc::now(),
        }
    }

    /// Overwrite each section present in `payload`.
    pub fn import_snapshot(&mut self, payload: ImportPayload) -> ImportSummary {
        let mut summary = ImportSummary::default();

        // Events first, so the registry is rebuilt against the new events
        // rather than the ones being replaced.
        if let Some(events) = payload.events {
            summary.events = Some(events.values().map(Vec::len).sum());
            self.replace_events(events);
        }
        if let Some(tags) = payload.tags {
            summary.tags = Some(tags.len());
            self.replace_tags(tags);
        }
        if let Some(settings) = payload.settings {
            summary.settings = true;
            self.update_settings(settings);
        }

        info!(
            events = ?summary.events,
            tags = ?summary.tags,
            settings = summary.settings,
            "snapshot imported"
        );
        summary
    }

    pub fn import_str(&mut self, raw: &str) -> CalendarResult<ImportSummary> {
        let payload = ImportPayload::parse(raw)?;
        Ok(self.import_snapshot(payload))
    }

    pub fn import_file(&mut self, path: &Path) -> CalendarResult<ImportSummary> {
        let raw = fs::read_to_string(path)
            .map_err(|e| CalendarError::Parse(format!("Failed to read {}: {e}", path.display())))?;
        self.import_str(&raw)
    }

    /// Write the event map, pretty-printed, to `dir` and return the file path.
    pub fn write_export_file(&self, dir: &Path, today: NaiveDate) -> CalendarResult<PathBuf> {
        let path = dir.join(export_file_name(today));
        let json = serde_json::to_string_pretty(self.events())
            .map_err(|e| CalendarError::Persistence(e.to_string()))?;
        fs::create_dir_all(dir)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "events exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Category, DateKey, EventDraft};
    use crate::storage::{MemoryStorage, StorageKey};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn populated() -> Store {
        let mut store = Store::load(Box::new(MemoryStorage::new()));
        store
            .add(key("2024-03-05"), EventDraft::new("Standup", Category::Meeting).tags(["team"]))
            .unwrap();
        store
            .add(key("2024-03-07"), EventDraft::new("Report", Category::Deadline))
            .unwrap();
        store.add_tag("someday");
        store
    }

    #[test]
    fn test_export_import_roundtrip_is_identity() {
        let mut store = populated();
        let before_events = store.events().clone();
        let before_tags = store.tags().clone();

        let snapshot = store.export_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        store.import_str(&json).unwrap();

        assert_eq!(*store.events(), before_events);
        assert_eq!(*store.tags(), before_tags);
    }

    #[test]
    fn test_import_into_fresh_store() {
        let source = populated();
        let json = serde_json::to_string_pretty(&source.export_snapshot()).unwrap();

        let storage = MemoryStorage::new();
        let mut target = Store::load(Box::new(storage.clone()));
        let summary = target.import_str(&json).unwrap();

        assert_eq!(target.events(), source.events());
        assert_eq!(target.tags(), source.tags());
        assert_eq!(summary.events, Some(2));
        assert!(summary.settings);
        assert!(storage.get(StorageKey::Events).is_some());
    }

    #[test]
    fn test_absent_sections_are_untouched() {
        let mut store = populated();
        let events = store.events().clone();

        let summary = store.import_str(r#"{"tags": ["fresh"]}"#).unwrap();
        assert_eq!(*store.events(), events);
        assert_eq!(summary.events, None);
        // Imported tags replace the registry, event tags stay covered
        let tags: Vec<_> = store.tags().iter().cloned().collect();
        assert_eq!(tags, vec!["fresh", "team"]);
    }

    #[test]
    fn test_bare_event_map_replaces_events() {
        let mut store = populated();
        let raw = r#"{
            "2024-04-01": [{
                "id": "imported-1", "title": "Fools", "category": "other",
                "tags": ["jokes"],
                "createdAt": "2024-03-30T09:00:00Z",
                "updatedAt": "2024-03-30T09:00:00Z"
            }]
        }"#;

        let summary = store.import_str(raw).unwrap();
        assert_eq!(summary.events, Some(1));
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.events_for(key("2024-04-01"))[0].id, "imported-1");
        assert!(store.tags().contains("jokes"));
        assert!(store.tags().contains("team"));
    }

    #[test]
    fn test_malformed_import_is_rejected_wholesale() {
        let mut store = populated();
        let events = store.events().clone();
        let tags = store.tags().clone();

        for raw in [
            "not json",
            "[1, 2]",
            r#"{"events": {"2024-03-05": [{"title": "no id"}]}, "tags": ["x"]}"#,
            r#"{"2024-13-40": []}"#,
            r#"{"events": {"2024-03-05": [{"id": "1", "title": "t", "category": "party", "createdAt": "2024-03-01T00:00:00Z", "updatedAt": "2024-03-01T00:00:00Z"}]}}"#,
        ] {
            assert!(matches!(store.import_str(raw), Err(CalendarError::Parse(_))), "{raw}");
        }
        assert_eq!(*store.events(), events);
        assert_eq!(*store.tags(), tags);
    }

    #[test]
    fn test_empty_object_imports_nothing() {
        let mut store = populated();
        let summary = store.import_str("{}").unwrap();
        assert_eq!(summary, ImportSummary::default());
        assert_eq!(store.total_events(), 2);
    }

    #[test]
    fn test_export_file_is_pretty_event_map() {
        let store = populated();
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();

        let path = store.write_export_file(dir.path(), today).unwrap();
        assert_eq!(path.file_name().unwrap(), "calendar-events-2024-03-08.json");

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"2024-03-05\""));

        let mut fresh = Store::load(Box::new(MemoryStorage::new()));
        fresh.import_file(&path).unwrap();
        assert_eq!(fresh.events(), store.events());
    }

    #[test]
    fn test_import_replaces_tags_of_overwritten_events() {
        let mut store = Store::load(Box::new(MemoryStorage::new()));
        store
            .add(key("2024-03-05"), EventDraft::new("Old", Category::Work).tags(["alpha"]))
            .unwrap();

        let mut source = Store::load(Box::new(MemoryStorage::new()));
        source
            .add(key("2024-04-01"), EventDraft::new("New", Category::Work).tags(["beta"]))
            .unwrap();
        let json = serde_json::to_string(&source.export_snapshot()).unwrap();

        store.import_str(&json).unwrap();
        let tags: Vec<_> = store.tags().iter().cloned().collect();
        assert_eq!(tags, vec!["beta"]);
        assert_eq!(store.total_events(), 1);
    }

    #[test]
    fn test_imported_events_are_sanitized() {
        let mut store = Store::load(Box::new(MemoryStorage::new()));
        let raw = r#"{
            "2024-03-05": [{
                "id": "a", "title": "  Planning  ", "description": " notes ",
                "category": "work", "tags": ["LOUD", " loud ", "Quiet"],
                "createdAt": "2024-03-01T00:00:00Z",
                "updatedAt": "2024-03-01T00:00:00Z"
            }]
        }"#;

        store.import_str(raw).unwrap();
        let event = &store.events_for(key("2024-03-05"))[0];
        assert_eq!(event.title, "Planning");
        assert_eq!(event.description, "notes");
        assert_eq!(event.tags, vec!["loud", "quiet"]);
        assert!(store.tags().contains("loud"));

        let state = crate::calendar::FilterState {
            selected_tags: vec!["loud".into()],
            ..Default::default()
        };
        assert_eq!(crate::calendar::filter::apply(store.events_for(key("2024-03-05")), &state).len(), 1);
    }

    #[test]
    fn test_import_rejects_blank_titles_and_duplicate_ids() {
        let mut store = populated();
        let events = store.events().clone();

        let blank = r#"{
            "2024-03-05": [{
                "id": "a", "title": "   ", "category": "work",
                "createdAt": "2024-03-01T00:00:00Z", "updatedAt": "2024-03-01T00:00:00Z"
            }]
        }"#;
        let duplicate = r#"{
            "2024-03-05": [{
                "id": "dup", "title": "One", "category": "work",
                "createdAt": "2024-03-01T00:00:00Z", "updatedAt": "2024-03-01T00:00:00Z"
            }],
            "2024-03-06": [{
                "id": "dup", "title": "Two", "category": "work",
                "createdAt": "2024-03-01T00:00:00Z", "updatedAt": "2024-03-01T00:00:00Z"
            }]
        }"#;

        for raw in [blank, duplicate] {
            assert!(matches!(store.import_str(raw), Err(CalendarError::Parse(_))), "{raw}");
        }
        assert_eq!(*store.events(), events);
    }
}
