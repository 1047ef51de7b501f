use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::date_key::DateKey;
use super::event::{normalize_tag, Event, EventDraft, EventPatch};
use super::tags::TagRegistry;
use crate::error::{CalendarError, CalendarResult};
use crate::storage::{Persistence, Settings, StorageKey};

/// Events grouped by day, each day in insertion order.
pub type EventMap = BTreeMap<DateKey, Vec<Event>>;

/// Date-keyed event collection with write-through persistence.
///
/// A day is present in the map only while it holds at least one event. Every
/// mutation is written to storage before the call returns; a failed write is
/// logged and leaves the in-memory state in place.
pub struct Store {
    events: EventMap,
    tags: TagRegistry,
    settings: Settings,
    storage: Box<dyn Persistence>,
    /// Keys whose latest write failed.
    unsaved: HashSet<StorageKey>,
}

impl Store {
    /// Load events, tags and settings from `storage`. Missing or malformed
    /// data falls back to empty defaults.
    pub fn load(storage: Box<dyn Persistence>) -> Self {
        let mut events: EventMap = load_or_default(storage.as_ref(), StorageKey::Events);
        let mut tags: TagRegistry = load_or_default(storage.as_ref(), StorageKey::Tags);
        let settings: Settings = load_or_default(storage.as_ref(), StorageKey::Settings);

        events.retain(|_, day| !day.is_empty());
        for day in events.values() {
            for event in day {
                tags.extend(&event.tags);
            }
        }

        info!(
            days = events.len(),
            tags = tags.len(),
            "event store loaded"
        );

        Self {
            events,
            tags,
            settings,
            storage,
            unsaved: HashSet::new(),
        }
    }

    pub fn events(&self) -> &EventMap {
        &self.events
    }

    /// Events on `key` in insertion order; empty if the day has none.
    pub fn events_for(&self, key: DateKey) -> &[Event] {
        self.events.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_day(&self, key: DateKey) -> bool {
        self.events.contains_key(&key)
    }

    pub fn find(&self, key: DateKey, id: &str) -> Option<&Event> {
        self.events_for(key).iter().find(|e| e.id == id)
    }

    pub fn total_events(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// False while any key's latest write to storage has failed.
    pub fn persistence_healthy(&self) -> bool {
        self.unsaved.is_empty()
    }

    pub fn add(&mut self, key: DateKey, draft: EventDraft) -> CalendarResult<Event> {
        let event = draft.into_event(Uuid::new_v4().to_string(), Utc::now())?;

        let new_tags = self.tags.extend(&event.tags);
        self.events.entry(key).or_default().push(event.clone());

        debug!(date = %key, id = %event.id, "event added");
        self.persist_events_and(new_tags);
        Ok(event)
    }

    pub fn update(&mut self, key: DateKey, id: &str, patch: EventPatch) -> CalendarResult<Event> {
        let slot = self
            .events
            .get_mut(&key)
            .and_then(|day| day.iter_mut().find(|e| e.id == id))
            .ok_or_else(|| CalendarError::NotFound(format!("{id} on {key}")))?;

        let updated = patch.apply_to(slot, Utc::now())?;
        *slot = updated.clone();

        let new_tags = self.tags.extend(&updated.tags);
        debug!(date = %key, id, "event updated");
        self.persist_events_and(new_tags);
        Ok(updated)
    }

    pub fn remove(&mut self, key: DateKey, id: &str) -> CalendarResult<Event> {
        let removed = take_event(&mut self.events, key, id)
            .ok_or_else(|| CalendarError::NotFound(format!("{id} on {key}")))?;

        debug!(date = %key, id, "event removed");
        self.persist(&[StorageKey::Events]);
        Ok(removed)
    }

    /// Move an event to another day, appending it there.
    ///
    /// Returns false without changing anything when the days are equal or the
    /// event is not on `from`.
    pub fn move_event(&mut self, from: DateKey, to: DateKey, id: &str) -> bool {
        if from == to {
            return false;
        }
        let Some(event) = take_event(&mut self.events, from, id) else {
            debug!(date = %from, id, "move skipped, event not found");
            return false;
        };

        self.events.entry(to).or_default().push(event);
        debug!(from = %from, to = %to, id, "event moved");
        self.persist(&[StorageKey::Events]);
        true
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        let added = self.tags.insert(tag);
        if added {
            self.persist(&[StorageKey::Tags]);
        }
        added
    }

    /// Drop a tag from the registry. Events that carry it keep it.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let Some(tag) = normalize_tag(tag) else {
            return false;
        };
        let removed = self.tags.remove(&tag);
        if removed {
            self.persist(&[StorageKey::Tags]);
        }
        removed
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.persist(&[StorageKey::Settings]);
    }

    /// Forget everything, in memory and in storage.
    pub fn clear_all(&mut self) {
        self.events.clear();
        self.tags.clear();
        self.settings = Settings::default();

        for key in [StorageKey::Events, StorageKey::Tags, StorageKey::Settings] {
            let result = self.storage.remove(key);
            self.record_write(key, result);
        }
        info!("all calendar data cleared");
    }

    pub(crate) fn replace_events(&mut self, mut events: EventMap) {
        events.retain(|_, day| !day.is_empty());
        let mut new_tags = false;
        for day in events.values() {
            for event in day {
                new_tags |= self.tags.extend(&event.tags);
            }
        }
        self.events = events;
        self.persist_events_and(new_tags);
    }

    pub(crate) fn replace_tags(&mut self, tags: TagRegistry) {
        self.tags = tags;
        for day in self.events.values() {
            for event in day {
                self.tags.extend(&event.tags);
            }
        }
        self.persist(&[StorageKey::Tags]);
    }

    fn persist_events_and(&mut self, tags_changed: bool) {
        if tags_changed {
            self.persist(&[StorageKey::Events, StorageKey::Tags]);
        } else {
            self.persist(&[StorageKey::Events]);
        }
    }

    fn persist(&mut self, keys: &[StorageKey]) {
        for &key in keys {
            let result = match key {
                StorageKey::Events => to_json(&self.events),
                StorageKey::Tags => to_json(&self.tags),
                StorageKey::Settings => to_json(&self.settings),
            }
            .and_then(|json| self.storage.save(key, &json));
            self.record_write(key, result);
        }
    }

    /// A key stays unsaved until a write of that same key succeeds.
    fn record_write(&mut self, key: StorageKey, result: CalendarResult<()>) {
        match result {
            Ok(()) => {
                self.unsaved.remove(&key);
            }
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "write failed, keeping in-memory state");
                self.unsaved.insert(key);
            }
        }
    }
}

fn take_event(events: &mut EventMap, key: DateKey, id: &str) -> Option<Event> {
    let day = events.get_mut(&key)?;
    let idx = day.iter().position(|e| e.id == id)?;
    let event = day.remove(idx);
    if day.is_empty() {
        events.remove(&key);
    }
    Some(event)
}

fn to_json<T: Serialize>(value: &T) -> CalendarResult<String> {
    serde_json::to_string(value).map_err(|e| CalendarError::Persistence(e.to_string()))
}

fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn Persistence, key: StorageKey) -> T {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "could not read stored data");
            return T::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key = key.as_str(), error = %e, "stored data is malformed, starting empty");
        T::default()
    })
}
