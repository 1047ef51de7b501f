use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDate};
use tracing::{info, warn};

use daygrid::calendar::date_key::{is_in_weather_range, month_shift};
use daygrid::calendar::filter::{self, event_count};
use daygrid::calendar::{DateKey, Event, EventMap, FilterState, Store};
use daygrid::weather::{WeatherRefresher, WeatherSample, WeatherUpdate};

use crate::components::{EventFormState, FormField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    Import,
    City,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Search => "Search",
            PromptKind::Import => "Import file",
            PromptKind::City => "Weather city",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Form,
    Prompt(PromptKind),
}

/// An event picked up with `m`, waiting to be dropped on another day.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub from: DateKey,
    pub id: String,
    pub title: String,
}

pub struct App {
    pub running: bool,
    pub input_mode: InputMode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    pub store: Store,
    pub filters: FilterState,
    pub tag_cursor: Option<usize>,
    pub selected_event: usize,
    pub form: Option<EventFormState>,
    pub prompt_buffer: String,
    pub pending_move: Option<PendingMove>,
    pub weather: BTreeMap<DateKey, WeatherSample>,
    pub weather_configured: bool,
    pub show_help: bool,
    pub status_message: Option<String>,
    export_dir: PathBuf,
    refresher: Option<WeatherRefresher>,
}

impl App {
    pub fn new(store: Store, export_dir: PathBuf, today: NaiveDate) -> Self {
        Self {
            running: true,
            input_mode: InputMode::Normal,
            selected_date: today,
            today,
            store,
            filters: FilterState::default(),
            tag_cursor: None,
            selected_event: 0,
            form: None,
            prompt_buffer: String::new(),
            pending_move: None,
            weather: BTreeMap::new(),
            weather_configured: true,
            show_help: false,
            status_message: None,
            export_dir,
            refresher: None,
        }
    }

    pub fn attach_weather(&mut self, refresher: WeatherRefresher) {
        self.refresher = Some(refresher);
    }

    pub fn take_refresher(&mut self) -> Option<WeatherRefresher> {
        self.refresher.take()
    }

    pub fn weather_city(&self) -> &str {
        &self.store.settings().weather_city
    }

    pub fn selected_key(&self) -> DateKey {
        DateKey::new(self.selected_date)
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    // ── Derived views ──

    /// The whole store after filtering.
    pub fn visible_events(&self) -> EventMap {
        filter::apply_to_store(self.store.events(), &self.filters)
    }

    /// Filtered events on the selected day.
    pub fn day_events(&self) -> Vec<Event> {
        filter::apply(self.store.events_for(self.selected_key()), &self.filters)
    }

    pub fn selected(&self) -> Option<Event> {
        self.day_events().into_iter().nth(self.selected_event)
    }

    pub fn visible_count(&self) -> usize {
        event_count(&self.visible_events())
    }

    // ── Navigation ──

    pub fn next_day(&mut self) {
        self.move_selection(Duration::days(1));
    }

    pub fn prev_day(&mut self) {
        self.move_selection(Duration::days(-1));
    }

    pub fn next_week(&mut self) {
        self.move_selection(Duration::weeks(1));
    }

    pub fn prev_week(&mut self) {
        self.move_selection(Duration::weeks(-1));
    }

    pub fn next_month(&mut self) {
        self.selected_date = month_shift(self.selected_date, 1);
        self.on_date_changed();
    }

    pub fn prev_month(&mut self) {
        self.selected_date = month_shift(self.selected_date, -1);
        self.on_date_changed();
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.selected_date = self.today;
        self.on_date_changed();
    }

    fn move_selection(&mut self, by: Duration) {
        if let Some(date) = self.selected_date.checked_add_signed(by) {
            self.selected_date = date;
        }
        self.on_date_changed();
    }

    fn on_date_changed(&mut self) {
        self.selected_event = 0;
        let key = self.selected_key();
        if self.weather_configured
            && !self.weather.contains_key(&key)
            && is_in_weather_range(self.selected_date, self.today)
        {
            if let Some(refresher) = &self.refresher {
                refresher.request_day(self.selected_date);
            }
        }
    }

    pub fn select_next_event(&mut self) {
        let n = self.day_events().len();
        if n > 0 {
            self.selected_event = (self.selected_event + 1).min(n - 1);
        }
    }

    pub fn select_prev_event(&mut self) {
        self.selected_event = self.selected_event.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let n = self.day_events().len();
        self.selected_event = self.selected_event.min(n.saturating_sub(1));
    }

    // ── Event form ──

    pub fn open_new_form(&mut self) {
        self.form = Some(EventFormState::new(self.selected_key()));
        self.input_mode = InputMode::Form;
    }

    pub fn open_edit_form(&mut self) {
        match self.selected() {
            Some(event) => {
                self.form = Some(EventFormState::edit(self.selected_key(), &event));
                self.input_mode = InputMode::Form;
            }
            None => self.set_status("No event selected"),
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn form_mut(&mut self) -> Option<&mut EventFormState> {
        self.form.as_mut()
    }

    pub fn form_next_field(&mut self) {
        if let Some(form) = &mut self.form {
            form.active_field = form.active_field.next();
        }
    }

    pub fn form_prev_field(&mut self) {
        if let Some(form) = &mut self.form {
            form.active_field = form.active_field.prev();
        }
    }

    /// Space cycles the category on that field and types a space elsewhere.
    pub fn form_space(&mut self) {
        if let Some(form) = &mut self.form {
            if form.active_field == FormField::Category {
                form.cycle_category();
            } else {
                form.input_char(' ');
            }
        }
    }

    /// Add or update from the form. On a validation error the form stays
    /// open with the message in the status bar.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };

        let result = match &form.editing {
            Some(id) => self.store.update(form.date, id, form.to_patch()),
            None => self.store.add(form.date, form.to_draft()),
        };

        match result {
            Ok(event) => {
                let verb = if form.is_editing() { "Updated" } else { "Added" };
                self.set_status(format!("{verb} \"{}\"", event.title));
                self.close_form();
                if let Some(idx) = self.day_events().iter().position(|e| e.id == event.id) {
                    self.selected_event = idx;
                }
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(event) = self.selected() else {
            self.set_status("No event selected");
            return;
        };
        match self.store.remove(self.selected_key(), &event.id) {
            Ok(removed) => {
                if self.pending_move.as_ref().is_some_and(|m| m.id == removed.id) {
                    self.pending_move = None;
                }
                self.set_status(format!("Deleted \"{}\"", removed.title));
                self.clamp_selection();
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // ── Moving events between days ──

    pub fn pick_up_selected(&mut self) {
        match self.selected() {
            Some(event) => {
                self.set_status(format!("Moving \"{}\": pick a day, p to drop", event.title));
                self.pending_move = Some(PendingMove {
                    from: self.selected_key(),
                    id: event.id,
                    title: event.title,
                });
            }
            None => self.set_status("No event selected"),
        }
    }

    pub fn drop_pending(&mut self) {
        let Some(pending) = self.pending_move.take() else {
            self.set_status("Nothing to move (m picks up an event)");
            return;
        };
        let to = self.selected_key();
        if pending.from == to {
            self.set_status(format!("\"{}\" is already on {to}", pending.title));
            self.pending_move = Some(pending);
            return;
        }
        if self.store.move_event(pending.from, to, &pending.id) {
            self.set_status(format!("Moved \"{}\" to {to}", pending.title));
            if let Some(idx) = self.day_events().iter().position(|e| e.id == pending.id) {
                self.selected_event = idx;
            }
        } else {
            self.set_status(format!("\"{}\" no longer exists", pending.title));
        }
    }

    pub fn cancel(&mut self) {
        if self.pending_move.take().is_some() {
            self.set_status("Move cancelled");
        }
    }

    // ── Filters ──

    pub fn cycle_category(&mut self) {
        self.filters.cycle_category();
        self.clamp_selection();
    }

    pub fn next_tag_cursor(&mut self) {
        let n = self.store.tags().len();
        self.tag_cursor = match self.tag_cursor {
            _ if n == 0 => None,
            None => Some(0),
            Some(i) if i + 1 >= n => None,
            Some(i) => Some(i + 1),
        };
    }

    pub fn toggle_tag_at_cursor(&mut self) {
        let tag = self
            .tag_cursor
            .and_then(|i| self.store.tags().iter().nth(i).cloned());
        match tag {
            Some(tag) => {
                self.filters.toggle_tag(&tag);
                self.clamp_selection();
            }
            None => self.set_status("Press T to pick a tag first"),
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.tag_cursor = None;
        self.set_status("Filters cleared");
    }

    // ── Prompts ──

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt_buffer = match kind {
            PromptKind::Search => self.filters.search_query.clone(),
            PromptKind::City => self.weather_city().to_string(),
            PromptKind::Import => String::new(),
        };
        self.input_mode = InputMode::Prompt(kind);
    }

    pub fn prompt_input(&mut self, c: char) {
        self.prompt_buffer.push(c);
        self.sync_search();
    }

    pub fn prompt_backspace(&mut self) {
        self.prompt_buffer.pop();
        self.sync_search();
    }

    /// Search filters as you type.
    fn sync_search(&mut self) {
        if self.input_mode == InputMode::Prompt(PromptKind::Search) {
            self.filters.search_query = self.prompt_buffer.clone();
            self.clamp_selection();
        }
    }

    pub fn cancel_prompt(&mut self) {
        if self.input_mode == InputMode::Prompt(PromptKind::Search) {
            self.filters.search_query.clear();
        }
        self.prompt_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_prompt(&mut self) {
        let InputMode::Prompt(kind) = self.input_mode else {
            return;
        };
        let value = std::mem::take(&mut self.prompt_buffer);
        self.input_mode = InputMode::Normal;

        match kind {
            PromptKind::Search => {}
            PromptKind::Import => self.import_from(Path::new(value.trim())),
            PromptKind::City => self.set_city(value.trim()),
        }
    }

    // ── Import / export ──

    pub fn export(&mut self) {
        match self.store.write_export_file(&self.export_dir, self.today) {
            Ok(path) => self.set_status(format!("Exported to {}", path.display())),
            Err(e) => {
                warn!(error = %e, "export failed");
                self.set_status(format!("Export failed: {e}"));
            }
        }
    }

    pub fn import_from(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            self.set_status("Import cancelled");
            return;
        }
        match self.store.import_file(path) {
            Ok(summary) => {
                self.pending_move = None;
                self.tag_cursor = None;
                self.clamp_selection();
                self.set_status(summary.describe());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "import rejected");
                self.set_status(e.to_string());
            }
        }
    }

    // ── Weather ──

    pub fn set_city(&mut self, city: &str) {
        if city.is_empty() || city == self.weather_city() {
            return;
        }
        let mut settings = self.store.settings().clone();
        settings.weather_city = city.to_string();
        self.store.update_settings(settings);
        self.weather.clear();
        if let Some(refresher) = &mut self.refresher {
            refresher.set_city(city);
        }
        info!(city, "weather city set");
        self.set_status(format!("Weather city: {city}"));
    }

    pub fn refresh_weather(&mut self) {
        match &self.refresher {
            Some(refresher) if self.weather_configured => {
                refresher.refresh();
                self.set_status("Refreshing weather...");
            }
            _ => self.set_status("Weather is not configured"),
        }
    }

    /// Follow the wall clock across midnight. A selection sitting on the old
    /// today moves along with it.
    pub fn sync_today(&mut self, now: NaiveDate) {
        if now == self.today {
            return;
        }
        info!(from = %self.today, to = %now, "date rolled over");
        if self.selected_date == self.today {
            self.selected_date = now;
        }
        self.today = now;
        self.on_date_changed();
    }

    /// Drain updates from the background refresher.
    pub fn poll_weather(&mut self) {
        let mut updates = Vec::new();
        if let Some(refresher) = &mut self.refresher {
            while let Some(update) = refresher.try_next() {
                updates.push(update);
            }
        }
        for update in updates {
            self.apply_weather_update(update);
        }
    }

    pub fn apply_weather_update(&mut self, update: WeatherUpdate) {
        match update {
            WeatherUpdate::Forecast { city, samples, .. } => {
                if city == self.weather_city() {
                    self.weather = samples;
                }
            }
            WeatherUpdate::Day { city, key, sample } => {
                if city != self.weather_city() {
                    return;
                }
                match sample {
                    Some(sample) => {
                        self.weather.insert(key, sample);
                    }
                    None => {
                        self.weather.remove(&key);
                    }
                }
            }
            WeatherUpdate::Unconfigured => {
                self.weather_configured = false;
                self.weather.clear();
            }
        }
    }

    /// What the status bar shows about weather.
    pub fn weather_status(&self) -> String {
        if !self.store.settings().show_weather {
            String::new()
        } else if !self.weather_configured {
            "weather: no API key".to_string()
        } else {
            format!("{} ({}d)", self.weather_city(), self.weather.len())
        }
    }

    /// Shown in the day panel when the day is in range but has no sample.
    pub fn weather_note(&self) -> Option<&'static str> {
        if !self.store.settings().show_weather || !is_in_weather_range(self.selected_date, self.today) {
            return None;
        }
        if !self.weather_configured {
            Some("Weather unavailable: no API key configured")
        } else if self.weather.contains_key(&self.selected_key()) {
            None
        } else {
            Some("No forecast for this day yet")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use daygrid::calendar::{Category, EventDraft};
    use daygrid::storage::{MemoryStorage, StorageKey};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app_on(today: NaiveDate) -> (App, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = Store::load(Box::new(storage.clone()));
        (App::new(store, PathBuf::from("."), today), storage)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            match app.input_mode {
                InputMode::Form => app.form_mut().unwrap().input_char(c),
                InputMode::Prompt(_) => app.prompt_input(c),
                InputMode::Normal => panic!("not typing"),
            }
        }
    }

    #[test]
    fn test_month_navigation_clamps_day() {
        let (mut app, _) = app_on(date(2024, 1, 31));
        app.next_month();
        assert_eq!(app.selected_date, date(2024, 2, 29));
        app.prev_month();
        assert_eq!(app.selected_date, date(2024, 1, 29));
        app.prev_week();
        assert_eq!(app.selected_date, date(2024, 1, 22));
        app.next_day();
        assert_eq!(app.selected_date, date(2024, 1, 23));
    }

    #[test]
    fn test_form_adds_event() {
        let (mut app, storage) = app_on(date(2024, 3, 5));
        app.open_new_form();
        type_str(&mut app, "Standup");
        app.form_next_field();
        app.form_next_field();
        app.form_space();
        app.form_space();
        app.form_space();
        app.form_next_field();
        type_str(&mut app, "team, daily");
        app.submit_form();

        assert_eq!(app.input_mode, InputMode::Normal);
        let events = app.day_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Standup");
        assert_eq!(events[0].category, Category::Meeting);
        assert_eq!(events[0].tags, vec!["team", "daily"]);
        assert!(storage.get(StorageKey::Events).unwrap().contains("Standup"));
    }

    #[test]
    fn test_blank_title_keeps_form_open() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        app.open_new_form();
        type_str(&mut app, "   ");
        app.submit_form();

        assert_eq!(app.input_mode, InputMode::Form);
        assert!(app.status_message.is_some());
        assert_eq!(app.store.total_events(), 0);
    }

    #[test]
    fn test_edit_selected_event() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        app.store
            .add(app.selected_key(), EventDraft::new("Draft", Category::Work))
            .unwrap();

        app.open_edit_form();
        let form = app.form_mut().unwrap();
        form.title = "Final".into();
        app.submit_form();

        let events = app.day_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Final");
    }

    #[test]
    fn test_pick_up_and_drop_moves_event() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        let monday = app.selected_key();
        app.store
            .add(monday, EventDraft::new("Standup", Category::Meeting).tags(["team"]))
            .unwrap();

        app.pick_up_selected();
        app.next_day();
        app.drop_pending();

        assert!(!app.store.contains_day(monday));
        assert_eq!(app.day_events()[0].title, "Standup");
        assert!(app.pending_move.is_none());

        app.drop_pending();
        assert!(app.status_message.as_deref().unwrap().starts_with("Nothing to move"));
    }

    #[test]
    fn test_delete_clamps_selection() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        let key = app.selected_key();
        app.store.add(key, EventDraft::new("A", Category::Work)).unwrap();
        app.store.add(key, EventDraft::new("B", Category::Work)).unwrap();

        app.select_next_event();
        app.select_next_event();
        assert_eq!(app.selected_event, 1);
        app.delete_selected();
        assert_eq!(app.selected_event, 0);
        assert_eq!(app.day_events()[0].title, "A");
    }

    #[test]
    fn test_search_prompt_filters_live_and_escape_clears() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        let key = app.selected_key();
        app.store.add(key, EventDraft::new("Dentist", Category::Personal)).unwrap();
        app.store.add(key, EventDraft::new("Design review", Category::Work)).unwrap();

        app.open_prompt(PromptKind::Search);
        type_str(&mut app, "dent");
        assert_eq!(app.day_events().len(), 1);

        app.cancel_prompt();
        assert_eq!(app.day_events().len(), 2);

        app.open_prompt(PromptKind::Search);
        type_str(&mut app, "review");
        app.submit_prompt();
        assert_eq!(app.filters.search_query, "review");
        assert_eq!(app.visible_count(), 1);
    }

    #[test]
    fn test_tag_cursor_toggle_and_clear() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        let key = app.selected_key();
        app.store
            .add(key, EventDraft::new("Gym", Category::Personal).tags(["health"]))
            .unwrap();
        app.store
            .add(key, EventDraft::new("Sync", Category::Meeting).tags(["team"]))
            .unwrap();

        app.toggle_tag_at_cursor();
        assert!(app.filters.selected_tags.is_empty());

        // Registry order is alphabetical: health, team
        app.next_tag_cursor();
        app.next_tag_cursor();
        app.toggle_tag_at_cursor();
        assert_eq!(app.filters.selected_tags, vec!["team"]);
        assert_eq!(app.day_events()[0].title, "Sync");

        app.next_tag_cursor();
        assert_eq!(app.tag_cursor, None);

        app.cycle_category();
        app.clear_filters();
        assert!(!app.filters.has_active_filters());
        assert_eq!(app.day_events().len(), 2);
    }

    #[test]
    fn test_export_then_import_through_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MemoryStorage::new();
        let mut store = Store::load(Box::new(storage));
        store
            .add("2024-03-05".parse().unwrap(), EventDraft::new("Report", Category::Deadline))
            .unwrap();
        let mut app = App::new(store, dir.path().to_path_buf(), date(2024, 3, 5));

        app.export();
        let path = dir.path().join("calendar-events-2024-03-05.json");
        assert!(path.exists());

        let (mut other, _) = app_on(date(2024, 3, 5));
        other.open_prompt(PromptKind::Import);
        type_str(&mut other, &path.display().to_string());
        other.submit_prompt();
        assert_eq!(other.store.total_events(), 1);
        assert_eq!(other.status_message.as_deref(), Some("Imported 1 event"));
    }

    #[test]
    fn test_bad_import_reports_and_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let (mut app, _) = app_on(date(2024, 3, 5));
        app.store
            .add(app.selected_key(), EventDraft::new("Keep", Category::Other))
            .unwrap();
        app.import_from(&path);

        assert_eq!(app.store.total_events(), 1);
        assert!(app.status_message.as_deref().unwrap().contains("Invalid JSON"));
    }

    #[test]
    fn test_city_prompt_updates_settings() {
        let (mut app, storage) = app_on(date(2024, 3, 5));
        app.weather.insert(app.selected_key(), sample(10));

        app.open_prompt(PromptKind::City);
        assert_eq!(app.prompt_buffer, "London");
        app.prompt_buffer.clear();
        type_str(&mut app, "Oslo");
        app.submit_prompt();

        assert_eq!(app.weather_city(), "Oslo");
        assert!(app.weather.is_empty());
        assert!(storage.get(StorageKey::Settings).unwrap().contains("Oslo"));
    }

    fn sample(temp: i32) -> WeatherSample {
        WeatherSample {
            temp,
            temp_min: temp,
            temp_max: temp,
            feels_like: temp,
            condition: "Clear".into(),
            description: "clear sky".into(),
            icon: "☀️".into(),
            humidity: 30,
            wind_speed: 1,
            hour: 12,
        }
    }

    #[test]
    fn test_weather_updates() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        let key = app.selected_key();
        assert_eq!(app.weather_note(), Some("No forecast for this day yet"));

        let mut samples = BTreeMap::new();
        samples.insert(key, sample(12));
        app.apply_weather_update(WeatherUpdate::Forecast {
            generation: 1,
            city: "London".into(),
            samples: samples.clone(),
        });
        assert_eq!(app.weather[&key].temp, 12);
        assert_eq!(app.weather_note(), None);

        // A forecast for a city we've since left is ignored
        app.apply_weather_update(WeatherUpdate::Forecast {
            generation: 2,
            city: "Paris".into(),
            samples: BTreeMap::new(),
        });
        assert_eq!(app.weather.len(), 1);

        app.apply_weather_update(WeatherUpdate::Day {
            city: "Paris".into(),
            key,
            sample: None,
        });
        assert_eq!(app.weather.len(), 1);

        app.apply_weather_update(WeatherUpdate::Day {
            city: "London".into(),
            key,
            sample: None,
        });
        assert!(app.weather.is_empty());

        app.apply_weather_update(WeatherUpdate::Unconfigured);
        assert!(!app.weather_configured);
        assert_eq!(app.weather_status(), "weather: no API key");
        assert_eq!(
            app.weather_note(),
            Some("Weather unavailable: no API key configured")
        );
    }

    #[test]
    fn test_weather_note_outside_range() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        app.next_week();
        assert_eq!(app.weather_note(), None);
    }

    #[test]
    fn test_drop_on_same_day_keeps_move_pending() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        app.store
            .add(app.selected_key(), EventDraft::new("Standup", Category::Meeting))
            .unwrap();

        app.pick_up_selected();
        app.drop_pending();

        let msg = app.status_message.as_deref().unwrap();
        assert!(msg.contains("already on 2024-03-05"), "{msg}");
        assert!(app.pending_move.is_some());

        app.next_day();
        app.drop_pending();
        assert_eq!(app.day_events()[0].title, "Standup");
    }

    #[test]
    fn test_sync_today_rolls_over_midnight() {
        let (mut app, _) = app_on(date(2024, 3, 5));
        app.sync_today(date(2024, 3, 6));
        assert_eq!(app.today, date(2024, 3, 6));
        assert_eq!(app.selected_date, date(2024, 3, 6));

        // A day picked by the user stays put
        app.prev_week();
        app.sync_today(date(2024, 3, 7));
        assert_eq!(app.today, date(2024, 3, 7));
        assert_eq!(app.selected_date, date(2024, 2, 28));
    }
}
