mod app;
mod components;
mod input;
mod tui;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use app::{App, InputMode, PromptKind};
use chrono::Local;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::Frame;
use tracing::info;

use daygrid::calendar::Store;
use daygrid::config::AppConfig;
use daygrid::storage::{FileStorage, Settings};
use daygrid::weather::{OpenWeatherClient, SystemClock, WeatherRefresher, WeatherService};
use daygrid::{logging, theme};

use crate::components::{DayPanel, DayView, EventForm, FilterBar, MonthGrid, MonthView, StatusBar};

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = AppConfig::load()?;
    let data_dir = config.storage.data_dir()?;
    let log_path = logging::init(&data_dir)?;
    info!(log = %log_path.display(), data = %data_dir.display(), "starting daygrid");

    let mut store = Store::load(Box::new(FileStorage::new(&data_dir)?));
    seed_default_city(&mut store, config.weather.default_city.as_deref());
    theme::init(config.theme.to_theme(&store.settings().theme));

    // Background weather work runs on the runtime; the UI loop stays on this thread
    let runtime = tokio::runtime::Runtime::new()?;
    let _runtime_guard = runtime.enter();

    let mut app = App::new(store, config.storage.export_dir(), Local::now().date_naive());

    if app.store.settings().show_weather {
        let client = OpenWeatherClient::from_config(&config.weather)?;
        let service = WeatherService::new(Arc::new(client), Arc::new(SystemClock))
            .with_ttl(chrono::Duration::minutes(config.weather.cache_minutes));
        let interval = Duration::from_secs(config.weather.refresh_minutes.max(1) * 60);
        let refresher = WeatherRefresher::spawn(Arc::new(service), app.weather_city(), interval);
        app.attach_weather(refresher);
    }

    let result = {
        let mut session = tui::TerminalSession::enter()?;
        run(session.terminal(), &mut app)
    };

    if let Some(mut refresher) = app.take_refresher() {
        runtime.block_on(refresher.stop());
    }
    info!("daygrid exited");
    result
}

/// A configured default city replaces the built-in one, never a city the
/// user picked.
fn seed_default_city(store: &mut Store, city: Option<&str>) {
    let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) else {
        return;
    };
    if store.settings().weather_city == Settings::default().weather_city {
        let mut settings = store.settings().clone();
        settings.weather_city = city.to_string();
        store.update_settings(settings);
    }
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.sync_today(Local::now().date_naive());
        app.poll_weather();
        terminal.draw(|frame| render(frame, app))?;

        if let Some(key) = input::next_key_press(Duration::from_millis(200))? {
            handle_key(app, key);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => {
            app.status_message = None;
            handle_normal_input(app, key.code, key.modifiers);
        }
        InputMode::Form => handle_form_input(app, key.code),
        InputMode::Prompt(_) => handle_prompt_input(app, key.code),
    }
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Char('H'), _) => app.prev_week(),
        (KeyCode::Char('L'), _) => app.next_week(),
        (KeyCode::Char('['), _) => app.prev_month(),
        (KeyCode::Char(']'), _) => app.next_month(),
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.select_next_event(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.select_prev_event(),
        (KeyCode::Char('n'), _) => app.open_new_form(),
        (KeyCode::Enter, _) => app.open_edit_form(),
        (KeyCode::Char('d'), _) => app.delete_selected(),
        (KeyCode::Char('m'), _) => app.pick_up_selected(),
        (KeyCode::Char('p'), _) => app.drop_pending(),
        (KeyCode::Esc, _) => app.cancel(),
        (KeyCode::Char('/'), _) => app.open_prompt(PromptKind::Search),
        (KeyCode::Char('c'), _) => app.cycle_category(),
        (KeyCode::Char('T'), _) => app.next_tag_cursor(),
        (KeyCode::Char('g'), _) => app.toggle_tag_at_cursor(),
        (KeyCode::Char('x'), _) => app.clear_filters(),
        (KeyCode::Char('w'), _) => app.refresh_weather(),
        (KeyCode::Char('C'), _) => app.open_prompt(PromptKind::City),
        (KeyCode::Char('e'), _) => app.export(),
        (KeyCode::Char('i'), _) => app.open_prompt(PromptKind::Import),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => app.form_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form_prev_field(),
        KeyCode::Char(' ') => app.form_space(),
        KeyCode::Backspace => {
            if let Some(form) = app.form_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.form_mut() {
                form.input_char(c);
            }
        }
        _ => {}
    }
}

fn handle_prompt_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => app.prompt_backspace(),
        KeyCode::Char(c) => app.prompt_input(c),
        _ => {}
    }
}

fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(area);

    let visible = app.visible_events();
    let total = app.store.total_events();
    FilterBar {
        filters: &app.filters,
        tags: app.store.tags(),
        tag_cursor: app.tag_cursor,
        searching: app.input_mode == InputMode::Prompt(PromptKind::Search),
        shown: app.visible_count(),
        total,
    }
    .render(frame, layout[0]);

    let empty = BTreeMap::new();
    let weather = if app.store.settings().show_weather { &app.weather } else { &empty };
    let grid = MonthGrid {
        selected: app.selected_date,
        today: app.today,
        events: &visible,
        weather,
        move_source: app.pending_move.as_ref().map(|m| m.from),
    };
    let day_events = app.day_events();
    let panel = DayPanel {
        date: app.selected_date,
        events: &day_events,
        selected: app.selected_event,
        weather: weather.get(&app.selected_key()),
        weather_note: app.weather_note(),
    };

    let content = layout[1];
    if content.width >= 90 {
        let cols = Layout::horizontal([Constraint::Min(58), Constraint::Percentage(38)]).split(content);
        MonthView::render(frame, cols[0], &grid);
        DayView::render(frame, cols[1], &panel);
    } else {
        let rows = Layout::vertical([Constraint::Min(16), Constraint::Length(8)]).split(content);
        MonthView::render(frame, rows[0], &grid);
        DayView::render(frame, rows[1], &panel);
    }

    if let Some(form) = &app.form {
        EventForm::render(frame, area, form, app.store.tags());
    }

    if app.show_help {
        render_help(frame, area);
    }

    let prompt = match app.input_mode {
        InputMode::Prompt(kind) => Some(format!("{}: {}_", kind.label(), app.prompt_buffer)),
        _ => None,
    };
    let mode = match (app.input_mode, &app.pending_move) {
        (InputMode::Form, _) => "EDIT",
        (InputMode::Prompt(_), _) => "INPUT",
        (InputMode::Normal, Some(_)) => "MOVE",
        (InputMode::Normal, None) => "MONTH",
    };
    let weather_status = app.weather_status();
    StatusBar {
        mode,
        message: prompt.as_deref().or(app.status_message.as_deref()),
        warning: (!app.store.persistence_healthy()).then_some("\u{26a0} changes not saved"),
        weather: &weather_status,
    }
    .render(frame, layout[2]);
}

const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("h/l \u{2190}/\u{2192}", "Previous/next day"),
            ("H/L", "Previous/next week"),
            ("[/]", "Previous/next month"),
            ("t", "Jump to today"),
            ("j/k \u{2191}/\u{2193}", "Select event"),
        ],
    ),
    (
        "Events",
        &[
            ("n", "New event"),
            ("Enter", "Edit selected event"),
            ("d", "Delete selected event"),
            ("m / p", "Pick up / drop on selected day"),
            ("Esc", "Cancel move"),
        ],
    ),
    (
        "Filters",
        &[
            ("/", "Search title, notes, tags"),
            ("c", "Cycle category"),
            ("T / g", "Tag cursor / toggle tag"),
            ("x", "Clear filters"),
        ],
    ),
    (
        "Data",
        &[
            ("w", "Refresh weather"),
            ("C", "Change weather city"),
            ("e / i", "Export / import JSON"),
            ("q", "Quit"),
        ],
    ),
];

fn render_help(frame: &mut Frame, area: Rect) {
    use ratatui::style::Modifier;
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph};

    let t = theme::current();
    let rows: usize = HELP_SECTIONS.iter().map(|(_, keys)| keys.len() + 2).sum();
    let popup_w = area.width.clamp(30, 52);
    let popup_h = (rows as u16 + 2).min(area.height);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h).intersection(area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(t.header)
        .borders(Borders::ALL)
        .border_style(t.border);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = t.header;
    let section_style = t.header.add_modifier(Modifier::UNDERLINED);

    let mut lines = Vec::new();
    for (i, (section, keys)) in HELP_SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(*section, section_style)));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<12}"), key_style),
                Span::raw(*desc),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use daygrid::storage::MemoryStorage;

    #[test]
    fn test_default_city_only_replaces_builtin() {
        let mut store = Store::load(Box::new(MemoryStorage::new()));
        seed_default_city(&mut store, Some(" Lisbon "));
        assert_eq!(store.settings().weather_city, "Lisbon");

        seed_default_city(&mut store, Some("Porto"));
        assert_eq!(store.settings().weather_city, "Lisbon");

        let mut untouched = Store::load(Box::new(MemoryStorage::new()));
        seed_default_city(&mut untouched, Some("  "));
        assert_eq!(untouched.settings().weather_city, "London");
    }

    #[test]
    fn test_normal_keys_drive_app() {
        let storage = MemoryStorage::new();
        let store = Store::load(Box::new(storage));
        let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut app = App::new(store, std::path::PathBuf::from("."), today);

        let press = |app: &mut App, code: KeyCode| handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));

        press(&mut app, KeyCode::Char('L'));
        assert_eq!(app.selected_date, today + chrono::Duration::weeks(1));

        press(&mut app, KeyCode::Char('n'));
        for c in "Gym".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.day_events()[0].title, "Gym");

        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert!(!app.show_help);

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }
}
