use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use daygrid::calendar::Event;
use daygrid::theme;
use daygrid::weather::WeatherSample;

pub struct DayPanel<'a> {
    pub date: NaiveDate,
    /// Filtered events for `date`.
    pub events: &'a [Event],
    pub selected: usize,
    pub weather: Option<&'a WeatherSample>,
    /// Shown instead of weather when the date is inside the forecast window
    /// but no sample is available.
    pub weather_note: Option<&'a str>,
}

pub struct DayView;

impl DayView {
    pub fn render(frame: &mut Frame, area: Rect, panel: &DayPanel) {
        let t = theme::current();
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", panel.date.format("%A, %B %d, %Y"))
        } else {
            format!(" {} ", panel.date.format("%b %d"))
        };
        let n = panel.events.len();
        let count = if n == 0 {
            String::new()
        } else {
            format!(" {} event{} ", n, if n == 1 { "" } else { "s" })
        };

        let block = Block::default()
            .title(title)
            .title_style(t.header)
            .title_bottom(Line::from(Span::styled(count, t.dim)))
            .borders(Borders::ALL)
            .border_style(t.border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(inner);

        let weather_line = match (panel.weather, panel.weather_note) {
            (Some(sample), _) => Line::from(Span::styled(weather_summary(sample), t.weather)),
            (None, Some(note)) => Line::from(Span::styled(note.to_string(), t.dim)),
            (None, None) => Line::default(),
        };
        frame.render_widget(Paragraph::new(weather_line), rows[0]);

        if panel.events.is_empty() {
            let msg = Paragraph::new("No events").style(t.dim);
            frame.render_widget(msg, rows[1]);
            return;
        }

        let items: Vec<ListItem> = panel
            .events
            .iter()
            .enumerate()
            .map(|(i, ev)| format_event(ev, i == panel.selected))
            .collect();

        let list = List::new(items).highlight_style(t.highlight);
        let mut state = ListState::default().with_selected(Some(panel.selected.min(n - 1)));
        frame.render_stateful_widget(list, rows[1], &mut state);
    }
}

/// `☀️ 12°C (9°/14°) clear sky · feels 11° · 40% · 3 m/s`
pub fn weather_summary(sample: &WeatherSample) -> String {
    format!(
        "{} {}\u{00b0}C ({}\u{00b0}/{}\u{00b0}) {} \u{00b7} feels {}\u{00b0} \u{00b7} {}% \u{00b7} {} m/s",
        sample.icon,
        sample.temp,
        sample.temp_min,
        sample.temp_max,
        sample.description,
        sample.feels_like,
        sample.humidity,
        sample.wind_speed
    )
}

fn format_event(ev: &Event, expanded: bool) -> ListItem<'static> {
    let t = theme::current();

    let mut title = vec![
        Span::styled("\u{2588} ", t.category(ev.category)),
        Span::styled(ev.title.clone(), Style::default()),
        Span::styled(format!("  {}", ev.category.label()), t.dim),
    ];
    if !ev.tags.is_empty() {
        let tags: Vec<String> = ev.tags.iter().map(|tag| format!("#{tag}")).collect();
        title.push(Span::styled(format!("  {}", tags.join(" ")), t.dim));
    }

    let mut lines = vec![Line::from(title)];
    if expanded && !ev.description.is_empty() {
        for text in ev.description.lines() {
            lines.push(Line::from(Span::styled(format!("  {text}"), t.dim)));
        }
    }
    ListItem::new(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_summary() {
        let sample = WeatherSample {
            temp: 12,
            temp_min: 9,
            temp_max: 14,
            feels_like: 11,
            condition: "Clear".into(),
            description: "clear sky".into(),
            icon: "☀️".into(),
            humidity: 40,
            wind_speed: 3,
            hour: 12,
        };
        let text = weather_summary(&sample);
        assert!(text.starts_with("☀️ 12°C (9°/14°) clear sky"));
        assert!(text.ends_with("40% · 3 m/s"));
    }
}
