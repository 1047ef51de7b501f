use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use daygrid::calendar::date_key::{calendar_days, is_in_current_month, month_title, WEEKDAY_NAMES};
use daygrid::calendar::{Category, DateKey, EventMap};
use daygrid::theme;
use daygrid::weather::WeatherSample;

/// Everything the grid needs to draw one month.
pub struct MonthGrid<'a> {
    pub selected: NaiveDate,
    pub today: NaiveDate,
    /// Already filtered.
    pub events: &'a EventMap,
    pub weather: &'a BTreeMap<DateKey, WeatherSample>,
    /// Day holding an event picked up for moving.
    pub move_source: Option<DateKey>,
}

pub struct MonthView;

impl MonthView {
    pub fn render(frame: &mut Frame, area: Rect, grid: &MonthGrid) {
        let t = theme::current();

        let block = Block::default()
            .title(format!(" {} ", month_title(grid.selected)))
            .title_style(t.header)
            .borders(Borders::ALL)
            .border_style(t.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let cell_w = (inner.width / 7).max(4) as usize;
        let days = calendar_days(grid.selected);
        let weeks: Vec<&[NaiveDate]> = days.chunks(7).collect();

        let header: Vec<Span> = WEEKDAY_NAMES
            .iter()
            .map(|d| Span::styled(format!("{:^cell_w$}", d), t.header))
            .collect();

        // Each week takes two lines: day number + weather, then event markers
        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(weeks.iter().map(|_| Constraint::Length(2)));
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        frame.render_widget(Paragraph::new(Line::from(header)), rows[0]);
        for (i, week) in weeks.iter().enumerate() {
            let top: Vec<Span> = week.iter().map(|d| day_label(grid, *d, cell_w)).collect();
            let bottom: Vec<Span> = week.iter().map(|d| marker_line(grid, *d, cell_w)).collect();
            let para = Paragraph::new(vec![Line::from(top), Line::from(bottom)]);
            frame.render_widget(para, rows[i + 1]);
        }
    }
}

fn day_label(grid: &MonthGrid, date: NaiveDate, width: usize) -> Span<'static> {
    let t = theme::current();
    let key = DateKey::new(date);

    let weather = grid
        .weather
        .get(&key)
        .map(|s| format!(" {}{}", s.icon, s.temp))
        .unwrap_or_default();
    let moving = if grid.move_source == Some(key) { "\u{21c4}" } else { "" };
    let text = format!("{:>2}{moving}{weather}", date.day());

    let style = if date == grid.selected && date == grid.today {
        t.today.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else if date == grid.selected {
        t.selected
    } else if date == grid.today {
        t.today
    } else if !is_in_current_month(date, grid.selected) {
        t.dim
    } else {
        Style::default()
    };

    Span::styled(pad(&text, width), style)
}

fn marker_line(grid: &MonthGrid, date: NaiveDate, width: usize) -> Span<'static> {
    let t = theme::current();
    let categories: Vec<Category> = grid
        .events
        .get(&DateKey::new(date))
        .map(|day| day.iter().map(|e| e.category).collect())
        .unwrap_or_default();

    if categories.is_empty() {
        return Span::raw(" ".repeat(width));
    }

    let style = if is_in_current_month(date, grid.selected) {
        t.category(dominant_category(&categories))
    } else {
        t.dim
    };
    Span::styled(pad(&marker_text(categories.len(), width), width), style)
}

/// `●●●` for up to three events, `●+N` beyond, trimmed to the cell.
pub fn marker_text(count: usize, width: usize) -> String {
    let dots = count.min(3);
    let mut text = format!("  {}", "\u{25cf}".repeat(dots));
    if count > 3 {
        text = format!("  \u{25cf}+{}", count - 1);
    }
    text.chars().take(width.saturating_sub(1)).collect()
}

/// Most frequent category; ties go to the earlier one in the category order.
pub fn dominant_category(categories: &[Category]) -> Category {
    Category::ALL
        .iter()
        .copied()
        .max_by_key(|c| {
            let count = categories.iter().filter(|x| *x == c).count();
            // Earlier categories win ties
            let rank = Category::ALL.len() - Category::ALL.iter().position(|x| x == c).unwrap_or(0);
            (count, rank)
        })
        .unwrap_or_default()
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().take(width).collect()
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_text() {
        assert_eq!(marker_text(1, 8), "  \u{25cf}");
        assert_eq!(marker_text(3, 8), "  \u{25cf}\u{25cf}\u{25cf}");
        assert_eq!(marker_text(7, 8), "  \u{25cf}+6");
        assert_eq!(marker_text(7, 4), "  \u{25cf}");
    }

    #[test]
    fn test_dominant_category() {
        use Category::*;
        assert_eq!(dominant_category(&[Meeting, Work, Meeting]), Meeting);
        assert_eq!(dominant_category(&[Deadline, Personal]), Personal);
        assert_eq!(dominant_category(&[Other]), Other);
    }

    #[test]
    fn test_pad_truncates_and_fills() {
        assert_eq!(pad("12", 5), "12   ");
        assert_eq!(pad("123456", 4), "1234");
    }
}
