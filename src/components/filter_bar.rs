use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use daygrid::calendar::{CategoryFilter, FilterState, TagRegistry};
use daygrid::theme;

pub struct FilterBar<'a> {
    pub filters: &'a FilterState,
    pub tags: &'a TagRegistry,
    /// Tag under the `T`/`g` cursor.
    pub tag_cursor: Option<usize>,
    pub searching: bool,
    pub shown: usize,
    pub total: usize,
}

impl FilterBar<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let t = theme::current();

        let query_style = if self.searching { t.selected } else { Style::default() };
        let query = if self.searching {
            format!("{}_", self.filters.search_query)
        } else if self.filters.search_query.is_empty() {
            "-".to_string()
        } else {
            self.filters.search_query.clone()
        };

        let category_style = match self.filters.category {
            CategoryFilter::All => Style::default(),
            CategoryFilter::Only(c) => t.category(c).add_modifier(Modifier::BOLD),
        };

        let mut spans = vec![
            Span::styled(" / ", t.dim),
            Span::styled(query, query_style),
            Span::styled("  c ", t.dim),
            Span::styled(self.filters.category.label(), category_style),
            Span::styled("  T ", t.dim),
        ];

        if self.tags.is_empty() {
            spans.push(Span::styled("no tags", t.dim));
        }
        for (i, tag) in self.tags.iter().enumerate() {
            let on = self.filters.selected_tags.contains(tag);
            let mut style = if on {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                t.dim
            };
            if self.tag_cursor == Some(i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let mark = if on { "+" } else { "#" };
            spans.push(Span::styled(format!("{mark}{tag}"), style));
            spans.push(Span::raw(" "));
        }

        if self.filters.has_active_filters() {
            spans.push(Span::styled(
                format!("  {} of {} events  x:clear", self.shown, self.total),
                t.dim,
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
