use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use daygrid::calendar::event::parse_tag_list;
use daygrid::calendar::{Category, DateKey, Event, EventDraft, EventPatch, TagRegistry};
use daygrid::theme;

const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Description,
    Category,
    Tags,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Category,
            FormField::Category => FormField::Tags,
            FormField::Tags => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Tags,
            FormField::Description => FormField::Title,
            FormField::Category => FormField::Description,
            FormField::Tags => FormField::Category,
        }
    }
}

/// Contents of the new/edit event popup.
#[derive(Debug, Clone)]
pub struct EventFormState {
    pub date: DateKey,
    pub title: String,
    pub description: String,
    pub category: Category,
    /// Comma separated, as typed.
    pub tags: String,
    pub active_field: FormField,
    /// Id of the event being edited; `None` for a new event.
    pub editing: Option<String>,
}

impl EventFormState {
    pub fn new(date: DateKey) -> Self {
        Self {
            date,
            title: String::new(),
            description: String::new(),
            category: Category::default(),
            tags: String::new(),
            active_field: FormField::Title,
            editing: None,
        }
    }

    pub fn edit(date: DateKey, event: &Event) -> Self {
        Self {
            date,
            title: event.title.clone(),
            description: event.description.clone(),
            category: event.category,
            tags: event.tags.join(", "),
            active_field: FormField::Title,
            editing: Some(event.id.clone()),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::Tags => self.tags.push(c),
            FormField::Category => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Description => {
                self.description.pop();
            }
            FormField::Tags => {
                self.tags.pop();
            }
            FormField::Category => {}
        }
    }

    pub fn cycle_category(&mut self) {
        self.category = self.category.next();
    }

    /// The tag currently being typed (text after the last comma).
    pub fn tag_fragment(&self) -> &str {
        self.tags.rsplit(',').next().unwrap_or("").trim()
    }

    /// Registry tags matching the fragment, minus those already entered.
    pub fn suggestions<'a>(&self, registry: &'a TagRegistry) -> Vec<&'a str> {
        let fragment = self.tag_fragment().to_lowercase();
        if fragment.is_empty() {
            return Vec::new();
        }
        let entered = parse_tag_list(&self.tags);
        let mut found = registry.suggestions(&fragment, &entered);
        found.truncate(MAX_SUGGESTIONS);
        found
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft::new(self.title.clone(), self.category)
            .description(self.description.clone())
            .tags(parse_tag_list(&self.tags))
    }

    pub fn to_patch(&self) -> EventPatch {
        EventPatch {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            category: Some(self.category),
            tags: Some(parse_tag_list(&self.tags)),
        }
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState, registry: &TagRegistry) {
        let t = theme::current();

        let form_w = area.width.clamp(30, 56);
        let form_h = area.height.clamp(10, 12);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h).intersection(area);

        frame.render_widget(Clear, form_area);

        let title = if state.is_editing() {
            format!(" Edit Event \u{00b7} {} ", state.date)
        } else {
            format!(" New Event \u{00b7} {} ", state.date)
        };
        let block = Block::default()
            .title(title)
            .title_style(t.header)
            .borders(Borders::ALL)
            .border_style(t.selected.bg.map_or(t.border, |c| Style::default().fg(c)));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // description
            Constraint::Length(1), // category
            Constraint::Length(1), // tags
            Constraint::Length(1), // suggestions
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        let active = state.active_field;
        render_field(frame, rows[0], "Title:", &state.title, active == FormField::Title);
        render_field(frame, rows[1], "Notes:", &state.description, active == FormField::Description);

        let category = Line::from(vec![
            Span::styled(format!("{:<7}", "Type:"), t.dim),
            Span::styled("\u{25a0} ", t.category(state.category)),
            Span::styled(
                state.category.label(),
                if active == FormField::Category {
                    t.selected
                } else {
                    Style::default()
                },
            ),
        ]);
        frame.render_widget(Paragraph::new(category), rows[2]);

        render_field(frame, rows[3], "Tags:", &state.tags, active == FormField::Tags);

        if active == FormField::Tags {
            let suggestions = state.suggestions(registry);
            if !suggestions.is_empty() {
                let mut spans = vec![Span::styled(format!("{:<7}", ""), t.dim)];
                for tag in suggestions {
                    spans.push(Span::styled(format!("#{tag} "), t.dim));
                }
                frame.render_widget(Paragraph::new(Line::from(spans)), rows[4]);
            }
        }

        let key = Style::default().add_modifier(Modifier::BOLD);
        let help = Line::from(vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", t.dim),
            Span::styled("Space", key),
            Span::styled(":Type ", t.dim),
            Span::styled("Enter", key),
            Span::styled(":Save ", t.dim),
            Span::styled("Esc", key),
            Span::styled(":Cancel", t.dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[6]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let t = theme::current();
    let cursor = if active { "_" } else { "" };
    let style = if active {
        t.selected.bg.map_or(Style::default(), |c| Style::default().fg(c))
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled(format!("{label:<7}"), t.dim),
        Span::styled(format!("{value}{cursor}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> DateKey {
        "2024-03-05".parse().unwrap()
    }

    #[test]
    fn test_field_cycle() {
        let mut field = FormField::Title;
        for _ in 0..4 {
            field = field.next();
        }
        assert_eq!(field, FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::Tags);
    }

    #[test]
    fn test_typing_goes_to_active_field() {
        let mut form = EventFormState::new(key());
        "Lunch".chars().for_each(|c| form.input_char(c));
        form.active_field = FormField::Category;
        form.input_char('x');
        form.cycle_category();
        form.active_field = FormField::Tags;
        "food, Team".chars().for_each(|c| form.input_char(c));
        form.backspace();

        let draft = form.to_draft();
        assert_eq!(draft.title, "Lunch");
        assert_eq!(draft.category, Category::Personal);
        assert_eq!(draft.tags, vec!["food", "tea"]);
    }

    #[test]
    fn test_suggestions_for_last_fragment() {
        let registry: TagRegistry = ["team", "teaching", "travel"].iter().map(|s| s.to_string()).collect();
        let mut form = EventFormState::new(key());
        form.tags = "team, TEA".into();

        assert_eq!(form.tag_fragment(), "TEA");
        assert_eq!(form.suggestions(&registry), vec!["teaching"]);

        form.tags = "team, ".into();
        assert!(form.suggestions(&registry).is_empty());
    }

    #[test]
    fn test_edit_prefills_and_builds_patch() {
        let now = chrono::Utc::now();
        let event = Event {
            id: "e1".into(),
            title: "Review".into(),
            description: "slides".into(),
            category: Category::Meeting,
            tags: vec!["team".into(), "q3".into()],
            created_at: now,
            updated_at: now,
        };
        let form = EventFormState::edit(key(), &event);
        assert!(form.is_editing());
        assert_eq!(form.tags, "team, q3");

        let patch = form.to_patch();
        assert_eq!(patch.category, Some(Category::Meeting));
        assert_eq!(patch.tags, Some(vec!["team".to_string(), "q3".to_string()]));
    }
}
