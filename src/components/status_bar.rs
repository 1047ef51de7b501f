use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use daygrid::theme;

pub struct StatusBar<'a> {
    pub mode: &'a str,
    pub message: Option<&'a str>,
    /// Shown in the warning style ahead of everything else.
    pub warning: Option<&'a str>,
    pub weather: &'a str,
}

impl StatusBar<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let t = theme::current();
        let w = area.width as usize;

        let right = match self.message {
            Some(msg) => format!(" {msg} "),
            None => hints(w).to_string(),
        };

        let left = format!(" {} ", self.mode);
        let warning = self.warning.map(|msg| format!(" {msg} ")).unwrap_or_default();
        let weather = format!(" {} ", self.weather);

        let used = left.chars().count()
            + warning.chars().count()
            + weather.chars().count()
            + right.chars().count();
        let padding = " ".repeat(w.saturating_sub(used));

        let line = Line::from(vec![
            Span::styled(left, t.status),
            Span::styled(warning, t.status.patch(t.warning)),
            Span::styled(weather, t.status),
            Span::styled(padding, t.status),
            Span::styled(right, t.status),
        ]);

        frame.render_widget(Paragraph::new(line).style(t.status), area);
    }
}

fn hints(width: usize) -> &'static str {
    if width >= 110 {
        " hl/HL/[]:Move jk:Select n:New Enter:Edit d:Del m/p:Move /:Search c:Cat ?:Help q:Quit"
    } else if width >= 70 {
        " hjkl:Nav n:New Enter:Edit d:Del /:Search ?:Help q:Quit"
    } else if width >= 40 {
        " n:New /:Search ?:Help q:Quit"
    } else {
        " ?:Help q:Quit"
    }
}
