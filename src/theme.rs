use std::collections::BTreeMap;
use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use tracing::warn;

use crate::calendar::Category;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme for this run. Only the first call has any effect.
pub fn init(theme: Theme) {
    if THEME.set(theme).is_err() {
        warn!("theme already initialised");
    }
}

/// The active theme, or the default preset if `init` was never called.
pub fn current() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub highlight: Style,
    pub weather: Style,
    pub warning: Style,
    /// Work, personal, important, meeting, deadline, other
    pub categories: [Color; 6],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Yellow),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            highlight: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            weather: Style::default().fg(Color::LightBlue),
            warning: Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            categories: [
                Color::Blue,
                Color::Green,
                Color::LightRed,
                Color::Magenta,
                Color::Red,
                Color::Gray,
            ],
        }
    }
}

impl Theme {
    /// Built-in preset by name; unknown names fall back to the default.
    pub fn preset(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dracula" => Self::dracula(),
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            _ => Self::default(),
        }
    }

    pub fn category(&self, category: Category) -> Style {
        let idx = Category::ALL.iter().position(|c| *c == category).unwrap_or(Category::ALL.len() - 1);
        Style::default().fg(self.categories[idx])
    }

    fn light() -> Self {
        Self {
            name: "light".to_string(),
            today: Style::default().fg(Color::White).bg(Color::Rgb(217, 119, 6)),
            selected: Style::default().fg(Color::White).bg(Color::Rgb(37, 99, 235)),
            header: Style::default().fg(Color::Rgb(17, 24, 39)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(156, 163, 175)),
            border: Style::default().fg(Color::Rgb(209, 213, 219)),
            status: Style::default()
                .fg(Color::Rgb(17, 24, 39))
                .bg(Color::Rgb(229, 231, 235)),
            highlight: Style::default()
                .bg(Color::Rgb(219, 234, 254))
                .add_modifier(Modifier::BOLD),
            weather: Style::default().fg(Color::Rgb(14, 116, 144)),
            warning: Style::default().fg(Color::Rgb(185, 28, 28)).add_modifier(Modifier::BOLD),
            categories: [
                Color::Rgb(59, 130, 246),
                Color::Rgb(16, 185, 129),
                Color::Rgb(249, 115, 22),
                Color::Rgb(139, 92, 246),
                Color::Rgb(239, 68, 68),
                Color::Rgb(107, 114, 128),
            ],
        }
    }

    fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(189, 147, 249)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(139, 233, 253)),
            header: Style::default().fg(Color::Rgb(248, 248, 242)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(98, 114, 164)),
            border: Style::default().fg(Color::Rgb(68, 71, 90)),
            status: Style::default()
                .fg(Color::Rgb(248, 248, 242))
                .bg(Color::Rgb(68, 71, 90)),
            highlight: Style::default()
                .bg(Color::Rgb(68, 71, 90))
                .add_modifier(Modifier::BOLD),
            weather: Style::default().fg(Color::Rgb(139, 233, 253)),
            warning: Style::default().fg(Color::Rgb(255, 85, 85)).add_modifier(Modifier::BOLD),
            categories: [
                Color::Rgb(139, 233, 253),
                Color::Rgb(80, 250, 123),
                Color::Rgb(255, 184, 108),
                Color::Rgb(189, 147, 249),
                Color::Rgb(255, 85, 85),
                Color::Rgb(98, 114, 164),
            ],
        }
    }

    fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(250, 189, 47)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(131, 165, 152)),
            header: Style::default().fg(Color::Rgb(235, 219, 178)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(146, 131, 116)),
            border: Style::default().fg(Color::Rgb(102, 92, 84)),
            status: Style::default()
                .fg(Color::Rgb(235, 219, 178))
                .bg(Color::Rgb(80, 73, 69)),
            highlight: Style::default()
                .bg(Color::Rgb(80, 73, 69))
                .add_modifier(Modifier::BOLD),
            weather: Style::default().fg(Color::Rgb(131, 165, 152)),
            warning: Style::default().fg(Color::Rgb(251, 73, 52)).add_modifier(Modifier::BOLD),
            categories: [
                Color::Rgb(131, 165, 152),
                Color::Rgb(184, 187, 38),
                Color::Rgb(254, 128, 25),
                Color::Rgb(211, 134, 155),
                Color::Rgb(251, 73, 52),
                Color::Rgb(146, 131, 116),
            ],
        }
    }

    fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(235, 203, 139)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(136, 192, 208)),
            header: Style::default().fg(Color::Rgb(229, 233, 240)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(76, 86, 106)),
            border: Style::default().fg(Color::Rgb(67, 76, 94)),
            status: Style::default()
                .fg(Color::Rgb(229, 233, 240))
                .bg(Color::Rgb(67, 76, 94)),
            highlight: Style::default()
                .bg(Color::Rgb(67, 76, 94))
                .add_modifier(Modifier::BOLD),
            weather: Style::default().fg(Color::Rgb(129, 161, 193)),
            warning: Style::default().fg(Color::Rgb(191, 97, 106)).add_modifier(Modifier::BOLD),
            categories: [
                Color::Rgb(129, 161, 193),
                Color::Rgb(163, 190, 140),
                Color::Rgb(208, 135, 112),
                Color::Rgb(180, 142, 173),
                Color::Rgb(191, 97, 106),
                Color::Rgb(216, 222, 233),
            ],
        }
    }
}

// ── [theme] section of config.toml ──

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeConfig {
    pub preset: Option<String>,
    pub today_fg: Option<String>,
    pub today_bg: Option<String>,
    pub selected_fg: Option<String>,
    pub selected_bg: Option<String>,
    pub header_fg: Option<String>,
    pub dim_fg: Option<String>,
    pub border_fg: Option<String>,
    pub status_fg: Option<String>,
    pub status_bg: Option<String>,
    pub highlight_bg: Option<String>,
    pub weather_fg: Option<String>,
    /// Category name to color, e.g. `deadline = "#ff5555"`.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

impl ThemeConfig {
    /// Build the theme. `fallback_preset` (the stored light/dark preference)
    /// applies when the file names no preset.
    pub fn to_theme(&self, fallback_preset: &str) -> Theme {
        let mut theme = Theme::preset(self.preset.as_deref().unwrap_or(fallback_preset));

        let color = |value: &Option<String>| value.as_deref().and_then(parse_color);

        if let Some(c) = color(&self.today_fg) {
            theme.today = theme.today.fg(c);
        }
        if let Some(c) = color(&self.today_bg) {
            theme.today = theme.today.bg(c);
        }
        if let Some(c) = color(&self.selected_fg) {
            theme.selected = theme.selected.fg(c);
        }
        if let Some(c) = color(&self.selected_bg) {
            theme.selected = theme.selected.bg(c);
        }
        if let Some(c) = color(&self.header_fg) {
            theme.header = theme.header.fg(c);
        }
        if let Some(c) = color(&self.dim_fg) {
            theme.dim = theme.dim.fg(c);
        }
        if let Some(c) = color(&self.border_fg) {
            theme.border = theme.border.fg(c);
        }
        if let Some(c) = color(&self.status_fg) {
            theme.status = theme.status.fg(c);
        }
        if let Some(c) = color(&self.status_bg) {
            theme.status = theme.status.bg(c);
        }
        if let Some(c) = color(&self.highlight_bg) {
            theme.highlight = theme.highlight.bg(c);
        }
        if let Some(c) = color(&self.weather_fg) {
            theme.weather = theme.weather.fg(c);
        }

        for (name, value) in &self.categories {
            let parsed = name.parse::<Category>().ok().zip(parse_color(value));
            match parsed {
                Some((category, c)) => {
                    if let Some(idx) = Category::ALL.iter().position(|x| *x == category) {
                        theme.categories[idx] = c;
                    }
                }
                None => warn!(category = %name, color = %value, "ignoring theme override"),
            }
        }

        theme
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color(" Grey "), Some(Color::Gray));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn test_preset_resolution() {
        let empty = ThemeConfig::default();
        assert_eq!(empty.to_theme("light").name, "light");
        assert_eq!(empty.to_theme("dark").name, "default");

        let nord = ThemeConfig {
            preset: Some("nord".into()),
            ..Default::default()
        };
        assert_eq!(nord.to_theme("light").name, "nord");
    }

    #[test]
    fn test_overrides_apply_on_top_of_preset() {
        let mut config = ThemeConfig {
            preset: Some("gruvbox".into()),
            today_bg: Some("#010203".into()),
            ..Default::default()
        };
        config.categories.insert("deadline".into(), "white".into());
        config.categories.insert("holiday".into(), "red".into());

        let theme = config.to_theme("light");
        assert_eq!(theme.today.bg, Some(Color::Rgb(1, 2, 3)));
        assert_eq!(theme.category(Category::Deadline).fg, Some(Color::White));
        assert_eq!(
            theme.category(Category::Work).fg,
            Theme::preset("gruvbox").category(Category::Work).fg
        );
    }
}
