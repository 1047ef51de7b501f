use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Work,
    Personal,
    Important,
    Meeting,
    Deadline,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Important,
        Category::Meeting,
        Category::Deadline,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Important => "important",
            Category::Meeting => "meeting",
            Category::Deadline => "deadline",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Important => "Important",
            Category::Meeting => "Meeting",
            Category::Deadline => "Deadline",
            Category::Other => "Other",
        }
    }

    /// The category after this one, wrapping around.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CalendarError::Validation(format!("Invalid event category '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Apply the same cleanup a new event gets, for events that arrive from
    /// outside (imports). Fails on a blank title.
    pub(crate) fn sanitized(self) -> CalendarResult<Event> {
        Ok(Event {
            title: sanitize_title(&self.title)?,
            description: self.description.trim().to_string(),
            tags: normalize_tags(&self.tags),
            ..self
        })
    }
}

/// Fields supplied when creating an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and sanitize into a new event stamped with `now`.
    pub(crate) fn into_event(self, id: String, now: DateTime<Utc>) -> CalendarResult<Event> {
        let title = sanitize_title(&self.title)?;
        Ok(Event {
            id,
            title,
            description: self.description.trim().to_string(),
            category: self.category,
            tags: normalize_tags(self.tags),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
}

impl EventPatch {
    /// Produce the patched event without touching `event`.
    pub(crate) fn apply_to(&self, event: &Event, now: DateTime<Utc>) -> CalendarResult<Event> {
        let title = match &self.title {
            Some(title) => sanitize_title(title)?,
            None => event.title.clone(),
        };
        let description = self
            .description
            .as_deref()
            .unwrap_or(&event.description)
            .trim()
            .to_string();
        let tags = match &self.tags {
            Some(tags) => normalize_tags(tags.clone()),
            None => event.tags.clone(),
        };

        Ok(Event {
            id: event.id.clone(),
            title,
            description,
            category: self.category.unwrap_or(event.category),
            tags,
            created_at: event.created_at,
            updated_at: now,
        })
    }
}

fn sanitize_title(title: &str) -> CalendarResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CalendarError::Validation("Event title is required".into()));
    }
    Ok(title.to_string())
}

/// Normalize a single tag: trimmed and lowercased. Empty means "no tag".
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Normalize tags, dropping empties and duplicates while keeping entry order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if let Some(tag) = normalize_tag(tag.as_ref()) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
    }
    out
}

/// Split comma-separated tag input as typed into the event form.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}
