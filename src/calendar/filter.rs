//! Search, category and tag filtering over store snapshots.
//!
//! Every function here is pure: it reads events and returns a new collection.
//! The three predicates commute, so the order they are chained in does not
//! change the result.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::event::{Category, Event};
use super::store::EventMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// All -> work -> personal -> ... -> other -> All
    pub fn next(&self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::ALL[0]),
            CategoryFilter::Only(c) if *c == Category::ALL[Category::ALL.len() - 1] => {
                CategoryFilter::All
            }
            CategoryFilter::Only(c) => CategoryFilter::Only(c.next()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(c) => c.label(),
        }
    }
}

/// Filter inputs held by the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub search_query: String,
    pub category: CategoryFilter,
    pub selected_tags: Vec<String>,
}

impl FilterState {
    pub fn has_active_filters(&self) -> bool {
        !self.search_query.trim().is_empty()
            || self.category != CategoryFilter::All
            || !self.selected_tags.is_empty()
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(idx) = self.selected_tags.iter().position(|t| t == tag) {
            self.selected_tags.remove(idx);
        } else {
            self.selected_tags.push(tag.to_string());
        }
    }

    pub fn cycle_category(&mut self) {
        self.category = self.category.next();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub fn matches_search(event: &Event, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    event.title.to_lowercase().contains(&query)
        || event.description.to_lowercase().contains(&query)
        || event.tags.iter().any(|t| t.to_lowercase().contains(&query))
}

pub fn matches_category(event: &Event, filter: CategoryFilter) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::Only(category) => event.category == category,
    }
}

pub fn matches_tags(event: &Event, selected: &[String]) -> bool {
    selected.is_empty() || event.tags.iter().any(|t| selected.contains(t))
}

pub fn filter_by_search(events: &[Event], query: &str) -> Vec<Event> {
    events
        .iter()
        .filter(|e| matches_search(e, query))
        .cloned()
        .collect()
}

pub fn filter_by_category(events: &[Event], filter: CategoryFilter) -> Vec<Event> {
    events
        .iter()
        .filter(|e| matches_category(e, filter))
        .cloned()
        .collect()
}

pub fn filter_by_tags(events: &[Event], selected: &[String]) -> Vec<Event> {
    events
        .iter()
        .filter(|e| matches_tags(e, selected))
        .cloned()
        .collect()
}

pub fn matches(event: &Event, state: &FilterState) -> bool {
    matches_search(event, &state.search_query)
        && matches_category(event, state.category)
        && matches_tags(event, &state.selected_tags)
}

/// Events of one day that pass every filter, in their original order.
pub fn apply(events: &[Event], state: &FilterState) -> Vec<Event> {
    events.iter().filter(|e| matches(e, state)).cloned().collect()
}

/// Filtered copy of the whole map. Days left with no events are dropped.
pub fn apply_to_store(events: &EventMap, state: &FilterState) -> EventMap {
    events
        .iter()
        .filter_map(|(key, day)| {
            let kept = apply(day, state);
            (!kept.is_empty()).then_some((*key, kept))
        })
        .collect()
}

pub fn event_count(events: &EventMap) -> usize {
    events.values().map(Vec::len).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Category,
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sorted copy of `events`. Titles compare case-insensitively; ties keep
/// their original order.
pub fn sort_events(events: &[Event], key: SortKey, order: SortOrder) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    sorted
}

fn compare(a: &Event, b: &Event, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Category => a.category.as_str().cmp(b.category.as_str()),
        SortKey::Created => a.created_at.cmp(&b.created_at),
        SortKey::Updated => a.updated_at.cmp(&b.updated_at),
    }
}

pub fn group_by_category(events: &[Event]) -> BTreeMap<Category, Vec<Event>> {
    let mut groups: BTreeMap<Category, Vec<Event>> = BTreeMap::new();
    for event in events {
        groups.entry(event.category).or_default().push(event.clone());
    }
    groups
}
