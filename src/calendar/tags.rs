use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::event::normalize_tag;

/// Every tag ever attached to an event, enumerated in sorted order.
///
/// Tags only leave the registry through [`TagRegistry::remove`]; deleting the
/// last event carrying a tag keeps it around for suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRegistry {
    tags: BTreeSet<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag after normalizing it. Returns true if it was new.
    pub fn insert(&mut self, tag: &str) -> bool {
        match normalize_tag(tag) {
            Some(tag) => self.tags.insert(tag),
            None => false,
        }
    }

    /// Merge several tags. Returns true if any were new.
    pub fn extend<'a, I>(&mut self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut changed = false;
        for tag in tags {
            changed |= self.insert(tag);
        }
        changed
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Registry tags containing `fragment`, skipping ones already chosen.
    pub fn suggestions(&self, fragment: &str, exclude: &[String]) -> Vec<&str> {
        let fragment = fragment.trim().to_lowercase();
        self.tags
            .iter()
            .filter(|t| t.contains(fragment.as_str()) && !exclude.contains(*t))
            .map(String::as_str)
            .collect()
    }
}

impl FromIterator<String> for TagRegistry {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut registry = TagRegistry::new();
        for tag in iter {
            registry.insert(&tag);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_normalizes_and_sorts() {
        let mut registry = TagRegistry::new();
        assert!(registry.insert(" Zeta"));
        assert!(registry.insert("alpha"));
        assert!(!registry.insert("ALPHA "));
        assert!(!registry.insert("   "));

        let tags: Vec<_> = registry.iter().cloned().collect();
        assert_eq!(tags, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_serializes_as_sorted_list() {
        let registry: TagRegistry = ["team".to_string(), "ops".to_string()].into_iter().collect();
        assert_eq!(serde_json::to_string(&registry).unwrap(), r#"["ops","team"]"#);

        let back: TagRegistry = serde_json::from_str(r#"["b","a"]"#).unwrap();
        assert_eq!(back.iter().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_suggestions_skip_selected() {
        let registry: TagRegistry = ["team".into(), "teamwork".into(), "ops".into()]
            .into_iter()
            .collect();
        let chosen = vec!["team".to_string()];
        assert_eq!(registry.suggestions("tea", &chosen), vec!["teamwork"]);
        assert_eq!(registry.suggestions("", &[]).len(), 3);
    }
}
