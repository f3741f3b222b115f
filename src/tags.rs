//! Tag sets and tag-based list filtering.

use crate::note::Note;
use serde::{Deserialize, Serialize};

/// Separator between tokens typed into the tag input.
pub const TAG_SEPARATOR: char = ',';

/// An insertion-ordered set of tags.
///
/// Tags are compared exactly (case-sensitive, no normalization). The set is
/// persisted as a plain sequence of strings; duplicates and blank entries
/// found in a stored record are dropped when it is read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Creates an empty [`TagSet`].
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts a single tag. Returns `false` if the tag is blank or already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if tag.trim().is_empty() || self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    /// Adds every comma-separated token of `input`.
    ///
    /// Tokens are trimmed, empty tokens are skipped and tokens already in the
    /// set (including ones added earlier from the same input) are ignored.
    /// Returns how many tags were added.
    pub fn add_tokens(&mut self, input: &str) -> usize {
        input
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .fold(0, |added, token| added + usize::from(self.insert(token)))
    }

    /// Removes `tag`. Returns `false` if it was not in the set.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.0.iter().position(|t| t == tag) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        let mut set = TagSet::new();
        for tag in tags {
            set.insert(tag);
        }
        set
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// Returns `true` if `note` carries `tag`.
pub fn matches_tag(note: &Note, tag: &str) -> bool {
    note.tags.contains(tag)
}

/// Filters `notes` by tag, keeping store order. `None` keeps every note.
pub fn filter_by_tag<'a>(notes: &'a [Note], tag: Option<&str>) -> Vec<&'a Note> {
    match tag {
        Some(tag) => notes.iter().filter(|note| matches_tag(note, tag)).collect(),
        None => notes.iter().collect(),
    }
}

/// Every tag used by any of `notes`, in first-seen order.
pub fn distinct_tags(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .flat_map(|note| note.tags.iter())
        .collect::<TagSet>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tags: &[&str]) -> Note {
        Note {
            tags: tags.iter().copied().collect(),
            ..Note::default()
        }
    }

    #[test]
    fn test_duplicate_tags_are_suppressed() {
        let mut tags = TagSet::new();
        for tag in ["a", "a", "b"] {
            tags.insert(tag);
        }
        assert_eq!(tags.as_slice(), ["a", "b"]);

        assert!(tags.remove("a"));
        assert_eq!(tags.as_slice(), ["b"]);
        assert!(!tags.remove("a"));
    }

    #[test]
    fn test_add_tokens_trims_and_skips_empty() {
        let mut tags = TagSet::from(vec!["work".to_string()]);
        let added = tags.add_tokens(" idea, ,work,  Work ,idea,");
        assert_eq!(added, 2);
        assert_eq!(tags.as_slice(), ["work", "idea", "Work"]);
    }

    #[test]
    fn test_stored_duplicates_dropped_on_read() {
        let tags: TagSet = serde_json::from_str(r#"["x", "x", "", "y"]"#).unwrap();
        assert_eq!(tags.as_slice(), ["x", "y"]);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["x","y"]"#);
    }

    #[test]
    fn test_filter_by_tag() {
        let notes = vec![tagged(&[]), tagged(&["x"]), tagged(&["x", "y"])];

        let filtered = filter_by_tag(&notes, Some("x"));
        assert_eq!(filtered.len(), 2);
        assert!(std::ptr::eq(filtered[0], &notes[1]));
        assert!(std::ptr::eq(filtered[1], &notes[2]));

        assert_eq!(filter_by_tag(&notes, None).len(), 3);
        assert!(filter_by_tag(&notes, Some("X")).is_empty());
    }

    #[test]
    fn test_distinct_tags_first_seen_order() {
        let notes = vec![tagged(&["b"]), tagged(&["a", "b"]), tagged(&["c", "a"])];
        assert_eq!(distinct_tags(&notes), ["b", "a", "c"]);
    }
}
