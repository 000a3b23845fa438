//! Tag derivation from text selections.
//!
//! Tags are free-form strings the user confirms from highlighted text. The
//! set preserves first-insertion order for display and never contains
//! duplicates or empty strings.

/// Derives a tag candidate from raw selected text.
///
/// Trims surrounding whitespace. Returns `None` when nothing usable was
/// selected — a routine outcome, not an error.
pub fn capture_selection(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// An ordered, duplicate-free set of tags.
///
/// Membership is exact (case-sensitive) string equality. Insertion order is
/// preserved; removing and re-confirming a tag moves it to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a confirmed tag if not already present.
    ///
    /// Empty candidates are ignored. Returns whether the tag was inserted.
    pub fn confirm(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() || self.tags.iter().any(|t| t == candidate) {
            return false;
        }
        self.tags.push(candidate.to_string());
        true
    }

    /// Removes a tag by value. Removing an absent tag is a no-op.
    ///
    /// Returns whether the tag was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// The tags in display order.
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Consumes the set, yielding the ordered tag list for a submission
    /// request.
    pub fn into_vec(self) -> Vec<String> {
        self.tags
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
