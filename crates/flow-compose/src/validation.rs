//! Field validation rules for post drafts.
//!
//! Pure functions, no side effects. Validation runs continuously while the
//! user types (for UI feedback) and again as the submission precondition;
//! it never blocks entry, only submission.

use crate::error::ComposeError;
use flow_types::{MAX_CONTENT_CHARS, MAX_TITLE_CHARS};

/// The draft fields subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Content,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Content => f.write_str("content"),
        }
    }
}

/// Validates a post title: required, at most 255 characters.
pub fn validate_title(title: &str) -> Result<(), ComposeError> {
    validate_field(Field::Title, title, MAX_TITLE_CHARS)
}

/// Validates a post body: required, at most 65535 characters.
pub fn validate_content(content: &str) -> Result<(), ComposeError> {
    validate_field(Field::Content, content, MAX_CONTENT_CHARS)
}

/// Whether submission is permitted for the given title/content pair.
///
/// True iff both field checks pass. The UI disables the submit action
/// whenever this is false.
pub fn submission_allowed(title: &str, content: &str) -> bool {
    validate_title(title).is_ok() && validate_content(content).is_ok()
}

fn validate_field(field: Field, value: &str, max: usize) -> Result<(), ComposeError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ComposeError::FieldEmpty(field));
    }
    if len > max {
        return Err(ComposeError::FieldTooLong { field, max, len });
    }
    Ok(())
}
