//! Draft state machine for composing a new post.
//!
//! `Empty -> Editing -> Submitting -> {Submitted | Failed}`. The composer
//! owns the draft and produces a validated submission request; the session
//! layer performs the HTTP call and reports the outcome back via
//! [`PostComposer::submit_succeeded`] / [`PostComposer::submit_failed`].
//! On failure the draft is retained so the user can retry.

use crate::error::ComposeError;
use crate::tags::{capture_selection, TagSet};
use crate::validation::{validate_content, validate_title, Field};
use flow_types::{NewPost, ViewerId};

/// Composer lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    /// No draft content yet.
    Empty,
    /// The user is editing the draft.
    Editing,
    /// A submission request is in flight.
    Submitting,
    /// The last submission succeeded; the draft was cleared.
    Submitted,
    /// The last submission failed; the draft is retained for retry.
    Failed,
}

/// Transient draft state, one per open composer session.
///
/// Never persisted; destroyed on submit or cancel.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub pending_tags: TagSet,
    /// The last captured selection awaiting tag confirmation.
    pub selection_anchor: Option<String>,
}

/// Holds draft state and produces submission requests.
#[derive(Debug)]
pub struct PostComposer {
    draft: Draft,
    state: ComposerState,
}

impl Default for PostComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PostComposer {
    pub fn new() -> Self {
        Self {
            draft: Draft::default(),
            state: ComposerState::Empty,
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Updates a draft field, moving the composer into `Editing`.
    ///
    /// Validation feedback is advisory while typing; it blocks submission,
    /// not entry. Edits arriving while a submission is in flight are
    /// ignored so the submitted snapshot stays coherent.
    pub fn update_field(&mut self, field: Field, value: impl Into<String>) {
        if self.state == ComposerState::Submitting {
            tracing::warn!(field = %field, "ignoring draft edit while submission is in flight");
            return;
        }
        match field {
            Field::Title => self.draft.title = value.into(),
            Field::Content => self.draft.content = value.into(),
        }
        self.state = ComposerState::Editing;
    }

    /// Advisory validation state for UI feedback.
    ///
    /// Returns the first failing check, or `Ok` when submission would be
    /// permitted.
    pub fn validate(&self) -> Result<(), ComposeError> {
        validate_title(&self.draft.title)?;
        validate_content(&self.draft.content)?;
        Ok(())
    }

    /// Captures highlighted text as a tag candidate.
    ///
    /// An empty or whitespace-only selection clears the anchor and yields
    /// no candidate; this is a routine outcome, not an error.
    pub fn capture_selection(&mut self, raw: &str) -> Option<&str> {
        self.draft.selection_anchor = capture_selection(raw);
        self.draft.selection_anchor.as_deref()
    }

    /// Confirms the currently anchored selection as a tag.
    ///
    /// Consumes the anchor. Returns whether a new tag was added.
    pub fn confirm_selected_tag(&mut self) -> bool {
        match self.draft.selection_anchor.take() {
            Some(candidate) => self.draft.pending_tags.confirm(&candidate),
            None => false,
        }
    }

    /// Removes a pending tag by value. Absent tags are a no-op.
    pub fn remove_tag(&mut self, tag: &str) {
        self.draft.pending_tags.remove(tag);
    }

    /// Validates the draft and produces the submission request, entering
    /// `Submitting`.
    ///
    /// Preconditions: both field checks pass, no submission is already in
    /// flight, and `viewer` is present. Composing while signed out is
    /// permitted, submitting is not: on `SignedOut` the caller must invoke
    /// the external login prompt and abort, leaving the draft untouched.
    pub fn begin_submit(&mut self, viewer: Option<&ViewerId>) -> Result<NewPost, ComposeError> {
        if self.state == ComposerState::Submitting {
            return Err(ComposeError::SubmissionInFlight);
        }
        self.validate()?;
        let viewer = viewer.ok_or(ComposeError::SignedOut)?;

        self.state = ComposerState::Submitting;
        Ok(NewPost {
            title: self.draft.title.clone(),
            content: self.draft.content.clone(),
            tags: self.draft.pending_tags.clone().into_vec(),
            author_id: viewer.clone(),
        })
    }

    /// Records a successful submission: the draft is cleared.
    pub fn submit_succeeded(&mut self) {
        self.draft = Draft::default();
        self.state = ComposerState::Submitted;
    }

    /// Records a failed submission: the draft is retained for retry.
    pub fn submit_failed(&mut self) {
        self.state = ComposerState::Failed;
    }

    /// Discards the draft entirely.
    pub fn cancel(&mut self) {
        self.draft = Draft::default();
        self.state = ComposerState::Empty;
    }
}
