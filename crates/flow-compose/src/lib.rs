//! Post composition for the flow client.
//!
//! Implements the draft state machine behind the "create post" UI: field
//! validation, tag derivation from text selections, and the submission
//! lifecycle. Everything here is pure client-side state; the actual HTTP
//! call is issued by the session layer, which feeds the outcome back into
//! the composer.

mod composer;
mod error;
mod tags;
mod validation;

pub use composer::{ComposerState, Draft, PostComposer};
pub use error::ComposeError;
pub use tags::{capture_selection, TagSet};
pub use validation::{submission_allowed, validate_content, validate_title, Field};
