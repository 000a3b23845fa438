use crate::validation::Field;
use thiserror::Error;

/// Errors raised by the composition layer.
///
/// All variants are local and non-fatal: they block submission but never
/// reach the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// A required field is empty.
    #[error("{0} must not be empty")]
    FieldEmpty(Field),

    /// A field exceeds its maximum length.
    #[error("{field} exceeds the maximum length of {max} characters (got {len})")]
    FieldTooLong {
        field: Field,
        max: usize,
        len: usize,
    },

    /// Submission requires a signed-in viewer; the caller must trigger the
    /// login prompt and abort.
    #[error("a signed-in identity is required to submit")]
    SignedOut,

    /// A submission is already in flight for this draft.
    #[error("a submission is already in flight")]
    SubmissionInFlight,
}
