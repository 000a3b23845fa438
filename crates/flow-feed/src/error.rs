use flow_types::ContentId;
use thiserror::Error;

/// Low-level errors from the backend API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response body not decoded.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Named failure conditions surfaced to the UI layer.
///
/// Raw transport errors are converted into these at the request site and
/// never propagate further. All variants are recoverable: the previous
/// state is preserved (or restored) and the user can retry.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A feed load failed; the previously displayed feed is unchanged.
    #[error("feed load failed: {0}")]
    FeedLoadFailed(#[source] ApiError),

    /// A post submission failed; the draft is retained for retry.
    #[error("submission failed: {0}")]
    SubmissionFailed(#[source] ApiError),

    /// A like/unlike sync failed; the optimistic state was rolled back.
    #[error("like sync failed for post {content_id}: {source}")]
    LikeSyncFailed {
        content_id: ContentId,
        #[source]
        source: ApiError,
    },
}
