//! Feed state and engagement for the flow client.
//!
//! Implements the backend API client, the in-memory feed store with
//! immutable snapshots for renderers, and the engagement controller that
//! performs optimistic like/unlike toggles with server reconciliation and
//! rollback.
//!
//! The viewer identity is always captured as a parameter at the call
//! boundary and carried by value through any suspension point; no code in
//! this crate re-reads shared identity state after an await.

mod api;
mod engagement;
mod error;
mod store;

pub use api::{FeedApi, HttpFeedApi};
pub use engagement::{EngagementController, LikeState, LikeTransition, TransitionStatus};
pub use error::{ApiError, FeedError};
pub use store::FeedStore;
