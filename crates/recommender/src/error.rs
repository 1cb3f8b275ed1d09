//! Caller-visible error taxonomy.
//!
//! Deliberately tiny: sparse data selects a fallback strategy instead of
//! erroring, and engine failures degrade the strategy internally. The only
//! thing a caller can get besides a (possibly empty) list is "that user
//! does not exist".

use social_store::UserId;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecommendError {
    /// The requested user is not registered. Distinct from "no
    /// recommendations", which is an empty list.
    #[error("user {0} not found")]
    UserNotFound(UserId),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecommendError>;
