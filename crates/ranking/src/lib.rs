//! # Ranking Crate
//!
//! Strategy-agnostic ranking utilities shared by the recommender:
//!
//! - **fusion**: rank-normalized weighted fusion of the collaborative and
//!   content candidate lists, plus the priority merge used for account
//!   recommendations
//! - **diversity**: the pure diversity re-ranker applied to every final
//!   list (author, location, media-kind, and recency bonuses)
//!
//! Everything in this crate is deterministic: identical inputs (including
//! the caller-supplied `now` timestamp) produce identical output ordering.

pub mod diversity;
pub mod fusion;

pub use diversity::{DiversityItem, diversify};
pub use fusion::{FusedScore, FusionWeights, MergeSource, fuse, merge_by_priority};
