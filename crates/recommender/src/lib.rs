//! # Recommender Crate
//!
//! The hybrid combiner: strategy selection, fusion, fallbacks, caching, and
//! the output records handed to the surrounding API layer.
//!
//! See [`HybridRecommender`] for the entry points:
//! `recommend_posts`, `recommend_accounts`, `recommend_destinations`, and
//! the `explain_strategy` diagnostic.

pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use cache::{ModelCache, ModelSnapshot};
pub use error::{RecommendError, Result};
pub use orchestrator::{HybridRecommender, MIN_INTERACTIONS_FOR_COLLABORATIVE};
pub use types::{
    AccountRecommendation, DestinationRecommendation, Recommendation, Strategy, StrategyReport,
};
