//! # Engines Crate
//!
//! The two independent ranking strategies behind the recommender.
//!
//! ## Components
//!
//! ### Collaborative Engine
//! Neighbor-based filtering over the user-user similarity matrix:
//! - "Travelers who engaged with what you engaged with also engaged with..."
//! - Also drives account-to-follow suggestions via the neighbor follow graph
//!
//! ### Content Engine
//! Feature-based filtering over TF-IDF post vectors:
//! - Captions plus replicated place/category/tag terms
//! - Preference bonuses for places the user already leans toward
//! - A destination mode that aggregates by location instead of post
//!
//! ## Example Usage
//!
//! ```ignore
//! use engines::{CollaborativeEngine, ContentEngine, profile::build_user_profile};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn social_store::InteractionStore> = Arc::new(store);
//!
//! let collaborative = CollaborativeEngine::new(store.clone());
//! let interactions = collaborative.build_interaction_matrix();
//! let similarity = collaborative.compute_user_similarity(&interactions);
//!
//! let content = ContentEngine::new(store.clone());
//! let model = content.build_model();
//!
//! let profile = build_user_profile(store.as_ref(), user_id)?;
//! let from_neighbors = collaborative.recommend_posts(&similarity, &profile, 20);
//! let from_features = content.recommend_posts(&model, &profile, 20);
//! ```
//!
//! Both engines return empty candidate lists for cold users; the combiner
//! turns that into strategy fallback, never an error.

// Public modules
pub mod collaborative;
pub mod content;
pub mod matrix;
pub mod profile;
pub mod text;

// Re-export commonly used types
pub use collaborative::{AccountCandidate, CollabCandidate, CollaborativeEngine};
pub use content::{ContentCandidate, ContentEngine, ContentModel, DestinationCandidate};
pub use matrix::{InteractionMatrix, SimilarityMatrix};
pub use profile::{UserProfile, build_user_profile};
pub use text::{TfIdfConfig, TfIdfVectorizer};

#[cfg(test)]
mod tests {
    use super::*;
    use social_store::{Interaction, InteractionKind, MediaKind, MemoryStore, Post, User};
    use std::sync::Arc;

    fn create_test_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_user(User {
            id: 1,
            username: "asha".to_string(),
            bio: String::new(),
            home_location: String::new(),
            travel_style: None,
        });
        store.insert_user(User {
            id: 2,
            username: "liam".to_string(),
            bio: String::new(),
            home_location: String::new(),
            travel_style: None,
        });
        store.insert_post(Post {
            id: 1,
            author: 2,
            caption: "Test post".to_string(),
            location: None,
            tags: vec![],
            media: MediaKind::Image,
            created_at: 0,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
        });
        store.insert_interaction(Interaction {
            user_id: 1,
            post_id: 1,
            kind: InteractionKind::Like,
            timestamp: 0,
        });
        store
    }

    #[test]
    fn test_collaborative_engine_creation() {
        let store: Arc<dyn social_store::InteractionStore> = Arc::new(create_test_store());
        let engine = CollaborativeEngine::new(store);
        let matrix = engine.build_interaction_matrix();
        assert_eq!(matrix.user_count(), 1);
        assert_eq!(matrix.post_count(), 1);
    }

    #[test]
    fn test_content_engine_creation() {
        let store: Arc<dyn social_store::InteractionStore> = Arc::new(create_test_store());
        let engine = ContentEngine::new(store);
        let model = engine.build_model();
        assert_eq!(model.post_count(), 1);
    }
}
