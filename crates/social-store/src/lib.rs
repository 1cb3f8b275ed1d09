//! # Social Store Crate
//!
//! Domain types and the storage seam for the recommendation engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (User, Post, LocationInfo, Interaction, ...)
//! - **store**: The [`InteractionStore`] adapter trait and [`MemoryStore`],
//!   an indexed in-memory implementation
//! - **feed**: JSON feed-snapshot ingestion with referential validation
//! - **error**: Error types for loading and validation
//!
//! ## Example Usage
//!
//! ```ignore
//! use social_store::MemoryStore;
//! use std::path::Path;
//!
//! let store = MemoryStore::load_from_json(Path::new("data/feed.json"))?;
//! let (users, posts, interactions) = store.counts();
//! println!("{users} users, {posts} posts, {interactions} interactions");
//! ```
//!
//! The engines only ever see `Arc<dyn InteractionStore>`; swapping the
//! in-memory store for a database-backed adapter is a matter of implementing
//! the trait.

// Public modules
pub mod error;
pub mod types;
pub mod store;
pub mod feed;

// Re-export commonly used types for convenience
pub use error::{Result, StoreError};
pub use feed::FeedSnapshot;
pub use store::{InteractionStore, MemoryStore};
pub use types::{
    // Type aliases
    UserId,
    PostId,
    LocationId,
    // Core types
    User,
    Post,
    LocationInfo,
    Interaction,
    Follow,
    UserInterest,
    // Enums
    InteractionKind,
    MediaKind,
};
