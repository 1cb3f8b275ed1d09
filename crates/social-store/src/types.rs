//! Core domain types for the social feed.
//!
//! Everything the recommendation engine reads lives here: users, posts,
//! locations, engagement events, follow edges, and declared interests.
//! The engine never mutates any of these; the store owns all writes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with post IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a post
pub type PostId = u32;

/// Unique identifier for a location
pub type LocationId = u32;

// =============================================================================
// User-related Types
// =============================================================================

/// A registered account, as seen by the engine (read-only profile data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Free-text bio shown on the profile
    #[serde(default)]
    pub bio: String,
    /// Free-text home location ("Mumbai, India" style)
    #[serde(default)]
    pub home_location: String,
    /// Declared travel style ("Adventure", "Luxury", ...), if the user set one
    #[serde(default)]
    pub travel_style: Option<String>,
}

/// Declared (user, category, weight) interest tuple.
///
/// Secondary signal only; users without declared interests are fully
/// supported. Weight must lie in (0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInterest {
    pub user_id: UserId,
    pub category: String,
    pub weight: f32,
}

// =============================================================================
// Post-related Types
// =============================================================================

/// Media attached to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Structured place metadata referenced by posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    pub id: LocationId,
    pub name: String,
    pub country: String,
    pub continent: String,
    /// Travel category ("Beach", "Mountains", "Culture", ...)
    pub category: String,
}

/// A post in the feed.
///
/// The engagement counters are denormalized aggregates maintained by the
/// store as events arrive; the engine only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub caption: String,
    pub location: Option<LocationId>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub media: MediaKind,
    /// Unix timestamp (seconds) of creation
    pub created_at: i64,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub shares_count: u32,
}

impl Post {
    /// Sum of all engagement counters, used for popularity ranking.
    pub fn engagement_total(&self) -> u32 {
        self.likes_count + self.comments_count + self.shares_count
    }
}

// =============================================================================
// Engagement Types
// =============================================================================

/// Kind of engagement event, with its fixed interaction weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Comment,
    Share,
}

impl InteractionKind {
    /// Weight of this interaction kind in matrix cells and preference
    /// profiles. One scheme everywhere: like 1.0, comment 2.0, share 3.0.
    pub fn weight(self) -> f32 {
        match self {
            InteractionKind::Like => 1.0,
            InteractionKind::Comment => 2.0,
            InteractionKind::Share => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Comment => "comment",
            InteractionKind::Share => "share",
        }
    }
}

/// A single engagement event. Append-only; immutable once recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub post_id: PostId,
    pub kind: InteractionKind,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
}

/// A follow edge in the social graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Follow {
    pub follower: UserId,
    pub following: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_weights() {
        assert_eq!(InteractionKind::Like.weight(), 1.0);
        assert_eq!(InteractionKind::Comment.weight(), 2.0);
        assert_eq!(InteractionKind::Share.weight(), 3.0);
    }

    #[test]
    fn test_engagement_total() {
        let post = Post {
            id: 1,
            author: 1,
            caption: "Sunrise over the dunes".to_string(),
            location: None,
            tags: vec![],
            media: MediaKind::Image,
            created_at: 0,
            likes_count: 3,
            comments_count: 2,
            shares_count: 1,
        };
        assert_eq!(post.engagement_total(), 6);
    }

    #[test]
    fn test_media_kind_serde_names() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
        let kind: InteractionKind = serde_json::from_str("\"share\"").unwrap();
        assert_eq!(kind, InteractionKind::Share);
    }
}
