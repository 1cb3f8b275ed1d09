//! Feed snapshot ingestion.
//!
//! A [`FeedSnapshot`] is the JSON document the surrounding system exports
//! for the engine: users, locations, posts, the engagement event log, the
//! follow graph, and declared interests. Loading validates every reference
//! before any record is indexed, so a store built from a snapshot is
//! internally consistent.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::store::MemoryStore;
use crate::types::{Follow, Interaction, LocationInfo, Post, User, UserInterest};

/// Serialized form of a complete feed export.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub locations: Vec<LocationInfo>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub follows: Vec<Follow>,
    #[serde(default)]
    pub interests: Vec<UserInterest>,
}

impl FeedSnapshot {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(snapshot)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl MemoryStore {
    /// Load a feed snapshot from a JSON file and build an indexed store.
    pub fn load_from_json(path: &Path) -> Result<Self> {
        let snapshot = FeedSnapshot::from_json_file(path)?;
        Self::from_snapshot(snapshot)
    }

    /// Build an indexed store from a parsed snapshot.
    ///
    /// Validation order matters: users and locations first, then posts
    /// (which reference both), then events and edges (which reference both).
    pub fn from_snapshot(snapshot: FeedSnapshot) -> Result<Self> {
        let mut store = MemoryStore::new();

        for user in snapshot.users {
            if user.username.trim().is_empty() {
                return Err(StoreError::InvalidValue {
                    field: "username",
                    value: format!("(empty, user {})", user.id),
                });
            }
            store.insert_user(user);
        }

        for location in snapshot.locations {
            store.insert_location(location);
        }

        for post in snapshot.posts {
            if !store.user_exists_raw(post.author) {
                return Err(StoreError::MissingReference {
                    entity: "user",
                    id: post.author,
                });
            }
            if let Some(location_id) = post.location
                && !store.location_exists_raw(location_id)
            {
                return Err(StoreError::MissingReference {
                    entity: "location",
                    id: location_id,
                });
            }
            store.insert_post(post);
        }

        for interaction in snapshot.interactions {
            if !store.user_exists_raw(interaction.user_id) {
                return Err(StoreError::MissingReference {
                    entity: "user",
                    id: interaction.user_id,
                });
            }
            if !store.post_exists_raw(interaction.post_id) {
                return Err(StoreError::MissingReference {
                    entity: "post",
                    id: interaction.post_id,
                });
            }
            store.insert_interaction(interaction);
        }

        for follow in snapshot.follows {
            if !store.user_exists_raw(follow.follower) {
                return Err(StoreError::MissingReference {
                    entity: "user",
                    id: follow.follower,
                });
            }
            if !store.user_exists_raw(follow.following) {
                return Err(StoreError::MissingReference {
                    entity: "user",
                    id: follow.following,
                });
            }
            if follow.follower == follow.following {
                return Err(StoreError::Validation(format!(
                    "user {} follows themself",
                    follow.follower
                )));
            }
            store.insert_follow(follow);
        }

        for interest in snapshot.interests {
            if !store.user_exists_raw(interest.user_id) {
                return Err(StoreError::MissingReference {
                    entity: "user",
                    id: interest.user_id,
                });
            }
            if !(interest.weight > 0.0 && interest.weight <= 1.0) {
                return Err(StoreError::InvalidValue {
                    field: "interest.weight",
                    value: interest.weight.to_string(),
                });
            }
            store.insert_interest(interest);
        }

        Ok(store)
    }
}
