//! Per-user engagement profile.
//!
//! Gathers everything both engines need about one user in a single pass:
//! which posts they have touched or authored, how strongly they lean toward
//! places and categories, who they follow, and a recency-ordered seed window
//! for content similarity. Built once per request, never cached across
//! requests.

use std::collections::{HashMap, HashSet};

use anyhow::{Result, anyhow};
use social_store::{Interaction, InteractionStore, PostId, UserId};

/// How many of the newest interactions seed content-based candidates.
pub const RECENT_SEED_WINDOW: usize = 50;

/// Aggregated view of one user's engagement history.
///
/// Preference maps are keyed by the human-readable place fields (location
/// name, country, continent, category) and hold summed interaction-kind
/// weights, so a shared beach post moves the "Beach" preference three times
/// as much as a liked one.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub user_id: UserId,
    /// Total recorded interactions (not capped to the seed window)
    pub interaction_count: usize,
    /// Posts the user interacted with or authored; never recommended back
    pub seen_posts: HashSet<PostId>,
    pub authored_posts: HashSet<PostId>,
    /// Newest interactions first, capped to [`RECENT_SEED_WINDOW`]
    pub recent_interactions: Vec<Interaction>,
    pub location_prefs: HashMap<String, f32>,
    pub country_prefs: HashMap<String, f32>,
    pub continent_prefs: HashMap<String, f32>,
    pub category_prefs: HashMap<String, f32>,
    /// Location names of posts the user engaged with or authored
    pub visited_locations: HashSet<String>,
    pub following: HashSet<UserId>,
}

impl UserProfile {
    pub fn has_history(&self) -> bool {
        self.interaction_count > 0
    }
}

/// Build a profile for `user_id`, or fail if the user is not registered.
///
/// A registered user with no history gets an empty profile; that is a normal
/// outcome the engines turn into an empty candidate list.
pub fn build_user_profile(store: &dyn InteractionStore, user_id: UserId) -> Result<UserProfile> {
    store
        .get_user(user_id)
        .ok_or_else(|| anyhow!("user {} not found", user_id))?;

    let mut profile = UserProfile {
        user_id,
        ..Default::default()
    };

    let mut interactions = store.get_interactions(user_id);
    // Newest first; equal timestamps fall back to post id so the seed
    // window is the same on every call
    interactions.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.post_id.cmp(&b.post_id))
    });
    profile.interaction_count = interactions.len();

    for interaction in &interactions {
        profile.seen_posts.insert(interaction.post_id);
        add_place_weight(
            store,
            &mut profile,
            interaction.post_id,
            interaction.kind.weight(),
        );
    }

    // Authored posts count as seen and as a mild preference signal
    for post_id in store.get_posts_by_author(user_id) {
        profile.seen_posts.insert(post_id);
        profile.authored_posts.insert(post_id);
        add_place_weight(store, &mut profile, post_id, 1.0);
    }

    interactions.truncate(RECENT_SEED_WINDOW);
    profile.recent_interactions = interactions;

    // Declared interests fold into category preferences as a secondary
    // signal
    for interest in store.get_interests(user_id) {
        *profile
            .category_prefs
            .entry(interest.category)
            .or_insert(0.0) += interest.weight;
    }

    profile.following = store.get_following(user_id).into_iter().collect();

    Ok(profile)
}

fn add_place_weight(
    store: &dyn InteractionStore,
    profile: &mut UserProfile,
    post_id: PostId,
    weight: f32,
) {
    let Some(post) = store.get_post(post_id) else {
        return;
    };
    let Some(location_id) = post.location else {
        return;
    };
    let Some(location) = store.get_location(location_id) else {
        return;
    };

    *profile
        .location_prefs
        .entry(location.name.clone())
        .or_insert(0.0) += weight;
    *profile
        .country_prefs
        .entry(location.country.clone())
        .or_insert(0.0) += weight;
    *profile
        .continent_prefs
        .entry(location.continent.clone())
        .or_insert(0.0) += weight;
    *profile
        .category_prefs
        .entry(location.category.clone())
        .or_insert(0.0) += weight;
    profile.visited_locations.insert(location.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_store::{
        InteractionKind, LocationInfo, MediaKind, MemoryStore, Post, User, UserInterest,
    };

    fn create_test_store() -> MemoryStore {
        let mut store = MemoryStore::new();

        store.insert_user(User {
            id: 1,
            username: "asha".to_string(),
            bio: String::new(),
            home_location: "Mumbai".to_string(),
            travel_style: Some("Adventure".to_string()),
        });
        store.insert_user(User {
            id: 2,
            username: "liam".to_string(),
            bio: String::new(),
            home_location: String::new(),
            travel_style: None,
        });

        store.insert_location(LocationInfo {
            id: 1,
            name: "Goa".to_string(),
            country: "India".to_string(),
            continent: "Asia".to_string(),
            category: "Beach".to_string(),
        });

        store.insert_post(Post {
            id: 10,
            author: 2,
            caption: "Beach day".to_string(),
            location: Some(1),
            tags: vec![],
            media: MediaKind::Image,
            created_at: 0,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
        });
        store.insert_post(Post {
            id: 11,
            author: 1,
            caption: "My own trip".to_string(),
            location: Some(1),
            tags: vec![],
            media: MediaKind::Image,
            created_at: 0,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
        });

        store.insert_interaction(Interaction {
            user_id: 1,
            post_id: 10,
            kind: InteractionKind::Share,
            timestamp: 100,
        });

        store
    }

    #[test]
    fn test_unknown_user_is_an_error() {
        let store = MemoryStore::new();
        assert!(build_user_profile(&store, 999).is_err());
    }

    #[test]
    fn test_empty_history_is_ok() {
        let store = create_test_store();
        let profile = build_user_profile(&store, 2).unwrap();
        assert!(!profile.has_history());
        assert!(profile.recent_interactions.is_empty());
        // Authored post still registers as seen
        assert!(profile.seen_posts.contains(&10));
    }

    #[test]
    fn test_preferences_sum_kind_weights() {
        let store = create_test_store();
        let profile = build_user_profile(&store, 1).unwrap();

        // Share on post 10 (3.0) plus authored post 11 (1.0)
        assert_eq!(profile.location_prefs["Goa"], 4.0);
        assert_eq!(profile.category_prefs["Beach"], 4.0);
        assert_eq!(profile.country_prefs["India"], 4.0);
        assert!(profile.visited_locations.contains("Goa"));
    }

    #[test]
    fn test_seen_covers_interacted_and_authored() {
        let store = create_test_store();
        let profile = build_user_profile(&store, 1).unwrap();

        assert!(profile.seen_posts.contains(&10));
        assert!(profile.seen_posts.contains(&11));
        assert!(profile.authored_posts.contains(&11));
        assert!(!profile.authored_posts.contains(&10));
        assert_eq!(profile.interaction_count, 1);
    }

    #[test]
    fn test_recent_window_is_capped_and_newest_first() {
        let mut store = create_test_store();
        for i in 0..(RECENT_SEED_WINDOW + 10) {
            store.insert_post(Post {
                id: 100 + i as u32,
                author: 2,
                caption: String::new(),
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
                post_id: 100 + i as u32,
                kind: InteractionKind::Like,
                timestamp: 1000 + i as i64,
            });
        }

        let profile = build_user_profile(&store, 1).unwrap();
        assert_eq!(profile.recent_interactions.len(), RECENT_SEED_WINDOW);
        assert_eq!(
            profile.recent_interactions[0].timestamp,
            1000 + (RECENT_SEED_WINDOW + 9) as i64
        );
        assert_eq!(
            profile.interaction_count,
            RECENT_SEED_WINDOW + 10 + 1 // the share from the fixture
        );
    }

    #[test]
    fn test_declared_interests_fold_into_categories() {
        let mut store = create_test_store();
        store.insert_interest(UserInterest {
            user_id: 2,
            category: "Mountains".to_string(),
            weight: 0.7,
        });

        let profile = build_user_profile(&store, 2).unwrap();
        assert_eq!(profile.category_prefs["Mountains"], 0.7);
    }
}
