//! The interaction-store seam and its in-memory reference implementation.
//!
//! The recommendation engine is a pure reader: it consumes engagement and
//! content records through the [`InteractionStore`] trait and never writes
//! back. [`MemoryStore`] is the indexed in-memory implementation used by the
//! CLI, the tests, and any embedding application that keeps its feed in
//! process.

use std::collections::{BTreeMap, HashMap};

use crate::types::{
    Follow, Interaction, LocationId, LocationInfo, Post, PostId, User, UserId, UserInterest,
};

/// Read-only view of the social feed, as consumed by the engines.
///
/// Implementations must be cheap to query repeatedly; the engines cache the
/// expensive derived structures (matrices, similarity tables) themselves, but
/// will hit these accessors on every request for per-user data.
pub trait InteractionStore: Send + Sync {
    /// Whether a user with this id is registered.
    fn user_exists(&self, user_id: UserId) -> bool;

    fn get_user(&self, user_id: UserId) -> Option<User>;

    /// All registered users, ascending by id.
    fn get_users(&self) -> Vec<User>;

    /// All engagement events by one user, in recording order.
    fn get_interactions(&self, user_id: UserId) -> Vec<Interaction>;

    /// Every engagement event in the feed, in recording order.
    fn get_all_interactions(&self) -> Vec<Interaction>;

    /// Total number of recorded engagement events. Used for cache staleness
    /// checks; must be O(1).
    fn interaction_count(&self) -> usize;

    /// All posts, ascending by id.
    fn get_posts(&self) -> Vec<Post>;

    fn get_post(&self, post_id: PostId) -> Option<Post>;

    /// Ids of posts authored by this user.
    fn get_posts_by_author(&self, user_id: UserId) -> Vec<PostId>;

    fn get_location(&self, location_id: LocationId) -> Option<LocationInfo>;

    /// All known locations, ascending by id.
    fn get_locations(&self) -> Vec<LocationInfo>;

    /// Accounts this user follows.
    fn get_following(&self, user_id: UserId) -> Vec<UserId>;

    fn follower_count(&self, user_id: UserId) -> usize;

    /// Declared interests for this user (may be empty).
    fn get_interests(&self, user_id: UserId) -> Vec<UserInterest>;
}

/// In-memory store with secondary indices for fast per-user and per-post
/// lookups.
///
/// Sorted maps are used for the primary post/user/location tables so that
/// "all records" queries iterate in a stable order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    locations: BTreeMap<LocationId, LocationInfo>,

    /// Master event log, in insertion order
    interactions: Vec<Interaction>,
    /// All interactions made by each user
    user_interactions: HashMap<UserId, Vec<Interaction>>,
    /// All interactions received by each post
    post_interactions: HashMap<PostId, Vec<Interaction>>,

    author_index: HashMap<UserId, Vec<PostId>>,
    following: HashMap<UserId, Vec<UserId>>,
    follower_counts: HashMap<UserId, usize>,
    interests: HashMap<UserId, Vec<UserInterest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_location(&mut self, location: LocationInfo) {
        self.locations.insert(location.id, location);
    }

    pub fn insert_post(&mut self, post: Post) {
        self.author_index
            .entry(post.author)
            .or_default()
            .push(post.id);
        self.posts.insert(post.id, post);
    }

    /// Record an engagement event and bump the matching counter on the post.
    ///
    /// The counters on a freshly inserted post act as a base for engagement
    /// that predates the event log.
    pub fn insert_interaction(&mut self, interaction: Interaction) {
        if let Some(post) = self.posts.get_mut(&interaction.post_id) {
            match interaction.kind {
                crate::types::InteractionKind::Like => post.likes_count += 1,
                crate::types::InteractionKind::Comment => post.comments_count += 1,
                crate::types::InteractionKind::Share => post.shares_count += 1,
            }
        }

        self.user_interactions
            .entry(interaction.user_id)
            .or_default()
            .push(interaction);
        self.post_interactions
            .entry(interaction.post_id)
            .or_default()
            .push(interaction);
        self.interactions.push(interaction);
    }

    pub fn insert_follow(&mut self, follow: Follow) {
        self.following
            .entry(follow.follower)
            .or_default()
            .push(follow.following);
        *self.follower_counts.entry(follow.following).or_insert(0) += 1;
    }

    pub fn insert_interest(&mut self, interest: UserInterest) {
        self.interests
            .entry(interest.user_id)
            .or_default()
            .push(interest);
    }

    /// All interactions received by a post, in recording order.
    pub fn get_post_interactions(&self, post_id: PostId) -> &[Interaction] {
        self.post_interactions
            .get(&post_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get counts for debugging/validation: (users, posts, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.posts.len(), self.interactions.len())
    }

    // Existence checks usable during snapshot loading, before the store is
    // behind the trait object.

    pub(crate) fn user_exists_raw(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub(crate) fn post_exists_raw(&self, post_id: PostId) -> bool {
        self.posts.contains_key(&post_id)
    }

    pub(crate) fn location_exists_raw(&self, location_id: LocationId) -> bool {
        self.locations.contains_key(&location_id)
    }
}

impl InteractionStore for MemoryStore {
    fn user_exists(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    fn get_user(&self, user_id: UserId) -> Option<User> {
        self.users.get(&user_id).cloned()
    }

    fn get_users(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    fn get_interactions(&self, user_id: UserId) -> Vec<Interaction> {
        self.user_interactions
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get_all_interactions(&self) -> Vec<Interaction> {
        self.interactions.clone()
    }

    fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    fn get_posts(&self) -> Vec<Post> {
        self.posts.values().cloned().collect()
    }

    fn get_post(&self, post_id: PostId) -> Option<Post> {
        self.posts.get(&post_id).cloned()
    }

    fn get_posts_by_author(&self, user_id: UserId) -> Vec<PostId> {
        self.author_index.get(&user_id).cloned().unwrap_or_default()
    }

    fn get_location(&self, location_id: LocationId) -> Option<LocationInfo> {
        self.locations.get(&location_id).cloned()
    }

    fn get_locations(&self) -> Vec<LocationInfo> {
        self.locations.values().cloned().collect()
    }

    fn get_following(&self, user_id: UserId) -> Vec<UserId> {
        self.following.get(&user_id).cloned().unwrap_or_default()
    }

    fn follower_count(&self, user_id: UserId) -> usize {
        self.follower_counts.get(&user_id).copied().unwrap_or(0)
    }

    fn get_interests(&self, user_id: UserId) -> Vec<UserInterest> {
        self.interests.get(&user_id).cloned().unwrap_or_default()
    }
}
