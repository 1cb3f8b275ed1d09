//! # Hybrid Recommendation Orchestrator
//!
//! Coordinates a recommendation request end to end:
//! 1. Check the user exists (the only caller-visible error)
//! 2. Build the user profile and fetch the cached model snapshot
//! 3. Run both engines concurrently on blocking threads
//! 4. Select a strategy from what came back
//! 5. Fuse, diversity re-rank, and attach reasons
//!
//! Engine failures never surface: a panicking engine contributes zero
//! candidates, and a request that exceeds the timeout budget degrades to the
//! popularity fallback instead of hanging.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use engines::{CollaborativeEngine, ContentEngine, UserProfile, build_user_profile};
use ranking::{DiversityItem, FusionWeights, MergeSource, diversify, fuse, merge_by_priority};
use social_store::{InteractionStore, MediaKind, Post, PostId, UserId};
use tokio::task;
use tracing::{debug, info, instrument, warn};

use crate::cache::{ModelCache, ModelSnapshot};
use crate::error::{RecommendError, Result};
use crate::types::{
    AccountRecommendation, DestinationRecommendation, Recommendation, Strategy, StrategyReport,
    preview,
};

/// Minimum recorded interactions before collaborative filtering is consulted.
pub const MIN_INTERACTIONS_FOR_COLLABORATIVE: usize = 3;

/// Share of the account list reserved for collaborative candidates.
const ACCOUNT_COLLABORATIVE_SHARE: f32 = 0.7;

/// Neighbors consulted when boosting destinations.
const DESTINATION_NEIGHBORS: usize = 5;

const CAPTION_PREVIEW_CHARS: usize = 100;
const BIO_PREVIEW_CHARS: usize = 150;

/// Main entry point for the surrounding API layer.
#[derive(Clone)]
pub struct HybridRecommender {
    store: Arc<dyn InteractionStore>,
    collaborative: CollaborativeEngine,
    content: ContentEngine,
    cache: Arc<ModelCache>,
    weights: FusionWeights,
    min_interactions: usize,
    request_timeout: Duration,
}

impl HybridRecommender {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        let collaborative = CollaborativeEngine::new(Arc::clone(&store));
        let content = ContentEngine::new(Arc::clone(&store));
        Self::from_engines(store, collaborative, content)
    }

    /// Build from pre-configured engines (custom vectorizer settings,
    /// neighbor windows, rotation buckets).
    pub fn from_engines(
        store: Arc<dyn InteractionStore>,
        collaborative: CollaborativeEngine,
        content: ContentEngine,
    ) -> Self {
        let cache = Arc::new(ModelCache::new(
            Arc::clone(&store),
            collaborative.clone(),
            content.clone(),
        ));
        Self {
            store,
            collaborative,
            content,
            cache,
            weights: FusionWeights::default(),
            min_interactions: MIN_INTERACTIONS_FOR_COLLABORATIVE,
            request_timeout: Duration::from_secs(2),
        }
    }

    /// Configure fusion weights (default: 0.6 collaborative / 0.4 content)
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Configure the collaborative threshold (default: 3)
    pub fn with_min_interactions(mut self, min: usize) -> Self {
        self.min_interactions = min;
        self
    }

    /// Configure the per-request compute budget (default: 2s)
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Drop cached models; the next request rebuilds them.
    pub fn invalidate_models(&self) {
        self.cache.invalidate();
    }

    /// Rebuild the model snapshot on an interval so user-facing requests
    /// only pay for a build on cold start.
    pub fn spawn_refresh(&self, interval: Duration) -> task::JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let cache = Arc::clone(&cache);
                if let Err(error) = task::spawn_blocking(move || {
                    cache.rebuild();
                })
                .await
                {
                    warn!("background model rebuild failed: {error}");
                }
            }
        })
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Ranked post recommendations for a user.
    ///
    /// Errors only when the user does not exist; every other condition
    /// produces a list, possibly empty.
    #[instrument(skip(self))]
    pub async fn recommend_posts(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        if !self.store.user_exists(user_id) {
            return Err(RecommendError::UserNotFound(user_id));
        }
        let now = unix_now();

        match tokio::time::timeout(self.request_timeout, self.ranked_posts(user_id, limit, now))
            .await
        {
            Ok(recommendations) => Ok(recommendations),
            Err(_) => {
                warn!(
                    "request exceeded {:?}, serving popular posts",
                    self.request_timeout
                );
                Ok(self.popular_posts(user_id, limit, now))
            }
        }
    }

    async fn ranked_posts(&self, user_id: UserId, limit: usize, now: i64) -> Vec<Recommendation> {
        let profile = match build_user_profile(self.store.as_ref(), user_id) {
            Ok(profile) => profile,
            Err(error) => {
                warn!("profile build failed: {error:#}");
                return self.popular_posts(user_id, limit, now);
            }
        };
        let interaction_count = profile.interaction_count;

        let Some(snapshot) = self.models().await else {
            return self.popular_posts(user_id, limit, now);
        };

        // Over-fetch so the diversity pass has room to reorder
        let pool = limit.saturating_mul(2).max(limit);
        let (collab, content) = self
            .generate_candidates(&snapshot, &profile, interaction_count, pool)
            .await;

        let strategy = match (!collab.is_empty(), !content.is_empty()) {
            (true, true) => Strategy::Hybrid,
            (true, false) => Strategy::CollaborativeOnly,
            (false, true) => Strategy::ContentOnly,
            (false, false) => Strategy::PopularityFallback,
        };
        info!(
            "strategy {} for user {}: {} collaborative + {} content candidates",
            strategy,
            user_id,
            collab.len(),
            content.len()
        );

        let scored: Vec<ScoredPost> = match strategy {
            Strategy::Hybrid => {
                let collab_ids: Vec<PostId> = collab.iter().map(|c| c.post_id).collect();
                let content_ids: Vec<PostId> = content.iter().map(|c| c.post_id).collect();
                fuse(&collab_ids, &content_ids, self.weights, pool)
                    .into_iter()
                    .filter_map(|entry| {
                        self.scored_post(entry.key, entry.combined, entry.collaborative, entry.content)
                    })
                    .collect()
            }
            Strategy::CollaborativeOnly => collab
                .iter()
                .filter_map(|c| self.scored_post(c.post_id, c.score, Some(c.score), None))
                .collect(),
            Strategy::ContentOnly => content
                .iter()
                .filter_map(|c| self.scored_post(c.post_id, c.score, None, Some(c.score)))
                .collect(),
            Strategy::PopularityFallback => {
                return self.popular_posts(user_id, limit, now);
            }
        };

        diversify(scored, limit, now)
            .into_iter()
            .map(|scored| scored.into_recommendation(strategy))
            .collect()
    }

    /// Run both engines concurrently on blocking threads. A panicked engine
    /// task is logged and contributes an empty list.
    async fn generate_candidates(
        &self,
        snapshot: &Arc<ModelSnapshot>,
        profile: &UserProfile,
        interaction_count: usize,
        pool: usize,
    ) -> (Vec<engines::CollabCandidate>, Vec<engines::ContentCandidate>) {
        let collaborative_task = async {
            if interaction_count < self.min_interactions {
                debug!(
                    "skipping collaborative: {} of {} required interactions",
                    interaction_count, self.min_interactions
                );
                return Vec::new();
            }
            let engine = self.collaborative.clone();
            let snapshot = Arc::clone(snapshot);
            let profile = profile.clone();
            match task::spawn_blocking(move || {
                engine.recommend_posts(&snapshot.user_similarity, &profile, pool)
            })
            .await
            {
                Ok(candidates) => candidates,
                Err(error) => {
                    warn!("collaborative engine failed: {error}");
                    Vec::new()
                }
            }
        };

        let content_task = async {
            let engine = self.content.clone();
            let snapshot = Arc::clone(snapshot);
            let profile = profile.clone();
            match task::spawn_blocking(move || {
                engine.recommend_posts(&snapshot.content, &profile, pool)
            })
            .await
            {
                Ok(candidates) => candidates,
                Err(error) => {
                    warn!("content engine failed: {error}");
                    Vec::new()
                }
            }
        };

        tokio::join!(collaborative_task, content_task)
    }

    /// Engagement-counter fallback; still never shows the user their own
    /// posts or anything they already touched.
    fn popular_posts(&self, user_id: UserId, limit: usize, now: i64) -> Vec<Recommendation> {
        let mut seen: HashSet<PostId> = self
            .store
            .get_interactions(user_id)
            .into_iter()
            .map(|interaction| interaction.post_id)
            .collect();
        seen.extend(self.store.get_posts_by_author(user_id));

        let mut posts: Vec<Post> = self
            .store
            .get_posts()
            .into_iter()
            .filter(|post| !seen.contains(&post.id))
            .collect();
        posts.sort_by(|a, b| {
            b.engagement_total()
                .cmp(&a.engagement_total())
                .then_with(|| a.id.cmp(&b.id))
        });
        posts.truncate(limit.saturating_mul(2).max(limit));

        let scored: Vec<ScoredPost> = posts
            .into_iter()
            .map(|post| {
                let location_name = self.location_name_of(&post);
                let score = post.engagement_total() as f32;
                ScoredPost {
                    post,
                    location_name,
                    score,
                    collaborative: None,
                    content: None,
                }
            })
            .collect();

        diversify(scored, limit, now)
            .into_iter()
            .map(|scored| scored.into_recommendation(Strategy::PopularityFallback))
            .collect()
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Accounts the user might want to follow.
    #[instrument(skip(self))]
    pub async fn recommend_accounts(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<AccountRecommendation>> {
        if !self.store.user_exists(user_id) {
            return Err(RecommendError::UserNotFound(user_id));
        }

        let profile = match build_user_profile(self.store.as_ref(), user_id) {
            Ok(profile) => profile,
            Err(error) => {
                warn!("profile build failed: {error:#}");
                return Ok(self.popular_accounts(user_id, limit));
            }
        };

        let pool = limit.saturating_mul(2).max(limit);
        let collaborative = if profile.interaction_count >= self.min_interactions {
            match self.models().await {
                Some(snapshot) => {
                    let engine = self.collaborative.clone();
                    let profile = profile.clone();
                    match task::spawn_blocking(move || {
                        engine.recommend_accounts(&snapshot.user_similarity, &profile, pool)
                    })
                    .await
                    {
                        Ok(candidates) => candidates,
                        Err(error) => {
                            warn!("collaborative account recommendation failed: {error}");
                            Vec::new()
                        }
                    }
                }
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        let content = self.content_based_accounts(&profile, pool);

        let strategy = match (!collaborative.is_empty(), !content.is_empty()) {
            (true, true) => Strategy::Hybrid,
            (true, false) => Strategy::CollaborativeOnly,
            (false, true) => Strategy::ContentOnly,
            (false, false) => return Ok(self.popular_accounts(user_id, limit)),
        };

        let collab_ids: Vec<UserId> = collaborative.iter().map(|c| c.user_id).collect();
        let content_ids: Vec<UserId> = content.iter().map(|&(id, _)| id).collect();
        let merged = merge_by_priority(&collab_ids, &content_ids, ACCOUNT_COLLABORATIVE_SHARE, limit);

        let recommendations = merged
            .into_iter()
            .filter_map(|(candidate_id, source)| {
                let user = self.store.get_user(candidate_id)?;
                let reason = match source {
                    MergeSource::Primary => "Popular among similar travelers",
                    MergeSource::Secondary => "Posts from places you love",
                };
                Some(AccountRecommendation {
                    user_id: candidate_id,
                    username: user.username,
                    bio: preview(&user.bio, BIO_PREVIEW_CHARS),
                    travel_style: user.travel_style,
                    follower_count: self.store.follower_count(candidate_id) as u32,
                    strategy,
                    reason: reason.to_string(),
                })
            })
            .collect();
        Ok(recommendations)
    }

    /// Accounts whose posts sit in the user's preferred places, ranked by
    /// matching post count.
    fn content_based_accounts(&self, profile: &UserProfile, limit: usize) -> Vec<(UserId, u32)> {
        if profile.location_prefs.is_empty() && profile.category_prefs.is_empty() {
            return Vec::new();
        }

        let mut matching: HashMap<UserId, u32> = HashMap::new();
        let mut totals: HashMap<UserId, u32> = HashMap::new();
        for post in self.store.get_posts() {
            if post.author == profile.user_id || profile.following.contains(&post.author) {
                continue;
            }
            *totals.entry(post.author).or_insert(0) += 1;

            let Some(location) = post.location.and_then(|id| self.store.get_location(id)) else {
                continue;
            };
            if profile.location_prefs.contains_key(&location.name)
                || profile.category_prefs.contains_key(&location.category)
            {
                *matching.entry(post.author).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<(UserId, u32)> = matching.into_iter().collect();
        candidates.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| {
                    totals
                        .get(&b.0)
                        .copied()
                        .unwrap_or(0)
                        .cmp(&totals.get(&a.0).copied().unwrap_or(0))
                })
                .then_with(|| a.0.cmp(&b.0))
        });
        candidates.truncate(limit);
        candidates
    }

    fn popular_accounts(&self, user_id: UserId, limit: usize) -> Vec<AccountRecommendation> {
        let following: HashSet<UserId> = self.store.get_following(user_id).into_iter().collect();

        let mut ranked: Vec<(social_store::User, usize, usize)> = self
            .store
            .get_users()
            .into_iter()
            .filter(|user| user.id != user_id && !following.contains(&user.id))
            .map(|user| {
                let followers = self.store.follower_count(user.id);
                let posts = self.store.get_posts_by_author(user.id).len();
                (user, followers, posts)
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .map(|(user, followers, _)| AccountRecommendation {
                user_id: user.id,
                username: user.username,
                bio: preview(&user.bio, BIO_PREVIEW_CHARS),
                travel_style: user.travel_style,
                follower_count: followers as u32,
                strategy: Strategy::PopularityFallback,
                reason: "Popular traveler".to_string(),
            })
            .collect()
    }

    // =========================================================================
    // Destinations
    // =========================================================================

    /// Destinations the user might want to travel to next. Content-first,
    /// with a capped boost for places similar travelers engage with.
    #[instrument(skip(self))]
    pub async fn recommend_destinations(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<DestinationRecommendation>> {
        if !self.store.user_exists(user_id) {
            return Err(RecommendError::UserNotFound(user_id));
        }

        let profile = match build_user_profile(self.store.as_ref(), user_id) {
            Ok(profile) => profile,
            Err(error) => {
                warn!("profile build failed: {error:#}");
                return Ok(self.popular_destinations(limit));
            }
        };

        let engine = self.content.clone();
        let profile_for_engine = profile.clone();
        let destinations = match task::spawn_blocking(move || {
            engine.recommend_destinations(&profile_for_engine, limit)
        })
        .await
        {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!("destination engine failed: {error}");
                Vec::new()
            }
        };

        if destinations.is_empty() {
            return Ok(self.popular_destinations(limit));
        }

        let boosts = self.neighbor_location_boosts(user_id).await;
        let mut recommendations: Vec<DestinationRecommendation> = destinations
            .into_iter()
            .map(|candidate| {
                let boost = boosts.get(&candidate.location.name).copied().unwrap_or(0.0);
                let mut reasons = candidate.reasons;
                let strategy = if boost > 0.0 {
                    reasons.push("Popular among travelers like you".to_string());
                    Strategy::Hybrid
                } else {
                    Strategy::ContentOnly
                };
                DestinationRecommendation {
                    location: candidate.location,
                    score: candidate.score + boost,
                    collaborative_boost: (boost > 0.0).then_some(boost),
                    post_count: candidate.post_count,
                    reasons,
                    strategy,
                }
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.location.id.cmp(&b.location.id))
        });
        Ok(recommendations)
    }

    /// Engagement of the closest neighbors per location name, capped at
    /// min(count / 10, 2.0).
    async fn neighbor_location_boosts(&self, user_id: UserId) -> HashMap<String, f32> {
        let Some(snapshot) = self.models().await else {
            return HashMap::new();
        };
        let neighbors =
            self.collaborative
                .find_similar_users(&snapshot.user_similarity, user_id, DESTINATION_NEIGHBORS * 2);

        let mut counts: HashMap<String, u32> = HashMap::new();
        for (neighbor_id, _) in neighbors.into_iter().take(DESTINATION_NEIGHBORS) {
            for interaction in self.store.get_interactions(neighbor_id) {
                let location = self
                    .store
                    .get_post(interaction.post_id)
                    .and_then(|post| post.location)
                    .and_then(|id| self.store.get_location(id));
                if let Some(location) = location {
                    *counts.entry(location.name).or_insert(0) += 1;
                }
            }
        }

        counts
            .into_iter()
            .map(|(name, count)| (name, (count as f32 / 10.0).min(2.0)))
            .collect()
    }

    fn popular_destinations(&self, limit: usize) -> Vec<DestinationRecommendation> {
        let mut post_counts: HashMap<u32, u32> = HashMap::new();
        let mut engagement: HashMap<u32, u64> = HashMap::new();
        for post in self.store.get_posts() {
            if let Some(location_id) = post.location {
                *post_counts.entry(location_id).or_insert(0) += 1;
                *engagement.entry(location_id).or_insert(0) += post.engagement_total() as u64;
            }
        }

        let mut ranked: Vec<DestinationRecommendation> = self
            .store
            .get_locations()
            .into_iter()
            .map(|location| {
                let posts = post_counts.get(&location.id).copied().unwrap_or(0);
                let total = engagement.get(&location.id).copied().unwrap_or(0);
                DestinationRecommendation {
                    location,
                    score: total as f32,
                    collaborative_boost: None,
                    post_count: posts,
                    reasons: vec!["Popular destination".to_string()],
                    strategy: Strategy::PopularityFallback,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.post_count.cmp(&a.post_count))
                .then_with(|| a.location.id.cmp(&b.location.id))
        });
        ranked.truncate(limit);
        ranked
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Which strategy the next post request would start from, and why.
    pub fn explain_strategy(&self, user_id: UserId) -> Result<StrategyReport> {
        if !self.store.user_exists(user_id) {
            return Err(RecommendError::UserNotFound(user_id));
        }

        let interaction_count = self.store.get_interactions(user_id).len();
        let (strategy, description) = if interaction_count >= self.min_interactions {
            (
                Strategy::Hybrid,
                format!(
                    "{} recorded interactions, enough for collaborative filtering alongside content matching",
                    interaction_count
                ),
            )
        } else {
            (
                Strategy::ContentOnly,
                format!(
                    "{} of the {} interactions needed for collaborative filtering; ranking on content until then",
                    interaction_count, self.min_interactions
                ),
            )
        };

        Ok(StrategyReport {
            user_id,
            interaction_count,
            strategy,
            min_interactions_for_collaborative: self.min_interactions,
            description,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn models(&self) -> Option<Arc<ModelSnapshot>> {
        let cache = Arc::clone(&self.cache);
        match task::spawn_blocking(move || cache.snapshot()).await {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!("model snapshot build failed: {error}");
                None
            }
        }
    }

    fn scored_post(
        &self,
        post_id: PostId,
        score: f32,
        collaborative: Option<f32>,
        content: Option<f32>,
    ) -> Option<ScoredPost> {
        let post = self.store.get_post(post_id)?;
        let location_name = self.location_name_of(&post);
        Some(ScoredPost {
            post,
            location_name,
            score,
            collaborative,
            content,
        })
    }

    fn location_name_of(&self, post: &Post) -> Option<String> {
        post.location
            .and_then(|id| self.store.get_location(id))
            .map(|location| location.name)
    }
}

/// A candidate with everything the diversity pass and the output record
/// need.
struct ScoredPost {
    post: Post,
    location_name: Option<String>,
    score: f32,
    collaborative: Option<f32>,
    content: Option<f32>,
}

impl ScoredPost {
    fn into_recommendation(self, strategy: Strategy) -> Recommendation {
        let reason = reason_for(strategy, self.collaborative.is_some(), self.content.is_some());
        Recommendation {
            post_id: self.post.id,
            author: self.post.author,
            caption: preview(&self.post.caption, CAPTION_PREVIEW_CHARS),
            location: self.location_name,
            score: self.score,
            collaborative_score: self.collaborative,
            content_score: self.content,
            strategy,
            reason: reason.to_string(),
        }
    }
}

impl DiversityItem for ScoredPost {
    fn item_id(&self) -> PostId {
        self.post.id
    }
    fn author_id(&self) -> UserId {
        self.post.author
    }
    fn location_name(&self) -> Option<&str> {
        self.location_name.as_deref()
    }
    fn media_kind(&self) -> MediaKind {
        self.post.media
    }
    fn created_at(&self) -> i64 {
        self.post.created_at
    }
    fn base_score(&self) -> f32 {
        self.score
    }
}

fn reason_for(strategy: Strategy, from_collaborative: bool, from_content: bool) -> &'static str {
    match strategy {
        Strategy::Hybrid => {
            if from_collaborative && from_content {
                "Matches both your behavior and interests"
            } else if from_collaborative {
                "Similar travelers loved this"
            } else {
                "Matches your travel preferences"
            }
        }
        Strategy::CollaborativeOnly => "Similar travelers loved this",
        Strategy::ContentOnly => "Matches your travel preferences",
        Strategy::PopularityFallback => "Popular content",
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
