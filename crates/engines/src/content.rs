//! Content-based filtering over TF-IDF post features.
//!
//! "More like what you already engaged with."
//!
//! ## Algorithm
//! 1. Fold each post's caption, place metadata, tags, author travel style,
//!    and media kind into one feature document; categorical terms are
//!    replicated to encode importance (location name x5, category x4,
//!    country x3, continent x2, tags x2)
//! 2. Vectorize with TF-IDF and compute post-post cosine similarity
//! 3. Seed from the user's most recent interactions, weight each seed's
//!    similar posts by the seed interaction kind, add a preference bonus for
//!    places the user already leans toward, and accumulate per candidate
//!
//! A second mode aggregates by location instead of post and recommends
//! destinations.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use social_store::{InteractionStore, LocationId, LocationInfo, Post, PostId};
use tracing::{debug, instrument};

use crate::matrix::SimilarityMatrix;
use crate::profile::UserProfile;
use crate::text::{TfIdfConfig, TfIdfVectorizer, normalize_text};

// Replication factors for categorical feature terms
const LOCATION_REPEAT: usize = 5;
const CATEGORY_REPEAT: usize = 4;
const COUNTRY_REPEAT: usize = 3;
const CONTINENT_REPEAT: usize = 2;
const TAG_REPEAT: usize = 2;

// Preference-bonus multipliers for post candidates
const LOCATION_BONUS: f32 = 0.3;
const CATEGORY_BONUS: f32 = 0.4;
const COUNTRY_BONUS: f32 = 0.2;

// Preference weights for destination scoring
const DEST_CATEGORY_WEIGHT: f32 = 4.0;
const DEST_COUNTRY_WEIGHT: f32 = 3.0;
const DEST_CONTINENT_WEIGHT: f32 = 2.0;

/// A post surfaced through feature similarity.
#[derive(Debug, Clone)]
pub struct ContentCandidate {
    pub post_id: PostId,
    pub score: f32,
}

/// A destination surfaced through location preference aggregation.
#[derive(Debug, Clone)]
pub struct DestinationCandidate {
    pub location: LocationInfo,
    pub score: f32,
    pub post_count: u32,
    /// Average engagement per post at this location
    pub popularity: f32,
    pub reasons: Vec<String>,
}

/// TF-IDF features and post-post similarity for the current post corpus.
#[derive(Debug, Clone)]
pub struct ContentFeatures {
    pub post_ids: Vec<PostId>,
    /// L2-normalized sparse rows, aligned with `post_ids`
    pub vectors: Vec<Vec<(usize, f32)>>,
    pub vocab: Vec<String>,
}

/// Built model: the similarity table the recommenders query.
#[derive(Debug, Clone)]
pub struct ContentModel {
    similarity: SimilarityMatrix,
    vocab_size: usize,
}

impl ContentModel {
    pub fn is_empty(&self) -> bool {
        self.similarity.is_empty()
    }

    pub fn post_count(&self) -> usize {
        self.similarity.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

/// Feature-similarity candidate generator.
#[derive(Clone)]
pub struct ContentEngine {
    store: Arc<dyn InteractionStore>,
    vectorizer: TfIdfVectorizer,

    /// Similar posts pulled per seed interaction
    similar_per_seed: usize,
}

impl ContentEngine {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self {
            store,
            vectorizer: TfIdfVectorizer::default(),
            similar_per_seed: 20,
        }
    }

    /// Configure the vectorizer (vocabulary cap, df cutoffs)
    pub fn with_vectorizer(mut self, config: TfIdfConfig) -> Self {
        self.vectorizer = TfIdfVectorizer::new(config);
        self
    }

    /// Configure similar posts pulled per seed (default: 20)
    pub fn with_similar_per_seed(mut self, count: usize) -> Self {
        self.similar_per_seed = count;
        self
    }

    /// Build replicated feature documents and vectorize the corpus.
    #[instrument(skip(self))]
    pub fn build_content_features(&self) -> ContentFeatures {
        let posts = self.store.get_posts();
        let docs: Vec<String> = posts.iter().map(|post| self.feature_document(post)).collect();
        let output = self.vectorizer.fit_transform(&docs);

        debug!(
            "content features built: {} posts, {} vocabulary terms",
            posts.len(),
            output.vocab.len()
        );

        ContentFeatures {
            post_ids: posts.iter().map(|post| post.id).collect(),
            vectors: output.vectors,
            vocab: output.vocab,
        }
    }

    /// Post-post cosine similarity over feature vectors.
    pub fn compute_content_similarity(&self, features: &ContentFeatures) -> SimilarityMatrix {
        SimilarityMatrix::from_sparse_rows(features.post_ids.clone(), &features.vectors)
    }

    /// Features plus similarity in one step.
    pub fn build_model(&self) -> ContentModel {
        let features = self.build_content_features();
        let vocab_size = features.vocab.len();
        ContentModel {
            similarity: self.compute_content_similarity(&features),
            vocab_size,
        }
    }

    /// Most similar posts to `post_id`, positive similarity only, ties on
    /// ascending post id. Empty when the post is not in the model.
    pub fn find_similar_posts(
        &self,
        model: &ContentModel,
        post_id: PostId,
        n: usize,
    ) -> Vec<(PostId, f32)> {
        let mut similar: Vec<(PostId, f32)> = model
            .similarity
            .neighbors(post_id)
            .into_iter()
            .filter(|&(_, sim)| sim > 0.0)
            .collect();

        similar.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        similar.truncate(n);
        similar
    }

    /// Generate post candidates from the user's recent engagement.
    ///
    /// No history means no candidates; the combiner falls back.
    #[instrument(skip(self, model, profile), fields(user_id = profile.user_id))]
    pub fn recommend_posts(
        &self,
        model: &ContentModel,
        profile: &UserProfile,
        limit: usize,
    ) -> Vec<ContentCandidate> {
        if model.is_empty() || profile.recent_interactions.is_empty() {
            debug!("no content model or no history");
            return Vec::new();
        }

        let mut scores: HashMap<PostId, f32> = HashMap::new();
        for interaction in &profile.recent_interactions {
            let seed_weight = interaction.kind.weight();
            for (candidate_id, similarity) in
                self.find_similar_posts(model, interaction.post_id, self.similar_per_seed)
            {
                if profile.seen_posts.contains(&candidate_id) {
                    continue;
                }
                let bonus = self.preference_bonus(candidate_id, profile);
                *scores.entry(candidate_id).or_insert(0.0) += similarity * seed_weight + bonus;
            }
        }

        let mut candidates: Vec<ContentCandidate> = scores
            .into_iter()
            .map(|(post_id, score)| ContentCandidate { post_id, score })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.post_id.cmp(&b.post_id))
        });
        candidates.truncate(limit);

        debug!("generated {} content candidates", candidates.len());
        candidates
    }

    /// Recommend unvisited destinations from normalized place preferences
    /// plus a capped popularity term.
    #[instrument(skip(self, profile), fields(user_id = profile.user_id))]
    pub fn recommend_destinations(
        &self,
        profile: &UserProfile,
        limit: usize,
    ) -> Vec<DestinationCandidate> {
        let total_engagement: f32 = profile.location_prefs.values().sum();
        if total_engagement <= 0.0 {
            debug!("no location engagement");
            return Vec::new();
        }

        // Per-location post and engagement aggregates
        let mut post_counts: HashMap<LocationId, u32> = HashMap::new();
        let mut engagement: HashMap<LocationId, u64> = HashMap::new();
        for post in self.store.get_posts() {
            if let Some(location_id) = post.location {
                *post_counts.entry(location_id).or_insert(0) += 1;
                *engagement.entry(location_id).or_insert(0) += post.engagement_total() as u64;
            }
        }

        let normalized = |prefs: &HashMap<String, f32>, key: &str| -> f32 {
            prefs.get(key).map(|w| w / total_engagement).unwrap_or(0.0)
        };

        let mut candidates = Vec::new();
        for location in self.store.get_locations() {
            if profile.visited_locations.contains(&location.name) {
                continue;
            }
            let post_count = post_counts.get(&location.id).copied().unwrap_or(0);
            if post_count == 0 {
                continue;
            }
            let popularity =
                engagement.get(&location.id).copied().unwrap_or(0) as f32 / post_count as f32;

            let mut score = 0.0;
            let mut reasons = Vec::new();

            let category_pref = normalized(&profile.category_prefs, &location.category);
            if category_pref > 0.0 {
                score += category_pref * DEST_CATEGORY_WEIGHT;
                reasons.push(format!(
                    "You love {} destinations",
                    location.category.to_lowercase()
                ));
            }
            let country_pref = normalized(&profile.country_prefs, &location.country);
            if country_pref > 0.0 {
                score += country_pref * DEST_COUNTRY_WEIGHT;
                reasons.push(format!("You often explore {}", location.country));
            }
            let continent_pref = normalized(&profile.continent_prefs, &location.continent);
            if continent_pref > 0.0 {
                score += continent_pref * DEST_CONTINENT_WEIGHT;
                reasons.push(format!("You enjoy {} travel", location.continent));
            }

            score += (popularity / 10.0).min(1.0);

            if score > 0.0 {
                candidates.push(DestinationCandidate {
                    location,
                    score,
                    post_count,
                    popularity,
                    reasons,
                });
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.location.id.cmp(&b.location.id))
        });
        candidates.truncate(limit);

        debug!("generated {} destination candidates", candidates.len());
        candidates
    }

    /// Boost for candidates whose place matches the user's preferences.
    /// Profile weights are kind-weight sums, so the replication dominance
    /// (location over category over country) carries through.
    fn preference_bonus(&self, post_id: PostId, profile: &UserProfile) -> f32 {
        let Some(post) = self.store.get_post(post_id) else {
            return 0.0;
        };
        let Some(location) = post.location.and_then(|id| self.store.get_location(id)) else {
            return 0.0;
        };

        let mut bonus = 0.0;
        if let Some(weight) = profile.location_prefs.get(&location.name) {
            bonus += weight * LOCATION_BONUS;
        }
        if let Some(weight) = profile.country_prefs.get(&location.country) {
            bonus += weight * COUNTRY_BONUS;
        }
        if let Some(weight) = profile.category_prefs.get(&location.category) {
            bonus += weight * CATEGORY_BONUS;
        }
        bonus
    }

    fn feature_document(&self, post: &Post) -> String {
        let mut parts: Vec<String> = Vec::new();

        let caption = normalize_text(&post.caption);
        if !caption.is_empty() {
            parts.push(caption);
        }

        if let Some(location) = post.location.and_then(|id| self.store.get_location(id)) {
            push_repeated(&mut parts, &location.name, LOCATION_REPEAT);
            push_repeated(&mut parts, &location.country, COUNTRY_REPEAT);
            push_repeated(&mut parts, &location.continent, CONTINENT_REPEAT);
            push_repeated(&mut parts, &location.category, CATEGORY_REPEAT);
        }

        for tag in &post.tags {
            push_repeated(&mut parts, tag, TAG_REPEAT);
        }

        if let Some(style) = self.store.get_user(post.author).and_then(|u| u.travel_style) {
            push_repeated(&mut parts, &style, 1);
        }

        parts.push(post.media.as_str().to_string());
        parts.join(" ")
    }
}

fn push_repeated(parts: &mut Vec<String>, raw: &str, times: usize) {
    let normalized = normalize_text(raw);
    if normalized.is_empty() {
        return;
    }
    parts.extend(std::iter::repeat(normalized).take(times));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::build_user_profile;
    use social_store::{
        Interaction, InteractionKind, MediaKind, MemoryStore, User, UserId,
    };

    fn user(id: UserId, style: Option<&str>) -> User {
        User {
            id,
            username: format!("user{}", id),
            bio: String::new(),
            home_location: String::new(),
            travel_style: style.map(|s| s.to_string()),
        }
    }

    fn located_post(id: PostId, author: UserId, caption: &str, location: Option<LocationId>, tags: &[&str]) -> Post {
        Post {
            id,
            author,
            caption: caption.to_string(),
            location,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            media: MediaKind::Image,
            created_at: 0,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
        }
    }

    /// Target user 1 engages with two Goa beach posts. Posts 13 (Bali,
    /// beach) and 12/14 (Alps, mountains) are unseen.
    fn create_test_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_user(user(1, Some("Beach")));
        store.insert_user(user(2, None));
        store.insert_user(user(3, None));

        store.insert_location(LocationInfo {
            id: 1,
            name: "Goa".to_string(),
            country: "India".to_string(),
            continent: "Asia".to_string(),
            category: "Beach".to_string(),
        });
        store.insert_location(LocationInfo {
            id: 2,
            name: "Interlaken".to_string(),
            country: "Switzerland".to_string(),
            continent: "Europe".to_string(),
            category: "Mountains".to_string(),
        });
        store.insert_location(LocationInfo {
            id: 3,
            name: "Bali".to_string(),
            country: "Indonesia".to_string(),
            continent: "Asia".to_string(),
            category: "Beach".to_string(),
        });

        store.insert_post(located_post(10, 2, "Golden sands and palm trees", Some(1), &["beach", "sunset"]));
        store.insert_post(located_post(11, 2, "Quiet beach evening", Some(1), &["beach"]));
        store.insert_post(located_post(12, 2, "Snowy peaks and alpine air", Some(2), &["mountains", "hiking"]));
        store.insert_post(located_post(13, 2, "Surfing the reef break", Some(3), &["beach", "surf"]));
        store.insert_post(located_post(14, 2, "Glacier hike above the valley", Some(2), &["mountains"]));

        store.insert_interaction(Interaction {
            user_id: 1,
            post_id: 10,
            kind: InteractionKind::Like,
            timestamp: 100,
        });
        store.insert_interaction(Interaction {
            user_id: 1,
            post_id: 11,
            kind: InteractionKind::Comment,
            timestamp: 200,
        });

        // Background engagement from another user
        for post_id in [12, 13, 14] {
            store.insert_interaction(Interaction {
                user_id: 3,
                post_id,
                kind: InteractionKind::Like,
                timestamp: 50,
            });
        }

        store
    }

    fn engine() -> (ContentEngine, MemoryStore) {
        let arc: Arc<dyn InteractionStore> = Arc::new(create_test_store());
        (ContentEngine::new(arc), create_test_store())
    }

    #[test]
    fn test_same_place_posts_are_most_similar() {
        let (engine, _) = engine();
        let model = engine.build_model();
        assert!(!model.is_empty());
        assert!(model.vocab_size() > 0);

        let similar = engine.find_similar_posts(&model, 10, 5);
        assert!(!similar.is_empty());
        // The other Goa beach post dominates
        assert_eq!(similar[0].0, 11);
    }

    #[test]
    fn test_recommend_posts_prefers_matching_category() {
        let (engine, store) = engine();
        let model = engine.build_model();
        let profile = build_user_profile(&store, 1).unwrap();

        let candidates = engine.recommend_posts(&model, &profile, 10);
        assert!(!candidates.is_empty());
        // The unseen beach post outranks the mountain posts
        assert_eq!(candidates[0].post_id, 13);

        let ids: Vec<PostId> = candidates.iter().map(|c| c.post_id).collect();
        assert!(!ids.contains(&10));
        assert!(!ids.contains(&11));
    }

    #[test]
    fn test_no_history_means_no_candidates() {
        let (engine, store) = engine();
        let model = engine.build_model();

        // User 2 authored everything but engaged with nothing
        let authored_profile = build_user_profile(&store, 2).unwrap();
        assert!(engine.recommend_posts(&model, &authored_profile, 10).is_empty());
    }

    #[test]
    fn test_preference_bonus_uses_kind_weights() {
        let (engine, store) = engine();
        let profile = build_user_profile(&store, 1).unwrap();

        // Goa preference: like (1.0) + comment (2.0) = 3.0
        // Post 13 (Bali): category Beach matches at 3.0 * 0.4
        let bonus = engine.preference_bonus(13, &profile);
        assert!((bonus - 3.0 * CATEGORY_BONUS).abs() < 1e-6);

        // Post 12 (Interlaken) matches nothing
        assert_eq!(engine.preference_bonus(12, &profile), 0.0);
    }

    #[test]
    fn test_recommend_destinations_excludes_visited() {
        let (engine, store) = engine();
        let profile = build_user_profile(&store, 1).unwrap();

        let destinations = engine.recommend_destinations(&profile, 10);
        let names: Vec<&str> = destinations
            .iter()
            .map(|d| d.location.name.as_str())
            .collect();

        assert!(!names.contains(&"Goa"));
        assert_eq!(names[0], "Bali");
        assert!(destinations[0].score > destinations[1].score);
        assert!(
            destinations[0]
                .reasons
                .iter()
                .any(|r| r.contains("beach destinations"))
        );
    }

    #[test]
    fn test_destinations_empty_without_location_engagement() {
        let (engine, store) = engine();
        let profile = build_user_profile(&store, 3).unwrap();

        // User 3 engaged with located posts, so has destinations
        assert!(!engine.recommend_destinations(&profile, 10).is_empty());

        // A user with no engagement at all gets none
        let mut bare = MemoryStore::new();
        bare.insert_user(user(9, None));
        let bare_profile = build_user_profile(&bare, 9).unwrap();
        assert!(engine.recommend_destinations(&bare_profile, 10).is_empty());
    }

    #[test]
    fn test_feature_document_replicates_metadata() {
        let (engine, store) = engine();
        let post = store.get_post(10).unwrap();
        let doc = engine.feature_document(&post);

        assert_eq!(doc.matches("goa").count(), 5);
        assert_eq!(doc.matches("india").count(), 3);
        assert_eq!(doc.matches("beach").count(), 4 + 2); // category x4 + tag x2
        assert!(doc.contains("image"));
    }
}
