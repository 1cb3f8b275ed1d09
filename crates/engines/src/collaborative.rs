//! Collaborative filtering over the user-user similarity matrix.
//!
//! "Travelers who engaged with what you engaged with also engaged with
//! these."
//!
//! ## Algorithm
//! 1. Build the weighted user-post interaction matrix
//! 2. Compute user-user cosine similarity
//! 3. Take the top-K positive-similarity neighbors of the target user
//! 4. Collect everything those neighbors engaged with that the target has
//!    not touched or authored
//! 5. Score each candidate by neighbor interaction count times the average
//!    interaction weight, descending
//!
//! The same neighbor set drives account recommendation: accounts the
//! neighbors follow, ranked by follow frequency.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use social_store::{InteractionStore, PostId, UserId};
use tracing::{debug, instrument};

use crate::matrix::{self, InteractionMatrix, SimilarityMatrix};
use crate::profile::UserProfile;

/// A post surfaced through neighbor engagement.
#[derive(Debug, Clone)]
pub struct CollabCandidate {
    pub post_id: PostId,
    pub score: f32,
    /// How many neighbor interactions contributed to the score
    pub neighbor_interactions: u32,
}

/// An account surfaced through the neighbor follow graph.
#[derive(Debug, Clone)]
pub struct AccountCandidate {
    pub user_id: UserId,
    /// How many neighbors follow this account
    pub follow_count: u32,
}

/// Neighbor-based candidate generator.
#[derive(Clone)]
pub struct CollaborativeEngine {
    store: Arc<dyn InteractionStore>,

    /// Neighbor pool considered before the rotation window is applied
    neighbor_pool: usize,

    /// Neighbors actually consulted for post candidates
    neighbor_take: usize,

    /// Neighbors consulted for account candidates
    account_neighbors: usize,

    /// Deterministic freshness: the neighbor pool is rotated left by
    /// `rotation_bucket % pool_len` before the take. Zero keeps the window
    /// fixed. Callers that want rotation derive the bucket from a coarse
    /// clock (for example, hours since the epoch) so repeated calls inside
    /// one bucket return identical output.
    rotation_bucket: u64,
}

impl CollaborativeEngine {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self {
            store,
            neighbor_pool: 20,
            neighbor_take: 10,
            account_neighbors: 15,
            rotation_bucket: 0,
        }
    }

    /// Configure the neighbor pool size (default: 20)
    pub fn with_neighbor_pool(mut self, pool: usize) -> Self {
        self.neighbor_pool = pool;
        self
    }

    /// Configure how many neighbors are consulted (default: 10)
    pub fn with_neighbor_take(mut self, take: usize) -> Self {
        self.neighbor_take = take;
        self
    }

    /// Configure the account-recommendation neighbor count (default: 15)
    pub fn with_account_neighbors(mut self, count: usize) -> Self {
        self.account_neighbors = count;
        self
    }

    /// Configure the rotation bucket (default: 0, no rotation)
    pub fn with_rotation_bucket(mut self, bucket: u64) -> Self {
        self.rotation_bucket = bucket;
        self
    }

    /// Aggregate the current event log into a weighted interaction matrix.
    pub fn build_interaction_matrix(&self) -> InteractionMatrix {
        InteractionMatrix::build(self.store.as_ref())
    }

    /// User-user cosine similarity over interaction rows.
    pub fn compute_user_similarity(&self, interactions: &InteractionMatrix) -> SimilarityMatrix {
        matrix::user_similarity(interactions)
    }

    /// Top-k most similar users, excluding the target. Only positive
    /// similarities qualify; ties break on ascending user id.
    pub fn find_similar_users(
        &self,
        similarity: &SimilarityMatrix,
        user_id: UserId,
        k: usize,
    ) -> Vec<(UserId, f32)> {
        let mut neighbors: Vec<(UserId, f32)> = similarity
            .neighbors(user_id)
            .into_iter()
            .filter(|&(_, sim)| sim > 0.0)
            .collect();

        neighbors.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        neighbors.truncate(k);
        neighbors
    }

    /// Generate post candidates for the profiled user.
    ///
    /// Users with no matrix row, or no positive-similarity neighbors, get an
    /// empty list; the combiner treats that as a fallback signal, not an
    /// error.
    #[instrument(skip(self, similarity, profile), fields(user_id = profile.user_id))]
    pub fn recommend_posts(
        &self,
        similarity: &SimilarityMatrix,
        profile: &UserProfile,
        limit: usize,
    ) -> Vec<CollabCandidate> {
        let mut neighbors = self.find_similar_users(similarity, profile.user_id, self.neighbor_pool);
        if neighbors.is_empty() {
            debug!("no positive-similarity neighbors");
            return Vec::new();
        }

        if self.rotation_bucket > 0 {
            let shift = (self.rotation_bucket as usize) % neighbors.len();
            neighbors.rotate_left(shift);
        }
        neighbors.truncate(self.neighbor_take);

        let mut tallies: HashMap<PostId, (u32, f32)> = HashMap::new();
        for &(neighbor_id, _) in &neighbors {
            for interaction in self.store.get_interactions(neighbor_id) {
                if profile.seen_posts.contains(&interaction.post_id) {
                    continue;
                }
                let entry = tallies.entry(interaction.post_id).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += interaction.kind.weight();
            }
        }

        let mut candidates: Vec<CollabCandidate> = tallies
            .into_iter()
            .map(|(post_id, (count, weight_sum))| {
                let avg_weight = weight_sum / count as f32;
                CollabCandidate {
                    post_id,
                    score: count as f32 * avg_weight,
                    neighbor_interactions: count,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.post_id.cmp(&b.post_id))
        });
        candidates.truncate(limit);

        debug!(
            "generated {} collaborative candidates from {} neighbors",
            candidates.len(),
            neighbors.len()
        );
        candidates
    }

    /// Recommend accounts to follow: accounts followed by similar users,
    /// minus accounts already followed and the user themself, ranked by
    /// neighbor follow frequency.
    #[instrument(skip(self, similarity, profile), fields(user_id = profile.user_id))]
    pub fn recommend_accounts(
        &self,
        similarity: &SimilarityMatrix,
        profile: &UserProfile,
        limit: usize,
    ) -> Vec<AccountCandidate> {
        let neighbors =
            self.find_similar_users(similarity, profile.user_id, self.account_neighbors);
        if neighbors.is_empty() {
            return Vec::new();
        }

        let mut follow_counts: HashMap<UserId, u32> = HashMap::new();
        for &(neighbor_id, _) in &neighbors {
            for followed in self.store.get_following(neighbor_id) {
                if followed == profile.user_id || profile.following.contains(&followed) {
                    continue;
                }
                *follow_counts.entry(followed).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<AccountCandidate> = follow_counts
            .into_iter()
            .map(|(user_id, follow_count)| AccountCandidate {
                user_id,
                follow_count,
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.follow_count
                .cmp(&a.follow_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        candidates.truncate(limit);

        debug!("generated {} account candidates", candidates.len());
        candidates
    }
}
