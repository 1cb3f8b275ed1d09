//! Memoized model snapshots.
//!
//! Matrix construction and similarity computation are the expensive part of
//! a request, and they only change when the feed grows. The cache keeps one
//! immutable [`ModelSnapshot`] behind an `RwLock<Arc<...>>`: readers clone
//! the `Arc` and compute against a consistent set of matrices, rebuilds
//! construct a complete new snapshot outside the lock and swap it in. A
//! reader never observes a half-built matrix.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use engines::{CollaborativeEngine, ContentEngine, ContentModel, InteractionMatrix, SimilarityMatrix};
use social_store::InteractionStore;
use tracing::{debug, info};

/// One consistent set of derived models for a feed snapshot.
pub struct ModelSnapshot {
    pub interactions: InteractionMatrix,
    pub user_similarity: SimilarityMatrix,
    pub content: ContentModel,
    interactions_at_build: usize,
    built_at: Instant,
}

/// Single-writer, multi-reader cache with rebuild-on-staleness.
pub struct ModelCache {
    store: Arc<dyn InteractionStore>,
    collaborative: CollaborativeEngine,
    content: ContentEngine,
    current: RwLock<Option<Arc<ModelSnapshot>>>,

    /// Rebuild once this many interactions arrive after a build
    staleness_threshold: usize,
    /// Rebuild once a snapshot is older than this
    max_age: Duration,
}

impl ModelCache {
    pub fn new(
        store: Arc<dyn InteractionStore>,
        collaborative: CollaborativeEngine,
        content: ContentEngine,
    ) -> Self {
        Self {
            store,
            collaborative,
            content,
            current: RwLock::new(None),
            staleness_threshold: 100,
            max_age: Duration::from_secs(300),
        }
    }

    /// Configure the interaction-growth rebuild threshold (default: 100)
    pub fn with_staleness_threshold(mut self, threshold: usize) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// Configure the maximum snapshot age (default: 300s)
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Current snapshot, rebuilding first if stale or cold.
    ///
    /// Concurrent callers may race to rebuild; every rebuild installs a
    /// complete snapshot, so the race only costs duplicate work.
    pub fn snapshot(&self) -> Arc<ModelSnapshot> {
        if let Some(snapshot) = self.fresh() {
            return snapshot;
        }
        self.rebuild()
    }

    fn fresh(&self) -> Option<Arc<ModelSnapshot>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        let snapshot = guard.as_ref()?;

        let grown = self
            .store
            .interaction_count()
            .saturating_sub(snapshot.interactions_at_build);
        if grown > self.staleness_threshold {
            debug!("snapshot stale: {} new interactions", grown);
            return None;
        }
        if snapshot.built_at.elapsed() > self.max_age {
            debug!("snapshot stale: older than {:?}", self.max_age);
            return None;
        }
        Some(Arc::clone(snapshot))
    }

    /// Build a complete new snapshot and swap it in.
    pub fn rebuild(&self) -> Arc<ModelSnapshot> {
        let started = Instant::now();
        let interactions_at_build = self.store.interaction_count();

        let interactions = self.collaborative.build_interaction_matrix();
        let user_similarity = self.collaborative.compute_user_similarity(&interactions);
        let content = self.content.build_model();

        let snapshot = Arc::new(ModelSnapshot {
            interactions,
            user_similarity,
            content,
            interactions_at_build,
            built_at: Instant::now(),
        });

        info!(
            "model snapshot rebuilt in {:?}: {} engaging users, {} posts in content model",
            started.elapsed(),
            snapshot.interactions.user_count(),
            snapshot.content.post_count()
        );

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Drop the cached snapshot; the next read rebuilds.
    pub fn invalidate(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
