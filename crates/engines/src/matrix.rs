//! Interaction and similarity matrices.
//!
//! The interaction matrix has one row per engaging user and one column per
//! engaged post; a cell holds the sum of kind weights for that pair. Rows
//! are stored sparse, most cells are zero by construction. Similarity
//! matrices are square, symmetric, and derived from either interaction rows
//! (user-user) or TF-IDF feature vectors (post-post) via cosine similarity.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use social_store::{InteractionStore, PostId, UserId};
use tracing::debug;

/// Weighted user-by-post engagement matrix.
///
/// Both axes are sorted ascending by id, so iteration order is stable for a
/// given event log snapshot. Users and posts with no recorded engagement do
/// not appear at all.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    user_ids: Vec<UserId>,
    post_ids: Vec<PostId>,
    user_index: HashMap<UserId, usize>,
    rows: Vec<Vec<(usize, f32)>>,
}

impl InteractionMatrix {
    /// Aggregate the full event log into a weighted matrix.
    pub fn build(store: &dyn InteractionStore) -> Self {
        let interactions = store.get_all_interactions();

        // BTreeMap keys come back sorted by (user, post), which gives both
        // sorted axes and sorted sparse rows in one pass.
        let mut cells: BTreeMap<(UserId, PostId), f32> = BTreeMap::new();
        for interaction in &interactions {
            *cells
                .entry((interaction.user_id, interaction.post_id))
                .or_insert(0.0) += interaction.kind.weight();
        }

        let mut user_ids: Vec<UserId> = cells.keys().map(|&(user, _)| user).collect();
        user_ids.dedup();

        let mut post_ids: Vec<PostId> = cells.keys().map(|&(_, post)| post).collect();
        post_ids.sort_unstable();
        post_ids.dedup();

        let user_index: HashMap<UserId, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();
        let post_index: HashMap<PostId, usize> = post_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut rows: Vec<Vec<(usize, f32)>> = vec![Vec::new(); user_ids.len()];
        for ((user, post), weight) in cells {
            rows[user_index[&user]].push((post_index[&post], weight));
        }

        debug!(
            "interaction matrix built: {} users x {} posts from {} events",
            user_ids.len(),
            post_ids.len(),
            interactions.len()
        );

        Self {
            user_ids,
            post_ids,
            user_index,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.user_ids.len()
    }

    pub fn post_count(&self) -> usize {
        self.post_ids.len()
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn post_ids(&self) -> &[PostId] {
        &self.post_ids
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    /// Sparse row for one user: (column index, summed weight) pairs sorted
    /// by column. `None` if the user has no recorded engagement.
    pub fn row(&self, user_id: UserId) -> Option<&[(usize, f32)]> {
        self.user_index
            .get(&user_id)
            .map(|&idx| self.rows[idx].as_slice())
    }

    /// Summed weight for one (user, post) cell; zero when absent.
    pub fn weight(&self, user_id: UserId, post_id: PostId) -> f32 {
        let Some(row) = self.row(user_id) else {
            return 0.0;
        };
        let Ok(col) = self.post_ids.binary_search(&post_id) else {
            return 0.0;
        };
        row.iter()
            .find(|&&(c, _)| c == col)
            .map(|&(_, w)| w)
            .unwrap_or(0.0)
    }

    pub(crate) fn rows(&self) -> &[Vec<(usize, f32)>] {
        &self.rows
    }
}

/// Square symmetric similarity table over a set of entity ids.
///
/// Diagonal entries are exactly 1.0 and every entry lies in [0, 1]: the
/// underlying vectors are non-negative, so their cosine cannot be negative.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<u32>,
    index: HashMap<u32, usize>,
    rows: Vec<Vec<f32>>,
}

impl SimilarityMatrix {
    /// Compute pairwise cosine similarities over sparse non-negative rows.
    ///
    /// `ids[i]` labels `rows[i]`. Zero rows get similarity 0.0 against
    /// everything except themselves.
    pub fn from_sparse_rows(ids: Vec<u32>, rows: &[Vec<(usize, f32)>]) -> Self {
        let norms: Vec<f32> = rows
            .iter()
            .map(|row| row.iter().map(|&(_, v)| v * v).sum::<f32>().sqrt())
            .collect();

        let n = ids.len();
        let sim_rows: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            1.0
                        } else if norms[i] == 0.0 || norms[j] == 0.0 {
                            0.0
                        } else {
                            (sparse_dot(&rows[i], &rows[j]) / (norms[i] * norms[j]))
                                .clamp(0.0, 1.0)
                        }
                    })
                    .collect()
            })
            .collect();

        let index = ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        Self {
            ids,
            index,
            rows: sim_rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, a: u32, b: u32) -> Option<f32> {
        let &i = self.index.get(&a)?;
        let &j = self.index.get(&b)?;
        Some(self.rows[i][j])
    }

    /// Every other entity with its similarity to `id`, in axis order.
    /// Empty when `id` has no row.
    pub fn neighbors(&self, id: u32) -> Vec<(u32, f32)> {
        let Some(&i) = self.index.get(&id) else {
            return Vec::new();
        };
        self.rows[i]
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, &sim)| (self.ids[j], sim))
            .collect()
    }
}

/// User-user cosine similarity over interaction rows.
pub fn user_similarity(matrix: &InteractionMatrix) -> SimilarityMatrix {
    SimilarityMatrix::from_sparse_rows(matrix.user_ids().to_vec(), matrix.rows())
}

/// Dot product of two sparse vectors sorted by column index.
fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
    let mut total = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (col_a, val_a) = a[i];
        let (col_b, val_b) = b[j];
        match col_a.cmp(&col_b) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                total += val_a * val_b;
                i += 1;
                j += 1;
            }
        }
    }
    total
}
