//! Rank-normalized fusion of independently ranked candidate lists.
//!
//! Each engine hands over its own descending-ordered list. Raw engine
//! scores are not comparable across strategies, so fusion works on rank
//! positions: the item at position `i` of a list of length `len` gets a
//! rank score of `(len - i) / len`, always in (0, 1]. Weighted rank scores
//! are summed, which is what lets an item endorsed by both engines outrank
//! an item a single engine scored higher.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

/// Relative strategy weights for post fusion.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub collaborative: f32,
    pub content: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.6,
            content: 0.4,
        }
    }
}

/// One fused item with its per-strategy rank scores.
#[derive(Debug, Clone, Copy)]
pub struct FusedScore<K> {
    pub key: K,
    pub combined: f32,
    /// Rank score in the collaborative list, if the item appeared there
    pub collaborative: Option<f32>,
    /// Rank score in the content list, if the item appeared there
    pub content: Option<f32>,
}

/// Rank score of position `index` in a list of `len` items.
fn rank_score(index: usize, len: usize) -> f32 {
    (len - index) as f32 / len as f32
}

/// Fuse two descending-ordered candidate lists.
///
/// Output is ordered by combined score descending; exact ties break on the
/// key, ascending, so repeated calls agree. Truncated to `limit`.
pub fn fuse<K>(
    collaborative: &[K],
    content: &[K],
    weights: FusionWeights,
    limit: usize,
) -> Vec<FusedScore<K>>
where
    K: Copy + Ord + Hash,
{
    let mut fused: HashMap<K, FusedScore<K>> = HashMap::new();

    for (index, &key) in collaborative.iter().enumerate() {
        let score = rank_score(index, collaborative.len());
        fused.insert(
            key,
            FusedScore {
                key,
                combined: score * weights.collaborative,
                collaborative: Some(score),
                content: None,
            },
        );
    }

    for (index, &key) in content.iter().enumerate() {
        let score = rank_score(index, content.len());
        fused
            .entry(key)
            .and_modify(|entry| {
                // Endorsed by both engines: the weighted scores add up
                entry.combined += score * weights.content;
                entry.content = Some(score);
            })
            .or_insert(FusedScore {
                key,
                combined: score * weights.content,
                collaborative: None,
                content: Some(score),
            });
    }

    let mut result: Vec<FusedScore<K>> = fused.into_values().collect();
    result.sort_by(|a, b| {
        b.combined
            .partial_cmp(&a.combined)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    result.truncate(limit);

    debug!(
        "fused {} collaborative + {} content candidates into {}",
        collaborative.len(),
        content.len(),
        result.len()
    );
    result
}

/// Which list a merged item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSource {
    Primary,
    Secondary,
}

/// Priority merge used for account recommendations: take up to
/// `primary_share` of the limit from the primary list first, fill the rest
/// from the secondary list, then backfill from the primary remainder.
/// Duplicates keep their first (primary) position.
pub fn merge_by_priority<K>(
    primary: &[K],
    secondary: &[K],
    primary_share: f32,
    limit: usize,
) -> Vec<(K, MergeSource)>
where
    K: Copy + Eq + Hash,
{
    let primary_take = ((limit as f32 * primary_share) as usize).min(primary.len());

    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<(K, MergeSource)> = Vec::with_capacity(limit);

    for &key in &primary[..primary_take] {
        if merged.len() >= limit {
            break;
        }
        if seen.insert(key) {
            merged.push((key, MergeSource::Primary));
        }
    }

    for &key in secondary {
        if merged.len() >= limit {
            break;
        }
        if seen.insert(key) {
            merged.push((key, MergeSource::Secondary));
        }
    }

    for &key in &primary[primary_take..] {
        if merged.len() >= limit {
            break;
        }
        if seen.insert(key) {
            merged.push((key, MergeSource::Primary));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_scores_are_normalized() {
        let fused = fuse::<u32>(&[1, 2, 3, 4], &[], FusionWeights::default(), 10);
        assert_eq!(fused[0].collaborative, Some(1.0));
        assert_eq!(fused[3].collaborative, Some(0.25));
        for entry in &fused {
            let score = entry.collaborative.unwrap();
            assert!(score > 0.0 && score <= 1.0);
        }
    }

    #[test]
    fn test_double_endorsement_beats_single_top_rank() {
        // Item 7 sits mid-list in both engines; item 1 tops only one.
        let collaborative = [1u32, 7, 3];
        let content = [7u32, 5, 9];
        let fused = fuse(&collaborative, &content, FusionWeights::default(), 10);

        // 7: (2/3)*0.6 + 1.0*0.4 = 0.8; 1: 1.0*0.6 = 0.6
        assert_eq!(fused[0].key, 7);
        assert!(fused[0].collaborative.is_some() && fused[0].content.is_some());
        assert!(fused[0].combined > fused[1].combined);
    }

    #[test]
    fn test_monotonic_scoring() {
        // A appears in both lists; B appears in one with an equal or lower
        // rank score. A's fused score must be at least B's.
        let collaborative = [10u32, 20];
        let content = [10u32, 30];
        let fused = fuse(&collaborative, &content, FusionWeights::default(), 10);

        let score_of = |key: u32| fused.iter().find(|f| f.key == key).unwrap().combined;
        assert!(score_of(10) >= score_of(20));
        assert!(score_of(10) >= score_of(30));
    }

    #[test]
    fn test_ties_break_on_ascending_key() {
        // Two items with identical single-list positions in equal-length lists
        let fused = fuse(&[5u32], &[3u32], FusionWeights { collaborative: 0.5, content: 0.5 }, 10);
        assert_eq!(fused[0].key, 3);
        assert_eq!(fused[1].key, 5);
        assert_eq!(fused[0].combined, fused[1].combined);
    }

    #[test]
    fn test_fuse_truncates_to_limit() {
        let collaborative = [1u32, 2, 3, 4, 5];
        let fused = fuse(&collaborative, &[], FusionWeights::default(), 2);
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].key, 1);
    }

    #[test]
    fn test_fuse_handles_empty_lists() {
        assert!(fuse::<u32>(&[], &[], FusionWeights::default(), 5).is_empty());

        let only_content = fuse(&[], &[9u32], FusionWeights::default(), 5);
        assert_eq!(only_content.len(), 1);
        assert!(only_content[0].collaborative.is_none());
    }

    #[test]
    fn test_merge_by_priority_share() {
        let primary = [1u32, 2, 3, 4, 5];
        let secondary = [6u32, 7, 8];
        let merged = merge_by_priority(&primary, &secondary, 0.7, 10);

        // 7 primary slots requested, 5 available, then secondary fills
        let keys: Vec<u32> = merged.iter().map(|&(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(merged[0].1, MergeSource::Primary);
        assert_eq!(merged[5].1, MergeSource::Secondary);
    }

    #[test]
    fn test_merge_by_priority_dedups_and_backfills() {
        let primary = [1u32, 2, 3, 4];
        let secondary = [2u32, 5];
        let merged = merge_by_priority(&primary, &secondary, 0.5, 4);

        // Share of 4 is 2 primary, then secondary (2 is a duplicate), then
        // the primary remainder backfills
        let keys: Vec<u32> = merged.iter().map(|&(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 5, 3]);
    }

    #[test]
    fn test_merge_respects_limit() {
        let primary = [1u32, 2, 3];
        let secondary = [4u32, 5, 6];
        let merged = merge_by_priority(&primary, &secondary, 0.7, 4);
        assert_eq!(merged.len(), 4);
    }
}
