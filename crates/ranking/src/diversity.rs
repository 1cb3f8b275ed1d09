//! Diversity re-ranking for final candidate lists.
//!
//! Without this pass the top of a feed tends to be monopolized by one
//! prolific author or one trending destination. Each candidate collects a
//! diversity bonus in list order, the bonus is added to the underlying
//! score, and the list is re-sorted. Pure function, no clock reads and no
//! randomness; the caller supplies `now` so recency is reproducible.
//!
//! ## Bonus factors
//! - +3 first post seen from an author, +1 while fewer than 3 distinct
//!   authors have appeared
//! - +2 first post seen from a location
//! - +1 while the candidate's media kind has filled less than half the
//!   requested limit
//! - recency: +2 for posts 1-7 days old, +1 for posts up to 30 days old

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use social_store::{MediaKind, PostId, UserId};

const SECONDS_PER_DAY: i64 = 86_400;

/// View of a ranked candidate, as needed by the re-ranker.
pub trait DiversityItem {
    fn item_id(&self) -> PostId;
    fn author_id(&self) -> UserId;
    fn location_name(&self) -> Option<&str>;
    fn media_kind(&self) -> MediaKind;
    /// Unix timestamp (seconds) of creation
    fn created_at(&self) -> i64;
    /// The fusion/popularity score the bonus is added to
    fn base_score(&self) -> f32;
}

/// Re-order `candidates` by diversity bonus plus base score and truncate to
/// `limit`.
///
/// Bonuses are accumulated in input order, so the incoming ranking decides
/// which post counts as the "first" from its author or location. Final ties
/// break on ascending item id.
pub fn diversify<T: DiversityItem>(candidates: Vec<T>, limit: usize, now: i64) -> Vec<T> {
    if candidates.is_empty() {
        return candidates;
    }

    let mut seen_authors: HashSet<UserId> = HashSet::new();
    let mut seen_locations: HashSet<String> = HashSet::new();
    let mut media_counts: HashMap<MediaKind, usize> = HashMap::new();

    let mut scored: Vec<(f32, T)> = Vec::with_capacity(candidates.len());
    for item in candidates {
        let mut bonus = 0.0f32;

        if seen_authors.insert(item.author_id()) {
            bonus += 3.0;
        } else if seen_authors.len() < 3 {
            bonus += 1.0;
        }

        if let Some(location) = item.location_name()
            && seen_locations.insert(location.to_string())
        {
            bonus += 2.0;
        }

        let media_count = media_counts.entry(item.media_kind()).or_insert(0);
        if *media_count < limit / 2 {
            bonus += 1.0;
            *media_count += 1;
        }

        let age_days = (now - item.created_at()) / SECONDS_PER_DAY;
        if (1..=7).contains(&age_days) {
            bonus += 2.0;
        } else if (0..=30).contains(&age_days) {
            bonus += 1.0;
        }

        scored.push((bonus + item.base_score(), item));
    }

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.item_id().cmp(&b.1.item_id()))
    });
    scored.truncate(limit);
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[derive(Debug, Clone, PartialEq)]
    struct Candidate {
        id: PostId,
        author: UserId,
        location: Option<String>,
        media: MediaKind,
        created_at: i64,
        score: f32,
    }

    impl Candidate {
        fn new(id: PostId, author: UserId, score: f32) -> Self {
            Self {
                id,
                author,
                location: None,
                media: MediaKind::Image,
                // 100 days old: no recency bonus
                created_at: NOW - 100 * SECONDS_PER_DAY,
                score,
            }
        }

        fn at(mut self, location: &str) -> Self {
            self.location = Some(location.to_string());
            self
        }

        fn aged_days(mut self, days: i64) -> Self {
            self.created_at = NOW - days * SECONDS_PER_DAY;
            self
        }

        fn video(mut self) -> Self {
            self.media = MediaKind::Video;
            self
        }
    }

    impl DiversityItem for Candidate {
        fn item_id(&self) -> PostId {
            self.id
        }
        fn author_id(&self) -> UserId {
            self.author
        }
        fn location_name(&self) -> Option<&str> {
            self.location.as_deref()
        }
        fn media_kind(&self) -> MediaKind {
            self.media
        }
        fn created_at(&self) -> i64 {
            self.created_at
        }
        fn base_score(&self) -> f32 {
            self.score
        }
    }

    fn ids(items: &[Candidate]) -> Vec<PostId> {
        items.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_empty_input() {
        let out: Vec<Candidate> = diversify(vec![], 10, NOW);
        assert!(out.is_empty());
    }

    #[test]
    fn test_new_author_outranks_repeat_author() {
        // Author 1 holds the top two slots; a slightly lower-scored post
        // from author 2 should climb above the repeat.
        let candidates = vec![
            Candidate::new(1, 1, 10.0),
            Candidate::new(2, 1, 9.5),
            Candidate::new(3, 2, 9.0),
        ];
        // Media balance saturates at limit/2 = 1, so only the first image
        // gets the media bonus.
        // 1: 10.0 + 3 (author) + 1 (media) = 14.0
        // 2: 9.5 + 1 (under 3 authors)    = 10.5
        // 3: 9.0 + 3 (author)             = 12.0
        let out = diversify(candidates, 3, NOW);
        assert_eq!(ids(&out), vec![1, 3, 2]);
    }

    #[test]
    fn test_fresh_location_gets_bonus() {
        let candidates = vec![
            Candidate::new(1, 1, 5.0).at("Goa"),
            Candidate::new(2, 2, 5.0).at("Goa"),
            Candidate::new(3, 3, 5.0).at("Interlaken"),
        ];
        // 1: 5 + 3 + 2 (new location) + 1 (media, limit/2 = 3) = 11
        // 2: 5 + 3 + 0 + 1 = 9
        // 3: 5 + 3 + 2 + 1 = 11, tie with 1 breaks on id
        let out = diversify(candidates, 6, NOW);
        assert_eq!(ids(&out), vec![1, 3, 2]);
    }

    #[test]
    fn test_media_balance_caps_at_half_limit() {
        let candidates = vec![
            Candidate::new(1, 1, 5.0),
            Candidate::new(2, 2, 5.0),
            Candidate::new(3, 3, 5.0),
            Candidate::new(4, 4, 5.0).video(),
        ];
        // limit 4: two image slots get the +1, the third image does not,
        // the video does
        let out = diversify(candidates, 4, NOW);
        // 1: 5+3+1=9, 2: 5+3+1=9, 3: 5+3+0=8, 4: 5+3+1=9
        assert_eq!(ids(&out), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_recency_sweet_spot() {
        let candidates = vec![
            Candidate::new(1, 1, 5.0).aged_days(100), // no bonus
            Candidate::new(2, 2, 5.0).aged_days(3),   // +2
            Candidate::new(3, 3, 5.0).aged_days(20),  // +1
        ];
        let out = diversify(candidates, 6, NOW);
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let candidates: Vec<Candidate> = (1..=10)
            .map(|id| Candidate::new(id, id, 10.0 - id as f32))
            .collect();
        let out = diversify(candidates, 4, NOW);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_deterministic_for_fixed_now() {
        let make = || {
            vec![
                Candidate::new(1, 1, 5.0).at("Goa").aged_days(2),
                Candidate::new(2, 1, 4.0).at("Bali").aged_days(40),
                Candidate::new(3, 2, 3.0).at("Goa").aged_days(10),
            ]
        };
        let first = diversify(make(), 3, NOW);
        let second = diversify(make(), 3, NOW);
        assert_eq!(first, second);
    }

    #[test]
    fn test_base_score_still_dominates_large_gaps() {
        // A 100-point score gap cannot be closed by bonuses
        let candidates = vec![
            Candidate::new(1, 1, 105.0),
            Candidate::new(2, 2, 5.0),
        ];
        let out = diversify(candidates, 2, NOW);
        assert_eq!(ids(&out), vec![1, 2]);
    }
}
