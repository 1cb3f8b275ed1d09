//! Output records returned to the surrounding API layer.

use std::fmt;

use serde::Serialize;
use social_store::{LocationInfo, PostId, UserId};

/// Which ranking path produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Both engines contributed and their lists were fused
    Hybrid,
    /// Only the collaborative engine produced candidates
    CollaborativeOnly,
    /// Only the content engine produced candidates
    ContentOnly,
    /// Neither engine produced candidates; ranked by engagement counters
    PopularityFallback,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Hybrid => "hybrid",
            Strategy::CollaborativeOnly => "collaborative_only",
            Strategy::ContentOnly => "content_only",
            Strategy::PopularityFallback => "popularity_fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked post recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub post_id: PostId,
    pub author: UserId,
    /// Caption preview, truncated for display
    pub caption: String,
    pub location: Option<String>,
    /// Final score before the diversity re-rank (which decides order)
    pub score: f32,
    /// Collaborative sub-score: rank-normalized under `Hybrid`, the raw
    /// engine score under `CollaborativeOnly`
    pub collaborative_score: Option<f32>,
    /// Content sub-score, same convention
    pub content_score: Option<f32>,
    pub strategy: Strategy,
    pub reason: String,
}

/// An account-to-follow recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct AccountRecommendation {
    pub user_id: UserId,
    pub username: String,
    pub bio: String,
    pub travel_style: Option<String>,
    pub follower_count: u32,
    pub strategy: Strategy,
    pub reason: String,
}

/// A destination recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct DestinationRecommendation {
    pub location: LocationInfo,
    pub score: f32,
    /// Boost contributed by similar travelers, when any
    pub collaborative_boost: Option<f32>,
    pub post_count: u32,
    pub reasons: Vec<String>,
    pub strategy: Strategy,
}

/// Diagnostic descriptor for `explain_strategy`.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub user_id: UserId,
    pub interaction_count: usize,
    /// Strategy the next post request would start from
    pub strategy: Strategy,
    pub min_interactions_for_collaborative: usize,
    pub description: String,
}

/// Char-safe display truncation.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Hybrid.to_string(), "hybrid");
        assert_eq!(
            Strategy::PopularityFallback.as_str(),
            "popularity_fallback"
        );
    }

    #[test]
    fn test_preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 5), "abcde...");
        // Multibyte text must not split a char
        assert_eq!(preview("日本語のテキスト", 3), "日本語...");
    }
}
