//! Text normalization and TF-IDF vectorization for post features.
//!
//! Captions and categorical metadata are folded into one bag-of-terms
//! document per post, then vectorized with TF-IDF over unigrams and bigrams.
//! Everything is computed locally from the corpus; there is no external
//! model or service involved.

use std::collections::HashMap;

use rayon::prelude::*;

/// Common English words excluded from the vocabulary. Must stay sorted,
/// lookups use binary search.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "for", "from", "had", "has", "have", "he", "her",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my",
    "no", "not", "of", "on", "one", "or", "our", "out", "she", "so", "some", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "to", "up", "was", "we",
    "were", "what", "when", "where", "which", "who", "will", "with", "would", "you", "your",
];

fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.binary_search(&term).is_ok()
}

/// Strip punctuation, lowercase, and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unigrams plus adjacent bigrams of a document, stop words removed before
/// bigram formation.
fn ngram_terms(doc: &str) -> Vec<String> {
    let normalized = normalize_text(doc);
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

/// Vectorizer settings.
///
/// Defaults match the production corpus: vocabulary capped at 1000 terms,
/// terms in fewer than 2 documents or more than 80% of documents excluded.
#[derive(Debug, Clone)]
pub struct TfIdfConfig {
    pub max_features: usize,
    pub min_df: usize,
    pub max_df_ratio: f32,
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_df: 2,
            max_df_ratio: 0.8,
        }
    }
}

/// Vocabulary and row vectors produced by one fit over a corpus.
#[derive(Debug, Clone)]
pub struct TfIdfOutput {
    /// Term list, ascending; index positions label vector columns
    pub vocab: Vec<String>,
    /// One L2-normalized sparse vector per input document, columns ascending
    pub vectors: Vec<Vec<(usize, f32)>>,
}

/// TF-IDF vectorizer with document-frequency cutoffs and a vocabulary cap.
#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    config: TfIdfConfig,
}

impl TfIdfVectorizer {
    pub fn new(config: TfIdfConfig) -> Self {
        Self { config }
    }

    /// Fit the vocabulary on `docs` and vectorize them in one pass.
    ///
    /// Terms are ranked by total corpus frequency when the vocabulary cap
    /// applies; frequency ties break on the term itself, ascending. Idf is
    /// smoothed: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit_transform(&self, docs: &[String]) -> TfIdfOutput {
        let n_docs = docs.len();
        if n_docs == 0 {
            return TfIdfOutput {
                vocab: Vec::new(),
                vectors: Vec::new(),
            };
        }

        let doc_counts: Vec<HashMap<String, u32>> = docs
            .par_iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for term in ngram_terms(doc) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        let mut corpus_freq: HashMap<String, u64> = HashMap::new();
        for counts in &doc_counts {
            for (term, &count) in counts {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
                *corpus_freq.entry(term.clone()).or_insert(0) += count as u64;
            }
        }

        let max_df = self.config.max_df_ratio * n_docs as f32;
        let mut candidates: Vec<(String, u64)> = doc_freq
            .iter()
            .filter(|&(_, &df)| df as usize >= self.config.min_df && df as f32 <= max_df)
            .map(|(term, _)| (term.clone(), corpus_freq[term]))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(self.config.max_features);

        let mut vocab: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();
        vocab.sort_unstable();

        let term_index: HashMap<String, usize> = vocab
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        let idf: Vec<f32> = vocab
            .iter()
            .map(|term| {
                let df = doc_freq[term] as f32;
                ((1.0 + n_docs as f32) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vectors: Vec<Vec<(usize, f32)>> = doc_counts
            .par_iter()
            .map(|counts| {
                let mut vector: Vec<(usize, f32)> = counts
                    .iter()
                    .filter_map(|(term, &count)| {
                        term_index
                            .get(term.as_str())
                            .map(|&idx| (idx, count as f32 * idf[idx]))
                    })
                    .collect();
                vector.sort_unstable_by_key(|&(idx, _)| idx);

                let norm = vector
                    .iter()
                    .map(|&(_, value)| value * value)
                    .sum::<f32>()
                    .sqrt();
                if norm > 0.0 {
                    for entry in &mut vector {
                        entry.1 /= norm;
                    }
                }
                vector
            })
            .collect();

        TfIdfOutput { vocab, vectors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn test_normalize_text_strips_and_lowercases() {
        assert_eq!(
            normalize_text("Sunset  @ Goa!! #beach,   vibes"),
            "sunset goa beach vibes"
        );
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("!!!"), "");
    }

    #[test]
    fn test_ngram_terms_skips_stop_words_before_bigrams() {
        let terms = ngram_terms("the beach and the waves");
        assert!(terms.contains(&"beach".to_string()));
        assert!(terms.contains(&"waves".to_string()));
        // "beach waves" is adjacent once stop words are gone
        assert!(terms.contains(&"beach waves".to_string()));
        assert!(!terms.iter().any(|t| t.contains("the")));
    }

    #[test]
    fn test_min_df_excludes_rare_terms() {
        let config = TfIdfConfig {
            max_features: 100,
            min_df: 2,
            max_df_ratio: 1.0,
        };
        let docs = vec![
            doc("beach sunset"),
            doc("beach waves"),
            doc("beach holiday"),
        ];
        let output = TfIdfVectorizer::new(config).fit_transform(&docs);
        // "beach" appears in all three docs; the singletons are cut by min_df
        assert_eq!(output.vocab, vec!["beach".to_string()]);
    }

    #[test]
    fn test_max_df_excludes_near_universal_terms() {
        let config = TfIdfConfig {
            max_features: 100,
            min_df: 1,
            max_df_ratio: 0.5,
        };
        let docs = vec![
            doc("travel beach"),
            doc("travel mountain"),
            doc("travel city"),
            doc("travel forest"),
        ];
        let output = TfIdfVectorizer::new(config).fit_transform(&docs);
        // "travel" has df 4/4 > 0.5 and is dropped; singletons survive
        assert!(!output.vocab.contains(&"travel".to_string()));
        assert!(output.vocab.contains(&"beach".to_string()));
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent() {
        let config = TfIdfConfig {
            max_features: 1,
            min_df: 1,
            max_df_ratio: 1.0,
        };
        let docs = vec![doc("beach beach mountain"), doc("beach")];
        let output = TfIdfVectorizer::new(config).fit_transform(&docs);
        assert_eq!(output.vocab, vec!["beach".to_string()]);
    }

    #[test]
    fn test_vectors_are_l2_normalized() {
        let config = TfIdfConfig {
            max_features: 100,
            min_df: 1,
            max_df_ratio: 1.0,
        };
        let docs = vec![doc("beach sunset goa"), doc("mountain hike alps")];
        let output = TfIdfVectorizer::new(config).fit_transform(&docs);

        for vector in &output.vectors {
            let norm: f32 = vector.iter().map(|&(_, v)| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_corpus() {
        let output = TfIdfVectorizer::default().fit_transform(&[]);
        assert!(output.vocab.is_empty());
        assert!(output.vectors.is_empty());
    }

    #[test]
    fn test_doc_without_vocab_terms_gets_empty_vector() {
        let docs = vec![doc("beach sunset"), doc("beach waves"), doc("zzz")];
        let config = TfIdfConfig {
            max_features: 100,
            min_df: 2,
            max_df_ratio: 1.0,
        };
        let output = TfIdfVectorizer::new(config).fit_transform(&docs);
        assert!(output.vectors[2].is_empty());
    }
}
