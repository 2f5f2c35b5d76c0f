// * Content fingerprinting and near-duplicate similarity
// * Exact duplicates are 128-bit hashes over the canonical text form;
// * near-duplicates combine character-level sequence alignment with
// * token-frequency cosine overlap.

use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh3::xxh3_128;

use crate::config::constants::{
    DEFAULT_LENGTH_RATIO_CUTOFF, DEFAULT_SEQUENCE_WEIGHT, DEFAULT_TOKEN_WEIGHT,
};

/// Weighting for the combined similarity score.
///
/// The 0.7/0.3 split is the default, not physics; hosts re-weight through
/// `PipelineConfig` and the weights are validated to sum to 1.0 there.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    pub sequence_weight: f64,
    pub token_weight: f64,
    pub length_ratio_cutoff: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            sequence_weight: DEFAULT_SEQUENCE_WEIGHT,
            token_weight: DEFAULT_TOKEN_WEIGHT,
            length_ratio_cutoff: DEFAULT_LENGTH_RATIO_CUTOFF,
        }
    }
}

/// Canonical text form: lowercased, punctuation stripped, whitespace
/// collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// 128-bit content hash over the canonical text form.
/// Hash equality is an exact duplicate; lookups against a set are O(1).
pub fn content_hash(text: &str) -> u128 {
    xxh3_128(normalize_text(text).as_bytes())
}

/// Combined similarity of two canonical texts, in [0.0, 1.0].
///
/// Pairs whose lengths differ by more than the configured ratio score 0.0
/// without paying for alignment. Callers pass text already run through
/// [`normalize_text`]; raw text works but wastes the punctuation tolerance.
pub fn combined_similarity(a: &str, b: &str, config: &SimilarityConfig) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();

    if len_a == 0 && len_b == 0 {
        return 1.0;
    }

    // * Length heuristic short-circuit
    let shorter = len_a.min(len_b) as f64;
    let longer = len_a.max(len_b) as f64;
    if shorter / longer < config.length_ratio_cutoff {
        return 0.0;
    }

    let sequence = sequence_ratio(a, b);
    let token = token_cosine(a, b);

    (config.sequence_weight * sequence + config.token_weight * token).clamp(0.0, 1.0)
}

// * LCS-based character alignment ratio: 2 * LCS / (len_a + len_b).
// * 1.0 for identical strings, 0.0 for disjoint alphabets.
fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&a_chars, &b_chars);
    (2.0 * lcs as f64) / ((a_chars.len() + b_chars.len()) as f64)
}

// * Two-row dynamic programming LCS: O(len_a * len_b) time, O(min) memory.
// * The length pre-filter above bounds the worst case on mismatched pairs.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for &outer_char in outer {
        for (j, &inner_char) in inner.iter().enumerate() {
            curr[j + 1] = if outer_char == inner_char {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

// * Token-frequency cosine similarity over Unicode words
fn token_cosine(a: &str, b: &str) -> f64 {
    let freq_a = token_frequencies(a);
    let freq_b = token_frequencies(b);

    if freq_a.is_empty() || freq_b.is_empty() {
        return 0.0;
    }

    let dot: f64 = freq_a
        .iter()
        .filter_map(|(token, &count_a)| {
            freq_b.get(token).map(|&count_b| f64::from(count_a) * f64::from(count_b))
        })
        .sum();

    let magnitude_a = magnitude(&freq_a);
    let magnitude_b = magnitude(&freq_b);
    let denominator = magnitude_a * magnitude_b;

    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

fn token_frequencies(text: &str) -> HashMap<&str, u32> {
    let mut frequencies = HashMap::new();
    for word in text.unicode_words() {
        *frequencies.entry(word).or_insert(0) += 1;
    }
    frequencies
}

fn magnitude(frequencies: &HashMap<&str, u32>) -> f64 {
    frequencies
        .values()
        .map(|&count| f64::from(count) * f64::from(count))
        .sum::<f64>()
        .sqrt()
}
