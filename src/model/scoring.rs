/// Phrase scoring against a background model, or by raw frequency.

use std::cmp::Ordering;

use super::LanguageModel;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPhrase {
    pub phrase: String,
    pub score: f64,
}

/// Binomial z-score of observing `count` out of `total` draws with success probability `p`.
pub fn binomial_z(count: f64, total: f64, p: f64) -> f64 {
    let expected = total * p;
    let variance = (total * p * (1.0 - p)).max(f64::MIN_POSITIVE);
    (count - expected) / variance.sqrt()
}

/// Score every foreground n-gram seen at least `min_count` times by how far its count
/// exceeds what the background predicts. Highest first, at most `top_k`.
pub fn score_overrepresentation(
    foreground: &LanguageModel,
    background: &LanguageModel,
    n: usize,
    min_count: u64,
    top_k: usize,
) -> Vec<ScoredPhrase> {
    let total = foreground.total(n) as f64;
    if total <= 0.0 {
        return Vec::new();
    }
    let scored = foreground
        .ngrams(n)
        .filter(|(_, count)| *count >= min_count)
        .map(|(phrase, count)| {
            let tokens: Vec<&str> = phrase.split(' ').collect();
            let p = background.probability(&tokens);
            ScoredPhrase {
                phrase: phrase.to_string(),
                score: binomial_z(count as f64, total, p),
            }
        })
        .collect();
    top(scored, top_k)
}

/// Rank foreground n-grams by weighted count. Used when no background exists for `n`.
pub fn score_frequency(foreground: &LanguageModel, n: usize, top_k: usize) -> Vec<ScoredPhrase> {
    let scored = foreground
        .ngrams(n)
        .map(|(phrase, count)| ScoredPhrase {
            phrase: phrase.to_string(),
            score: count as f64,
        })
        .collect();
    top(scored, top_k)
}

fn top(mut scored: Vec<ScoredPhrase>, top_k: usize) -> Vec<ScoredPhrase> {
    scored.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.phrase.cmp(&b.phrase),
        other => other,
    });
    scored.truncate(top_k);
    scored
}
