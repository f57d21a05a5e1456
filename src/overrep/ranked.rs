/// Ranked phrase results of one query.
///
/// Scores are stored flipped (negated) so ascending key order is best-first.
/// Only strictly positive raw scores are kept; zero and negative raw scores carry
/// no evidence of overrepresentation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// f64 with a total order, usable as a map key.
#[derive(Debug, Clone, Copy)]
pub struct OrderedScore(pub f64);

impl PartialEq for OrderedScore {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankedResults {
    entries: BTreeMap<OrderedScore, BTreeSet<String>>,
}

impl RankedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a phrase with its raw engine score. Returns whether it was kept.
    pub fn insert_raw(&mut self, raw_score: f64, phrase: impl Into<String>) -> bool {
        let flipped = -raw_score;
        if !flipped.is_finite() || flipped >= 0.0 {
            return false;
        }
        self.entries
            .entry(OrderedScore(flipped))
            .or_default()
            .insert(phrase.into())
    }

    /// Best-first iteration yielding raw (un-flipped) scores.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &BTreeSet<String>)> + '_ {
        self.entries.iter().map(|(key, phrases)| (-key.0, phrases))
    }

    /// Number of phrases across all scores.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
