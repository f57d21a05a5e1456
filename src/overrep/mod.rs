/// Overrepresentation orchestration
///
/// For every phrase length in range, a foreground model is trained on the query batch
/// and scored against the background model of the same length. Lengths without a
/// background fall back to frequency ranking. Results from all lengths are merged into
/// one `RankedResults`.

pub mod ranked;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::MiningConfig;
use crate::data::DescriptionBatch;
use crate::errors::MineError;
use crate::model::scoring::{score_frequency, score_overrepresentation};
use crate::model::LanguageModel;
use crate::text::canonical::sorted_tokens;

pub use ranked::{OrderedScore, RankedResults};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrepSettings {
    pub min_ngram: usize,
    pub max_ngram: usize,
    /// Foreground count needed before a phrase is scored
    pub min_count: u64,
    /// Background pruning threshold
    pub min_occurrence: u64,
    /// Phrases kept per length
    pub top_k: usize,
}

impl From<&MiningConfig> for OverrepSettings {
    fn from(m: &MiningConfig) -> Self {
        OverrepSettings {
            min_ngram: m.min_ngram,
            max_ngram: m.max_ngram,
            min_count: m.min_count_ngram,
            min_occurrence: m.min_occurrence,
            top_k: m.max_returned_results,
        }
    }
}

/// Train `text` into `model` as phrases of width `n`.
///
/// With reordering, each distinct sorted window of width `n` is trained once per line;
/// a line shorter than `n` is trained as one sorted window.
fn train_text(
    model: &mut LanguageModel,
    text: &str,
    weight: u64,
    n: usize,
    allow_reordering: bool,
) {
    if !allow_reordering {
        model.train(text, weight);
        return;
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return;
    }
    let width = n.min(tokens.len());
    let windows: BTreeSet<String> = tokens
        .windows(width)
        .map(|w| sorted_tokens(w.iter().copied()))
        .collect();
    for window in windows {
        model.train(&window, weight);
    }
}

/// Background language models, one per phrase length.
///
/// Built once per run and shared by every query until `clear()`.
#[derive(Default)]
pub struct BackgroundModel {
    models: BTreeMap<usize, LanguageModel>,
    descriptions: usize,
}

impl BackgroundModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Train (or extend) the model of every length in range on the given batches, then prune.
    pub fn calculate(
        &mut self,
        batches: &[DescriptionBatch],
        settings: &OverrepSettings,
        allow_reordering: bool,
    ) {
        for n in settings.min_ngram..=settings.max_ngram {
            let model = self.models.entry(n).or_insert_with(|| LanguageModel::new(n));
            for batch in batches {
                for desc in &batch.descriptions {
                    if let Some(weight) = desc.training_weight() {
                        train_text(model, &desc.description, weight, n, allow_reordering);
                    }
                }
            }
            model.prune(settings.min_occurrence);
        }
        self.descriptions += batches.iter().map(DescriptionBatch::len).sum::<usize>();
        tracing::info!(
            descriptions = self.descriptions,
            models = self.models.len(),
            "Background model trained"
        );
    }

    pub fn get(&self, n: usize) -> Option<&LanguageModel> {
        self.models.get(&n)
    }

    pub fn is_empty(&self) -> bool {
        self.models.values().all(LanguageModel::is_empty)
    }

    /// Number of descriptions trained into the background.
    pub fn description_count(&self) -> usize {
        self.descriptions
    }

    pub fn clear(&mut self) {
        self.models.clear();
        self.descriptions = 0;
    }
}

pub struct Overrepresentation {
    settings: OverrepSettings,
}

impl Overrepresentation {
    pub fn new(settings: OverrepSettings) -> Self {
        Overrepresentation { settings }
    }

    pub fn settings(&self) -> &OverrepSettings {
        &self.settings
    }

    /// Rank the phrases of one query batch, longest lengths first.
    ///
    /// A description with a non-finite weight aborts the whole query.
    pub fn calculate(
        &self,
        batch: &DescriptionBatch,
        background: &BackgroundModel,
        allow_reordering: bool,
    ) -> Result<RankedResults, MineError> {
        let mut ranked = RankedResults::new();

        for n in (self.settings.min_ngram..=self.settings.max_ngram).rev() {
            let mut foreground = LanguageModel::new(n);
            for desc in &batch.descriptions {
                if !desc.weight.is_finite() {
                    return Err(MineError::ModelTraining {
                        query: batch.name.clone(),
                        message: format!(
                            "weight {} of '{}' is not finite",
                            desc.weight, desc.description
                        ),
                    });
                }
                if let Some(weight) = desc.training_weight() {
                    train_text(&mut foreground, &desc.description, weight, n, allow_reordering);
                }
            }

            let scored = match background.get(n) {
                Some(bg) if !bg.is_empty() => score_overrepresentation(
                    &foreground,
                    bg,
                    n,
                    self.settings.min_count,
                    self.settings.top_k,
                ),
                _ => score_frequency(&foreground, n, self.settings.top_k),
            };
            tracing::trace!(query = %batch.name, n, phrases = scored.len(), "Scored phrase length");
            for phrase in scored {
                ranked.insert_raw(phrase.score, phrase.phrase);
            }
        }

        tracing::debug!(query = %batch.name, phrases = ranked.len(), "Ranked phrases");
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Description;

    fn settings(min: usize, max: usize) -> OverrepSettings {
        OverrepSettings {
            min_ngram: min,
            max_ngram: max,
            min_count: 2,
            min_occurrence: 1,
            top_k: 25,
        }
    }

    #[test]
    fn test_frequency_fallback_without_background() {
        let batch = DescriptionBatch::with_descriptions(
            "q",
            vec![
                Description::new("zinc finger protein", 3.0),
                Description::new("zinc finger", 1.0),
            ],
        );
        let engine = Overrepresentation::new(settings(2, 3));
        let ranked = engine.calculate(&batch, &BackgroundModel::new(), false).expect("ranked");
        let (score, phrases) = ranked.iter().next().expect("results");
        assert_eq!(score, 4.0);
        assert!(phrases.contains("zinc finger"));
    }

    #[test]
    fn test_negative_weights_are_not_trained() {
        let batch = DescriptionBatch::with_descriptions(
            "q",
            vec![Description::new("zinc finger", -1.0)],
        );
        let engine = Overrepresentation::new(settings(2, 2));
        let ranked = engine.calculate(&batch, &BackgroundModel::new(), false).expect("ranked");
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_non_finite_weight_aborts_query() {
        let batch = DescriptionBatch::with_descriptions(
            "q7",
            vec![
                Description::new("zinc finger", 2.0),
                Description::new("kinase domain", f64::INFINITY),
            ],
        );
        let engine = Overrepresentation::new(settings(2, 2));
        let err = engine
            .calculate(&batch, &BackgroundModel::new(), false)
            .expect_err("training must fail");
        assert!(matches!(err, MineError::ModelTraining { ref query, .. } if query == "q7"));
    }

    #[test]
    fn test_reordering_merges_swapped_phrases() {
        let batch = DescriptionBatch::with_descriptions(
            "q",
            vec![
                Description::new("signaling enzyme", 1.0),
                Description::new("enzyme signaling", 1.0),
            ],
        );
        let engine = Overrepresentation::new(settings(2, 2));
        let ranked = engine.calculate(&batch, &BackgroundModel::new(), true).expect("ranked");
        let (score, phrases) = ranked.iter().next().expect("results");
        assert_eq!(score, 2.0);
        assert!(phrases.contains("enzyme signaling"));
    }

    #[test]
    fn test_background_lifecycle() {
        let mut background = BackgroundModel::new();
        assert!(background.is_empty());
        let corpus = DescriptionBatch::with_descriptions(
            "bg",
            vec![Description::new("hypothetical protein", 1.0); 3],
        );
        background.calculate(&[corpus], &settings(2, 3), false);
        assert!(!background.is_empty());
        assert_eq!(background.description_count(), 3);
        assert_eq!(background.get(2).map(|m| m.count("hypothetical protein")), Some(3));
        background.clear();
        assert!(background.is_empty());
        assert!(background.get(2).is_none());
    }
}
