/// Per-query mining pipeline
///
/// raw records -> cleanup -> weight cutoff -> normalization -> canonical forms
/// -> ranked phrases -> formatted results
///
/// The text mapping is query-scoped and cleared around every query.

use crate::config::MiningConfig;
use crate::data::{Description, DescriptionBatch};
use crate::errors::MineError;
use crate::io::concatenated::RecordGroup;
use crate::output::{format, FormatOptions, FormattedResult};
use crate::overrep::{BackgroundModel, OverrepSettings, Overrepresentation};
use crate::text::canonical::{CanonicalOptions, TextMapping};
use crate::text::preprocess::{unify_hyphenation, Preprocessor};
use crate::weighting::{enforce_weight_cutoff, linear_normalization};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// At least one mined result was reported
    Scored,
    /// Nothing acceptable was found; the fallback line was reported
    Fallback,
    /// Training failed; the fallback line was reported
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query: String,
    pub results: Vec<FormattedResult>,
    pub status: QueryStatus,
}

pub struct QueryPipeline {
    mining: MiningConfig,
    preprocessor: Preprocessor,
    mapping: TextMapping,
    engine: Overrepresentation,
    format: FormatOptions,
}

impl QueryPipeline {
    pub fn new(mining: &MiningConfig) -> Result<Self, MineError> {
        Ok(QueryPipeline {
            mining: mining.clone(),
            preprocessor: Preprocessor::new()?,
            mapping: TextMapping::new(CanonicalOptions::from(mining)),
            engine: Overrepresentation::new(OverrepSettings::from(mining)),
            format: FormatOptions::from(mining),
        })
    }

    /// Cleaned (not yet canonical) batch of one group.
    fn prepare(&self, group: &RecordGroup) -> DescriptionBatch {
        let descriptions = group
            .records
            .iter()
            .map(|r| {
                let cleaned = self.preprocessor.prepare(&r.description);
                Description::with_query(cleaned, r.weight, group.query.clone())
            })
            .filter(|d| !d.description.is_empty())
            .collect();
        let mut batch = DescriptionBatch::with_descriptions(group.query.clone(), descriptions);
        if self.mining.unify_hyphenation {
            unify_hyphenation(&mut batch);
        }
        batch
    }

    /// Train the background on corpus groups. Descriptions are canonicalized without
    /// touching the query mapping.
    pub fn train_background(&self, groups: &[RecordGroup], background: &mut BackgroundModel) {
        let reorder = self.mining.allow_reordering;
        let batches: Vec<DescriptionBatch> = groups
            .iter()
            .map(|group| {
                let mut batch = self.prepare(group);
                for desc in &mut batch.descriptions {
                    desc.description = self.mapping.canonicalize(&desc.description, false);
                }
                batch
            })
            .collect();
        background.calculate(&batches, self.engine.settings(), reorder);
    }

    /// Mine the consensus description of one query.
    pub fn process(&mut self, group: &RecordGroup, background: &BackgroundModel) -> QueryOutcome {
        self.mapping.clean();

        let mut batch = self.prepare(group);
        if let Some(percent) = self.mining.weight_cutoff_percent {
            if percent > 0 && percent <= 100 {
                batch = enforce_weight_cutoff(&batch, percent);
            }
        }
        if self.mining.normalization {
            batch = linear_normalization(batch);
        }
        for desc in &mut batch.descriptions {
            desc.description = self.mapping.convert(
                &desc.description,
                self.mining.expand_subphrases,
                self.mining.allow_reordering,
            );
        }

        let reorder = self.mining.allow_reordering;
        let outcome = match self.engine.calculate(&batch, background, reorder) {
            Ok(ranked) => {
                let formatted = format(&ranked, &self.mapping, &self.format);
                let status = if formatted.fallback {
                    QueryStatus::Fallback
                } else {
                    QueryStatus::Scored
                };
                QueryOutcome {
                    query: group.query.clone(),
                    results: formatted.results,
                    status,
                }
            }
            Err(e) => {
                tracing::warn!(
                    query = %group.query,
                    error = %e,
                    "Query failed, reporting fallback"
                );
                QueryOutcome {
                    query: group.query.clone(),
                    results: vec![FormattedResult::fallback(&self.format)],
                    status: QueryStatus::Failed,
                }
            }
        };

        self.mapping.clean();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RawRecord;
    use crate::text::UNKNOWN_LABEL;

    fn group(query: &str, lines: &[(&str, f64)]) -> RecordGroup {
        RecordGroup {
            query: query.to_string(),
            records: lines
                .iter()
                .map(|(d, w)| RawRecord {
                    query: Some(query.to_string()),
                    description: d.to_string(),
                    weight: *w,
                })
                .collect(),
        }
    }

    fn mine(config: &MiningConfig, lines: &[(&str, f64)]) -> QueryOutcome {
        let mut pipeline = QueryPipeline::new(config).expect("pipeline");
        pipeline.process(&group("Q1", lines), &BackgroundModel::new())
    }

    #[test]
    fn test_frequent_phrase_reported_without_background() {
        let outcome = mine(
            &MiningConfig::default(),
            &[("Zinc finger protein 3", 1.0), ("zinc finger protein", 1.0), ("Zinc finger", 1.0)],
        );
        assert_eq!(outcome.status, QueryStatus::Scored);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].text, "Zinc finger");
        assert_eq!(outcome.results[0].score, 3.0);
    }

    #[test]
    fn test_failed_training_reports_fallback() {
        let config = MiningConfig {
            normalization: false,
            ..MiningConfig::default()
        };
        let mut pipeline = QueryPipeline::new(&config).expect("pipeline");
        let outcome = pipeline.process(
            &group("Q9", &[("zinc finger", f64::INFINITY), ("zinc finger", 1.0)]),
            &BackgroundModel::new(),
        );
        assert_eq!(outcome.status, QueryStatus::Failed);
        assert_eq!(outcome.results[0].text, UNKNOWN_LABEL);
        assert_eq!(outcome.results[0].score, 1.0);
    }

    #[test]
    fn test_infinite_weight_fails_query_with_normalization() {
        let outcome = mine(
            &MiningConfig::default(),
            &[("kinase domain protein", 50.0), ("zinc finger", f64::INFINITY)],
        );
        assert_eq!(outcome.status, QueryStatus::Failed);
        assert_eq!(outcome.results.len(), 1);
    }

    fn heavy_minority() -> Vec<(&'static str, f64)> {
        vec![
            ("kinase domain protein", 100.0),
            ("zinc finger", 60.0),
            ("zinc finger", 60.0),
            ("zinc finger", 60.0),
        ]
    }

    fn cutoff_config(percent: Option<u32>) -> MiningConfig {
        MiningConfig {
            normalization: false,
            weight_cutoff_percent: percent,
            ..MiningConfig::default()
        }
    }

    #[test]
    fn test_weight_cutoff_drops_light_descriptions() {
        let outcome = mine(&cutoff_config(Some(70)), &heavy_minority());
        assert_eq!(outcome.results[0].text, "kinase domain protein");
        assert_eq!(outcome.results[0].score, 100.0);
    }

    #[test]
    fn test_weight_cutoff_out_of_range_is_ignored() {
        for percent in [None, Some(0), Some(150)] {
            let outcome = mine(&cutoff_config(percent), &heavy_minority());
            assert_eq!(outcome.results[0].text, "zinc finger", "cutoff {:?}", percent);
            assert_eq!(outcome.results[0].score, 180.0);
        }
    }

    #[test]
    fn test_subphrase_results_need_expansion() {
        let lines = [("zinc finger protein", 1.0), ("zinc finger domain", 1.0)];
        let expanded = mine(&MiningConfig::default(), &lines);
        assert_eq!(expanded.results[0].text, "zinc finger");
        assert_eq!(expanded.results[0].score, 2.0);

        let config = MiningConfig {
            expand_subphrases: false,
            ..MiningConfig::default()
        };
        let whole = mine(&config, &lines);
        assert_eq!(whole.status, QueryStatus::Scored);
        assert_eq!(whole.results[0].text, "zinc finger domain");
        assert_eq!(whole.results[0].score, 1.0);
    }

    #[test]
    fn test_hyphenation_variants_are_unified() {
        let lines = [
            ("ATP-dependent helicase", 1.0),
            ("ATP dependent helicase", 1.0),
            ("ATP dependent helicase", 1.0),
        ];
        let split = mine(&MiningConfig::default(), &lines);
        assert_eq!(split.results[0].text, "ATP dependent helicase");
        assert_eq!(split.results[0].score, 2.0);

        let config = MiningConfig {
            unify_hyphenation: true,
            ..MiningConfig::default()
        };
        let unified = mine(&config, &lines);
        assert_eq!(unified.results[0].text, "ATP-dependent helicase");
        assert_eq!(unified.results[0].score, 3.0);
    }

    #[test]
    fn test_empty_group_never_yields_zero_lines() {
        let mut pipeline = QueryPipeline::new(&MiningConfig::default()).expect("pipeline");
        let outcome = pipeline.process(&group("Q0", &[]), &BackgroundModel::new());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.status, QueryStatus::Fallback);
    }

    #[test]
    fn test_mapping_is_cleared_between_queries() {
        let mut pipeline = QueryPipeline::new(&MiningConfig::default()).expect("pipeline");
        let lines = [("zinc finger", 1.0), ("zinc finger", 1.0)];
        pipeline.process(&group("Q1", &lines), &BackgroundModel::new());
        assert!(pipeline.mapping.is_empty());
    }
}
