/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: phrasemine.toml (in working directory) or the path given with --config
/// 3. Environment variables: prefixed PHRASEMINE_, nested keys split on `__`
///    (e.g., PHRASEMINE_MINING__MAX_NGRAM=4)
///
/// CLI flags are applied on top by the binary, then `validate()` runs once.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use crate::errors::MineError;

pub const DEFAULT_CONFIG_FILE: &str = "phrasemine.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub mining: MiningConfig,

    #[serde(default)]
    pub columns: ColumnsConfig,
}

/// Parameters of the overrepresentation engine, text mapping and output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Smallest n-gram length considered as a phrase
    pub min_ngram: usize,
    /// Largest n-gram length considered as a phrase
    pub max_ngram: usize,
    /// Minimal foreground count for a phrase to be scored against the background
    pub min_count_ngram: u64,
    /// Table entries with a total count below this are pruned after training
    pub min_occurrence: u64,
    /// Phrases returned per n-gram length by the engine
    pub max_returned_results: usize,
    /// Results scoring below this are not reported
    pub output_cutoff: f64,
    /// Results reported per query
    pub max_results: usize,
    pub lowercase: bool,
    pub stemming: bool,
    /// Collapse generic descriptions ("hypothetical protein", ...) into one label
    pub unify_unknowns: bool,
    /// Order-insensitive matching ("enzyme signaling" == "signaling enzyme")
    pub allow_reordering: bool,
    pub expand_subphrases: bool,
    pub strip_end_punctuation: bool,
    pub sort_subphrase_tokens: bool,
    /// Keep only descriptions weighing at least this percentage of the batch maximum
    pub weight_cutoff_percent: Option<u32>,
    /// Rescale weights into small integer multiplicities
    pub normalization: bool,
    pub unify_hyphenation: bool,
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            min_ngram: 2,
            max_ngram: 10,
            min_count_ngram: 2,
            min_occurrence: 2,
            max_returned_results: 25,
            output_cutoff: 0.0,
            max_results: 1,
            lowercase: true,
            stemming: true,
            unify_unknowns: true,
            allow_reordering: false,
            expand_subphrases: true,
            strip_end_punctuation: true,
            sort_subphrase_tokens: false,
            weight_cutoff_percent: None,
            normalization: true,
            unify_hyphenation: false,
        }
    }
}

/// Zero-based column positions in tab-delimited input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub description: usize,
    pub query: usize,
    pub score: Option<usize>,
    pub evalue: Option<usize>,
    /// Description column of background corpus files
    pub background_description: usize,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        ColumnsConfig {
            description: 1,
            query: 0,
            score: None,
            evalue: None,
            background_description: 0,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            mining: MiningConfig::default(),
            columns: ColumnsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: PHRASEMINE_MINING__MAX_RESULTS=3 overrides mining.max_results in phrasemine.toml
    pub fn load(path: Option<&Path>) -> Result<Config, MineError> {
        let toml = match path {
            Some(p) => Toml::file(p),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(toml)
            .merge(Env::prefixed("PHRASEMINE_").split("__"))
            .extract()
            .map_err(|e| MineError::Config(format!("Failed to load config: {}", e)))
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), MineError> {
        let m = &self.mining;
        if m.min_ngram == 0 {
            return Err(MineError::Config("mining.min_ngram must be at least 1".into()));
        }
        if m.max_ngram < m.min_ngram {
            return Err(MineError::Config(format!(
                "mining.max_ngram ({}) must not be smaller than mining.min_ngram ({})",
                m.max_ngram, m.min_ngram
            )));
        }
        if m.max_results == 0 {
            return Err(MineError::Config("mining.max_results must be at least 1".into()));
        }
        if m.max_returned_results == 0 {
            return Err(MineError::Config(
                "mining.max_returned_results must be at least 1".into(),
            ));
        }
        if let Some(perc) = m.weight_cutoff_percent {
            if perc > 100 {
                return Err(MineError::Config(format!(
                    "mining.weight_cutoff_percent must be within 0..=100, got {}",
                    perc
                )));
            }
        }
        if !m.output_cutoff.is_finite() {
            return Err(MineError::Config("mining.output_cutoff must be finite".into()));
        }

        let c = &self.columns;
        if c.score.is_some() && c.evalue.is_some() {
            return Err(MineError::Config(
                "columns.score and columns.evalue are mutually exclusive".into(),
            ));
        }
        if c.description == c.query {
            return Err(MineError::Config(format!(
                "columns.description and columns.query must differ (both {})",
                c.description
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
        assert_eq!(config.mining.min_ngram, 2);
        assert_eq!(config.mining.max_ngram, 10);
        assert_eq!(config.mining.max_results, 1);
        assert!(config.mining.unify_unknowns);
        assert_eq!(config.columns.description, 1);
        assert_eq!(config.columns.query, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config::default();
        config.mining.min_ngram = 4;
        config.mining.max_ngram = 3;
        assert!(matches!(config.validate(), Err(MineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_score_and_evalue() {
        let mut config = Config::default();
        config.columns.score = Some(2);
        config.columns.evalue = Some(3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_same_description_and_query() {
        let mut config = Config::default();
        config.columns.description = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_percent_above_hundred() {
        let mut config = Config::default();
        config.mining.weight_cutoff_percent = Some(120);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_and_env_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "phrasemine.toml",
                r#"
                log_level = "debug"
                [mining]
                max_ngram = 5
                [columns]
                evalue = 10
                "#,
            )?;
            jail.set_env("PHRASEMINE_MINING__MAX_RESULTS", "3");

            let config = Config::load(None).expect("config should load");
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.mining.max_ngram, 5);
            assert_eq!(config.mining.min_ngram, 2);
            assert_eq!(config.mining.max_results, 3);
            assert_eq!(config.columns.evalue, Some(10));
            Ok(())
        });
    }
}
