/// Input cleanup applied to every raw description before canonicalization.
///
/// Steps, in order: strip control characters, drop a trailing `[...]` organism tag,
/// remove stop-word prefixes and UniProt-style meta labels, protect `+` and `-` with
/// meta markers. Batch-level hyphenation unification is available separately.

use std::collections::BTreeMap;

use regex::Regex;

use crate::data::DescriptionBatch;
use crate::errors::MineError;
use super::{HYPHEN_META, PLUS_META};

/// Labels removed wherever they occur.
const REMOVE_WORDS: &[&str] = &["RecName:", "Full=", "Short=", "AltName:", "(ISS)"];

/// Secondary-name markers; a RecName record is cut at the first of them.
const RECNAME_CUTS: &[&str] = &["Short=", "AltName:", "Flags:"];

pub struct Preprocessor {
    start_stop_words: Regex,
    control: Regex,
}

impl Preprocessor {
    pub fn new() -> Result<Self, MineError> {
        let start_stop_words = Regex::new(r"(?i)^\s*predicted:\s*")
            .map_err(|e| MineError::Config(format!("Invalid stop-word pattern: {}", e)))?;
        let control = Regex::new(r"\p{Cc}")
            .map_err(|e| MineError::Config(format!("Invalid control pattern: {}", e)))?;
        Ok(Preprocessor { start_stop_words, control })
    }

    /// Full cleanup of one description.
    pub fn prepare(&self, line: &str) -> String {
        let cleaned = self.control.replace_all(line, "");
        let cleaned = remove_trailing_brackets(&cleaned);
        let cleaned = self.remove_stop_words(&cleaned);
        protect(&cleaned).trim().to_string()
    }

    /// Remove leading stop words ("predicted:") and record meta labels
    /// ("RecName: Full=... Short=...") until nothing changes.
    pub fn remove_stop_words(&self, line: &str) -> String {
        let mut current = line.to_string();
        loop {
            let mut changed = false;

            if let Some(m) = self.start_stop_words.find(&current) {
                current = current[m.end()..].to_string();
                changed = true;
            }

            if current.contains("RecName") {
                let cut = RECNAME_CUTS
                    .iter()
                    .filter_map(|marker| current.find(marker))
                    .min();
                if let Some(idx) = cut {
                    if idx > 0 {
                        current.truncate(idx);
                    }
                }
            }

            for word in REMOVE_WORDS {
                if current.contains(word) {
                    current = current.replace(word, "").trim().to_string();
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }
        current.trim().to_string()
    }
}

/// Drop the last `[...]` segment of a line ending in `]`, unless it is the whole line.
pub fn remove_trailing_brackets(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.ends_with(']') {
        if let Some(idx) = trimmed.rfind('[') {
            if idx > 0 {
                return trimmed[..idx].trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

/// Replace `+` and `-` with meta markers so tokenization and punctuation stripping
/// leave them alone.
pub fn protect(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '-' => HYPHEN_META,
            '+' => PLUS_META,
            other => other,
        })
        .collect()
}

/// Rewrite spaced and concatenated variants of hyphenated words to the hyphenated form
/// across one batch ("co expression", "coexpression" -> "co-expression").
///
/// Expects protected text: hyphens are meta markers at this point.
pub fn unify_hyphenation(batch: &mut DescriptionBatch) {
    let meta = HYPHEN_META.to_string();
    let mut conversions: BTreeMap<String, String> = BTreeMap::new();

    for desc in &batch.descriptions {
        for word in desc.description.split_whitespace() {
            let hyphenated = word.trim_matches(HYPHEN_META);
            if hyphenated.contains(HYPHEN_META) {
                conversions.insert(hyphenated.replace(&meta, " "), hyphenated.to_string());
                conversions.insert(hyphenated.replace(&meta, ""), hyphenated.to_string());
            }
        }
    }
    if conversions.is_empty() {
        return;
    }

    for desc in &mut batch.descriptions {
        let mut line = desc.description.clone();
        for (variant, hyphenated) in &conversions {
            if line.contains(variant.as_str()) && !line.contains(hyphenated.as_str()) {
                line = line.replace(variant.as_str(), hyphenated);
            }
        }
        desc.description = line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Description;

    fn pp() -> Preprocessor {
        Preprocessor::new().expect("patterns compile")
    }

    #[test]
    fn test_remove_trailing_brackets() {
        assert_eq!(
            remove_trailing_brackets("ATP synthase subunit [Escherichia coli] "),
            "ATP synthase subunit"
        );
        assert_eq!(remove_trailing_brackets("[whole line]"), "[whole line]");
        assert_eq!(remove_trailing_brackets("kinase [a] domain"), "kinase [a] domain");
    }

    #[test]
    fn test_remove_predicted_prefix() {
        assert_eq!(pp().remove_stop_words("PREDICTED: kinase domain"), "kinase domain");
        assert_eq!(pp().remove_stop_words("predicted: predicted: kinase"), "kinase");
    }

    #[test]
    fn test_remove_recname_labels() {
        let line = "RecName: Full=ATP synthase subunit alpha; Short=ATPase; AltName: Full=F-ATPase";
        assert_eq!(pp().remove_stop_words(line), "ATP synthase subunit alpha;");
    }

    #[test]
    fn test_remove_iss_marker() {
        assert_eq!(pp().remove_stop_words("kinase (ISS)"), "kinase");
    }

    #[test]
    fn test_protect_replaces_plus_and_minus() {
        let protected = protect("ATP-dependent Na+ pump");
        assert!(!protected.contains('-'));
        assert!(!protected.contains('+'));
        assert!(protected.contains(HYPHEN_META));
        assert!(protected.contains(PLUS_META));
    }

    #[test]
    fn test_prepare_full_pipeline() {
        let prepared = pp().prepare("PREDICTED: ATP-dependent helicase\u{7} [Mus musculus]");
        assert_eq!(prepared, protect("ATP-dependent helicase"));
    }

    #[test]
    fn test_unify_hyphenation_across_batch() {
        let mut batch = DescriptionBatch::with_descriptions(
            "q",
            vec![
                Description::new(protect("co-expression factor"), 1.0),
                Description::new("co expression factor", 1.0),
                Description::new("coexpression factor", 1.0),
            ],
        );
        unify_hyphenation(&mut batch);
        let expected = protect("co-expression factor");
        for desc in &batch.descriptions {
            assert_eq!(desc.description, expected);
        }
    }
}
