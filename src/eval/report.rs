/// Evaluation reporting: confusion counts, precision/recall/F-score and the
/// mismatching annotation pairs, as a printable summary and as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Comparison, Evaluation, Verdict};

/// Query counts per verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub true_positives: usize,
    /// True positives that only matched after affix removal
    pub equal_affix: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub shorter: usize,
    pub longer: usize,
    pub different: usize,
    pub invented: usize,
}

impl VerdictCounts {
    pub fn false_positives(&self) -> usize {
        self.invented + self.different + self.shorter + self.longer
    }

    pub fn predicted_positives(&self) -> usize {
        self.true_positives + self.false_positives()
    }

    pub fn predicted_negatives(&self) -> usize {
        self.true_negatives + self.false_negatives
    }

    pub fn gold_negatives(&self) -> usize {
        self.true_negatives + self.invented
    }

    pub fn gold_positives(&self) -> usize {
        self.predicted_positives() + self.predicted_negatives() - self.gold_negatives()
    }
}

/// Full evaluation report of one prediction file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub evaluated: usize,
    pub missing_predictions: usize,
    pub next_manual_consulted: usize,
    pub counts: VerdictCounts,
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
    pub specificity: f64,
    /// `manual <-> predicted` pairs that are equal up to affixes, with their frequency
    pub affix_pairs: BTreeMap<String, usize>,
    /// `manual -> predicted` pairs where the prediction is shorter
    pub shorter_pairs: BTreeMap<String, usize>,
    /// `manual <- predicted` pairs where the prediction is longer
    pub longer_pairs: BTreeMap<String, usize>,
    /// `manual <-> predicted` pairs that do not match at all
    pub different_pairs: BTreeMap<String, usize>,
}

fn tally(pairs: &mut BTreeMap<String, usize>, pair: String) {
    *pairs.entry(pair).or_insert(0) += 1;
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

/// Generate an EvaluationReport from judged queries.
pub fn generate_report(name: &str, evaluation: &Evaluation) -> EvaluationReport {
    let mut counts = VerdictCounts::default();
    let mut affix_pairs: BTreeMap<String, usize> = BTreeMap::new();
    let mut shorter_pairs: BTreeMap<String, usize> = BTreeMap::new();
    let mut longer_pairs: BTreeMap<String, usize> = BTreeMap::new();
    let mut different_pairs: BTreeMap<String, usize> = BTreeMap::new();

    for q in &evaluation.queries {
        match q.verdict {
            Verdict::TruePositive => {
                counts.true_positives += 1;
                if q.comparison == Comparison::EqualAffix {
                    counts.equal_affix += 1;
                    tally(&mut affix_pairs, format!("{} <-> {}", q.manual, q.predicted));
                }
            }
            Verdict::TrueNegative => counts.true_negatives += 1,
            Verdict::FalseNegative => counts.false_negatives += 1,
            Verdict::Invented => counts.invented += 1,
            Verdict::Shorter => {
                counts.shorter += 1;
                tally(&mut shorter_pairs, format!("{} -> {}", q.manual, q.predicted));
            }
            Verdict::Longer => {
                counts.longer += 1;
                tally(&mut longer_pairs, format!("{} <- {}", q.manual, q.predicted));
            }
            Verdict::Different => {
                counts.different += 1;
                tally(&mut different_pairs, format!("{} <-> {}", q.manual, q.predicted));
            }
        }
    }

    let precision = ratio(counts.true_positives, counts.predicted_positives());
    let recall = ratio(counts.true_positives, counts.gold_positives());
    let f_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    EvaluationReport {
        name: name.to_string(),
        timestamp: Utc::now(),
        evaluated: evaluation.queries.len(),
        missing_predictions: evaluation.missing.len(),
        next_manual_consulted: evaluation.queries.iter().filter(|q| q.consulted_next).count(),
        specificity: ratio(counts.true_negatives, counts.gold_negatives()),
        precision,
        recall,
        f_score,
        counts,
        affix_pairs,
        shorter_pairs,
        longer_pairs,
        different_pairs,
    }
}

fn print_pairs(title: &str, pairs: &BTreeMap<String, usize>) {
    if pairs.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for (pair, n) in pairs {
        println!("  {} ({} cases)", pair, n);
    }
}

/// Print a formatted report to stdout.
pub fn print_report(report: &EvaluationReport) {
    let c = &report.counts;
    println!("=== Evaluation Report: {} ===", report.name);
    println!("Date: {}", report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!(
        "Queries: {} evaluated, {} without prediction, {} matched a later manual annotation",
        report.evaluated, report.missing_predictions, report.next_manual_consulted
    );

    print_pairs("Equal except for affixes (manual <-> predicted)", &report.affix_pairs);
    print_pairs("Shorter (manual -> predicted)", &report.shorter_pairs);
    print_pairs("Longer (manual <- predicted)", &report.longer_pairs);
    print_pairs("Different (manual <-> predicted)", &report.different_pairs);

    println!();
    println!("Predicted positives: {}", c.predicted_positives());
    println!("Predicted negatives: {}", c.predicted_negatives());
    println!("Gold positives: {}", c.gold_positives());
    println!("Gold negatives: {}", c.gold_negatives());
    println!();
    println!("TP: {} ({} after affix removal)", c.true_positives, c.equal_affix);
    println!(
        "FP: {} ({} shorter, {} longer, {} different, {} invented)",
        c.false_positives(),
        c.shorter,
        c.longer,
        c.different,
        c.invented
    );
    println!("FN: {}", c.false_negatives);
    println!("TN: {}", c.true_negatives);
    println!();
    println!("Precision: {:.1}%", report.precision * 100.0);
    println!("Recall: {:.1}%", report.recall * 100.0);
    println!("F-score: {:.1}%", report.f_score * 100.0);
    println!("Specificity: {:.1}%", report.specificity * 100.0);
}

/// Save report as JSON to a file path.
pub fn save_report(report: &EvaluationReport, path: &Path) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{evaluate_query, QueryEvaluation};

    fn judged(manual: &str, predicted: &str) -> QueryEvaluation {
        evaluate_query("Q", &[manual.to_string()], predicted).expect("manual")
    }

    fn sample() -> Evaluation {
        Evaluation {
            queries: vec![
                judged("zinc finger protein 3", "zinc finger protein 3"),
                judged("putative kinase", "kinase"),
                judged("hypothetical protein", "conserved unknown protein"),
                judged("ABC transporter", "conserved unknown protein"),
                judged("serine/threonine kinase domain", "kinase domain"),
                judged("zinc finger", "ABC transporter"),
                judged("hypothetical protein", "zinc finger"),
            ],
            missing: vec!["Q9".to_string()],
        }
    }

    #[test]
    fn test_counts_follow_verdicts() {
        let report = generate_report("sample", &sample());
        let c = &report.counts;
        assert_eq!(report.evaluated, 7);
        assert_eq!(report.missing_predictions, 1);
        assert_eq!(c.true_positives, 2);
        assert_eq!(c.equal_affix, 1);
        assert_eq!(c.true_negatives, 1);
        assert_eq!(c.false_negatives, 1);
        assert_eq!(c.shorter, 1);
        assert_eq!(c.different, 1);
        assert_eq!(c.invented, 1);
        assert_eq!(c.false_positives(), 3);
        assert_eq!(c.gold_negatives(), 2);
        assert_eq!(c.gold_positives(), 5);
    }

    #[test]
    fn test_rates() {
        let report = generate_report("sample", &sample());
        assert!((report.precision - 0.4).abs() < 1e-9);
        assert!((report.recall - 0.4).abs() < 1e-9);
        assert!((report.f_score - 0.4).abs() < 1e-9);
        assert!((report.specificity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mismatch_pairs_are_tallied() {
        let report = generate_report("sample", &sample());
        assert_eq!(report.affix_pairs.get("putative kinase <-> kinase"), Some(&1));
        let shorter = "serine/threonine kinase domain -> kinase domain";
        assert_eq!(report.shorter_pairs.get(shorter), Some(&1));
        assert_eq!(report.different_pairs.get("zinc finger <-> ABC transporter"), Some(&1));
        assert!(report.longer_pairs.is_empty());
    }

    #[test]
    fn test_empty_evaluation_has_zero_rates() {
        let report = generate_report("empty", &Evaluation::default());
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f_score, 0.0);
        assert_eq!(report.specificity, 0.0);
    }

    #[test]
    fn test_report_json_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("eval.json");
        let report = generate_report("sample", &sample());
        save_report(&report, &path).expect("save");
        let loaded: EvaluationReport =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded.counts, report.counts);
        assert_eq!(loaded.different_pairs, report.different_pairs);
    }
}
