/// Run orchestration for concatenated and directory inputs.
///
/// Loads the background once, streams every query through the pipeline and writes its
/// result lines. Record errors and failed queries are counted, never fatal; input and
/// output IO errors end the run.

use std::fs::File;
use std::io::{BufReader, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::baseline::{best_hit, no_hit};
use crate::config::Config;
use crate::eval::dataset::{load_gold, load_predictions};
use crate::eval::evaluate;
use crate::eval::report::{generate_report, EvaluationReport};
use crate::io::concatenated::GroupedReader;
use crate::io::directory::{list_files, prediction_path, read_background, read_query_file};
use crate::io::ColumnLayout;
use crate::output::ResultWriter;
use crate::overrep::BackgroundModel;
use crate::pipeline::{QueryOutcome, QueryPipeline, QueryStatus};

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub queries: usize,
    pub fallback_queries: usize,
    pub failed_queries: usize,
    pub skipped_records: usize,
    pub background_descriptions: usize,
    pub elapsed_ms: u64,
}

impl RunReport {
    fn start() -> Self {
        RunReport {
            timestamp: Utc::now(),
            ..RunReport::default()
        }
    }

    pub fn record(&mut self, outcome: &QueryOutcome) {
        self.queries += 1;
        match outcome.status {
            QueryStatus::Scored => {}
            QueryStatus::Fallback => self.fallback_queries += 1,
            QueryStatus::Failed => self.failed_queries += 1,
        }
    }
}

/// Print a run summary to stderr (stdout may carry results).
pub fn print_report(report: &RunReport) {
    eprintln!("=== Run Report ===");
    eprintln!("Date: {}", report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    eprintln!("Queries: {}", report.queries);
    eprintln!("  fallback: {}", report.fallback_queries);
    eprintln!("  failed: {}", report.failed_queries);
    eprintln!("Skipped records: {}", report.skipped_records);
    eprintln!("Background descriptions: {}", report.background_descriptions);
    eprintln!("Elapsed: {} ms", report.elapsed_ms);
}

/// Save a run report as pretty JSON.
pub fn save_report(report: &RunReport, path: &Path) -> Result<(), anyhow::Error> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>, anyhow::Error> {
    create_parent(path)?;
    if path.exists() {
        tracing::warn!(path = %path.display(), "Overwriting existing output file");
    }
    let file = File::create(path).with_context(|| format!("creating output {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn progress_bar(len: Option<u64>) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{pos}/{len}] {msg} [{elapsed_precise} / {eta_precise}]")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} [{pos}] {msg} [{elapsed_precise}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    }
}

/// Train the background model from a file or directory, if one is given.
fn load_background(
    config: &Config,
    pipeline: &QueryPipeline,
    path: Option<&Path>,
    report: &mut RunReport,
) -> Result<BackgroundModel, anyhow::Error> {
    let mut background = BackgroundModel::new();
    let Some(path) = path else {
        tracing::info!("No background given, ranking phrases by frequency");
        return Ok(background);
    };
    let layout = ColumnLayout::background(&config.columns);
    let (groups, skipped) = read_background(path, &layout)
        .with_context(|| format!("reading background {}", path.display()))?;
    report.skipped_records += skipped;
    pipeline.train_background(&groups, &mut background);
    report.background_descriptions = background.description_count();
    Ok(background)
}

/// Mine every query of one concatenated file. Results go to `output`, or stdout.
pub fn run_concatenated(
    config: &Config,
    input: &Path,
    background: Option<&Path>,
    output: Option<&Path>,
) -> Result<RunReport, anyhow::Error> {
    let start = Instant::now();
    let mut report = RunReport::start();
    let mut pipeline = QueryPipeline::new(&config.mining)?;
    let background = load_background(config, &pipeline, background, &mut report)?;

    let file = File::open(input).with_context(|| format!("opening input {}", input.display()))?;
    let layout = ColumnLayout::concatenated(&config.columns);
    let mut reader = GroupedReader::new(BufReader::new(file), layout);

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = ResultWriter::new(sink);

    let pb = progress_bar(None);
    for group in reader.by_ref() {
        let group = group.with_context(|| format!("reading input {}", input.display()))?;
        pb.set_message(group.query.clone());
        let outcome = pipeline.process(&group, &background);
        writer.write_results(&outcome.query, &outcome.results)?;
        report.record(&outcome);
        pb.inc(1);
    }
    writer.flush()?;
    pb.finish_with_message("done");

    report.skipped_records += reader.skipped();
    report.elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        queries = report.queries,
        fallback = report.fallback_queries,
        failed = report.failed_queries,
        lines = writer.lines_written(),
        "Run finished"
    );
    Ok(report)
}

/// Mine every file of `input_dir` as one query, writing `<output_dir>/prediction_<name>`.
pub fn run_directory(
    config: &Config,
    input_dir: &Path,
    output_dir: &Path,
    background: Option<&Path>,
) -> Result<RunReport, anyhow::Error> {
    let start = Instant::now();
    let mut report = RunReport::start();
    let mut pipeline = QueryPipeline::new(&config.mining)?;
    let background = load_background(config, &pipeline, background, &mut report)?;

    let files = list_files(input_dir).with_context(|| format!("listing {}", input_dir.display()))?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating directory {}", output_dir.display()))?;
    let layout = ColumnLayout::per_file(&config.columns);

    let pb = progress_bar(Some(files.len() as u64));
    for file in &files {
        let (group, skipped) = read_query_file(file, &layout)
            .with_context(|| format!("reading input {}", file.display()))?;
        report.skipped_records += skipped;
        pb.set_message(group.query.clone());

        let outcome = pipeline.process(&group, &background);
        let path = prediction_path(output_dir, &group.query);
        let mut writer = ResultWriter::new(create_output(&path)?);
        writer.write_results(&outcome.query, &outcome.results)?;
        writer.flush()?;
        report.record(&outcome);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    report.elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        queries = report.queries,
        fallback = report.fallback_queries,
        failed = report.failed_queries,
        "Run finished"
    );
    Ok(report)
}

/// Best-hit baseline over one concatenated file.
pub fn run_baseline(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    avoid_generic: bool,
) -> Result<RunReport, anyhow::Error> {
    let start = Instant::now();
    let mut report = RunReport::start();

    let file = File::open(input).with_context(|| format!("opening input {}", input.display()))?;
    let layout = ColumnLayout::concatenated(&config.columns);
    let mut reader = GroupedReader::new(BufReader::new(file), layout);
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = ResultWriter::new(sink);

    for group in reader.by_ref() {
        let group = group.with_context(|| format!("reading input {}", input.display()))?;
        let hit = match best_hit(&group, avoid_generic) {
            Some(hit) => hit,
            None => {
                report.fallback_queries += 1;
                no_hit()
            }
        };
        writer.write_results(&group.query, std::slice::from_ref(&hit))?;
        report.queries += 1;
    }
    writer.flush()?;

    report.skipped_records = reader.skipped();
    report.elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(queries = report.queries, avoid_generic, "Baseline finished");
    Ok(report)
}

/// Judge a prediction file against gold annotations.
pub fn run_evaluation(
    gold: &Path,
    predictions: &Path,
) -> Result<EvaluationReport, anyhow::Error> {
    let (gold_set, gold_skipped) =
        load_gold(gold).with_context(|| format!("reading gold {}", gold.display()))?;
    let (predicted, predictions_skipped) = load_predictions(predictions)
        .with_context(|| format!("reading predictions {}", predictions.display()))?;
    if gold_skipped + predictions_skipped > 0 {
        tracing::warn!(gold_skipped, predictions_skipped, "Skipped unreadable lines");
    }

    let evaluation = evaluate(&gold_set, &predicted);
    let name = predictions
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| predictions.display().to_string());
    let report = generate_report(&name, &evaluation);
    tracing::info!(
        evaluated = report.evaluated,
        missing = report.missing_predictions,
        f_score = report.f_score,
        "Evaluation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::FormattedResult;

    fn outcome(status: QueryStatus) -> QueryOutcome {
        QueryOutcome {
            query: "Q".into(),
            results: vec![FormattedResult { score: 1.0, text: "x".into() }],
            status,
        }
    }

    #[test]
    fn test_report_counts_statuses() {
        let mut report = RunReport::start();
        report.record(&outcome(QueryStatus::Scored));
        report.record(&outcome(QueryStatus::Fallback));
        report.record(&outcome(QueryStatus::Failed));
        assert_eq!(report.queries, 3);
        assert_eq!(report.fallback_queries, 1);
        assert_eq!(report.failed_queries, 1);
    }

    #[test]
    fn test_report_round_trips_through_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("report.json");
        let mut report = RunReport::start();
        report.queries = 4;
        save_report(&report, &path).expect("save");
        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_evaluation_judges_first_prediction_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gold = dir.path().join("gold.tsv");
        let predictions = dir.path().join("predictions.tsv");
        let manual = "Q1\tkinase domain protein\nQ2\tzinc finger\nQ3\tABC transporter\n";
        std::fs::write(&gold, manual).expect("write gold");
        std::fs::write(
            &predictions,
            "Q1\t9\tkinase domain protein\nQ1\t4\tkinase\nQ2\t3\tputative zinc finger\n",
        )
        .expect("write predictions");

        let report = run_evaluation(&gold, &predictions).expect("evaluate");
        assert_eq!(report.name, "predictions.tsv");
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.missing_predictions, 1);
        assert_eq!(report.counts.true_positives, 2);
        assert_eq!(report.counts.equal_affix, 1);
    }
}
