use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use phrasemine::config::Config;
use phrasemine::eval::report as eval_report;
use phrasemine::logging;
use phrasemine::runner::{self, RunReport};

#[derive(Parser)]
#[command(
    name = "phrasemine",
    version,
    about = "Consensus description mining via n-gram overrepresentation"
)]
struct Cli {
    /// Configuration file (default: phrasemine.toml in the working directory)
    #[arg(long, global = true, env = "PHRASEMINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine every query of one concatenated tab-delimited file
    Mine {
        #[arg(long)]
        input: PathBuf,
        /// Background corpus file or directory
        #[arg(long)]
        background: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write a JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        mining: MiningArgs,
    },
    /// Mine one query per file of a directory
    MineDir {
        #[arg(long)]
        input: PathBuf,
        /// Output directory, receives prediction_<name> per input file
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        background: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        mining: MiningArgs,
    },
    /// Report the best hit of every query
    Baseline {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip generic hits such as "hypothetical protein"
        #[arg(long)]
        avoid_generic: bool,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Compare predictions with manual gold annotations
    Evaluate {
        /// Gold file: query, then manual annotations in order of preference
        #[arg(long)]
        gold: PathBuf,
        /// Result file written by `mine`
        #[arg(long)]
        predictions: PathBuf,
        /// Write a JSON evaluation report here
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Args, Default)]
struct ColumnArgs {
    #[arg(long)]
    description_col: Option<usize>,
    #[arg(long)]
    query_col: Option<usize>,
    #[arg(long)]
    score_col: Option<usize>,
    #[arg(long)]
    evalue_col: Option<usize>,
}

impl ColumnArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = self.description_col {
            config.columns.description = v;
        }
        if let Some(v) = self.query_col {
            config.columns.query = v;
        }
        if let Some(v) = self.score_col {
            config.columns.score = Some(v);
            config.columns.evalue = None;
        }
        if let Some(v) = self.evalue_col {
            config.columns.evalue = Some(v);
            config.columns.score = None;
        }
    }
}

#[derive(Args, Default)]
struct MiningArgs {
    #[arg(long)]
    min_ngram: Option<usize>,
    #[arg(long)]
    max_ngram: Option<usize>,
    /// Results reported per query
    #[arg(long)]
    max_results: Option<usize>,
    /// Results scoring below this are not reported
    #[arg(long)]
    output_cutoff: Option<f64>,
    /// Keep only descriptions weighing at least this percentage of the best one
    #[arg(long)]
    weight_cutoff: Option<u32>,
    #[arg(long)]
    no_normalization: bool,
    /// Match phrases regardless of word order
    #[arg(long)]
    reorder: bool,
    #[command(flatten)]
    columns: ColumnArgs,
}

impl MiningArgs {
    fn apply(&self, config: &mut Config) {
        let m = &mut config.mining;
        if let Some(v) = self.min_ngram {
            m.min_ngram = v;
        }
        if let Some(v) = self.max_ngram {
            m.max_ngram = v;
        }
        if let Some(v) = self.max_results {
            m.max_results = v;
        }
        if let Some(v) = self.output_cutoff {
            m.output_cutoff = v;
        }
        if let Some(v) = self.weight_cutoff {
            m.weight_cutoff_percent = Some(v);
        }
        if self.no_normalization {
            m.normalization = false;
        }
        if self.reorder {
            m.allow_reordering = true;
        }
        self.columns.apply(config);
    }
}

fn finish(report: &RunReport, path: Option<&PathBuf>) -> Result<()> {
    runner::print_report(report);
    if let Some(path) = path {
        runner::save_report(report, path)?;
        tracing::info!(path = %path.display(), "Run report saved");
    }
    Ok(())
}

fn main() -> Result<()> {
    // 1. Parse CLI args
    let cli = Cli::parse();

    // 2. Load configuration, apply CLI overrides, validate once
    let mut config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Commands::Mine { mining, .. } | Commands::MineDir { mining, .. } => {
            mining.apply(&mut config)
        }
        Commands::Baseline { columns, .. } => columns.apply(&mut config),
        Commands::Evaluate { .. } | Commands::Config => {}
    }
    config.validate()?;

    // 3. Initialize logging (stderr only; stdout may carry results)
    logging::init_logging(&config);

    // 4. Handle subcommands
    match cli.command {
        Commands::Mine { input, background, output, report, .. } => {
            tracing::info!(
                input = %input.display(),
                version = env!("CARGO_PKG_VERSION"),
                "Mining descriptions"
            );
            let run = runner::run_concatenated(
                &config,
                &input,
                background.as_deref(),
                output.as_deref(),
            )?;
            finish(&run, report.as_ref())?;
        }
        Commands::MineDir { input, output, background, report, .. } => {
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                "Mining description directory"
            );
            let run = runner::run_directory(&config, &input, &output, background.as_deref())?;
            finish(&run, report.as_ref())?;
        }
        Commands::Baseline { input, output, avoid_generic, .. } => {
            let run = runner::run_baseline(&config, &input, output.as_deref(), avoid_generic)?;
            finish(&run, None)?;
        }
        Commands::Evaluate { gold, predictions, report } => {
            let evaluation = runner::run_evaluation(&gold, &predictions)?;
            eval_report::print_report(&evaluation);
            if let Some(path) = report {
                eval_report::save_report(&evaluation, &path)?;
                tracing::info!(path = %path.display(), "Evaluation report saved");
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
