/// Result formatting and writing
///
/// Ranked canonical phrases are resolved to their best original text, cleaned, filtered
/// and cut to the configured number of results. Every query yields at least one line.

use std::cmp::Reverse;
use std::io::Write;

use crate::config::MiningConfig;
use crate::errors::MineError;
use crate::overrep::RankedResults;
use crate::text::canonical::TextMapping;
use crate::text::postprocess::{clean_output, is_mangled};
use crate::text::UNKNOWN_LABEL;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatOptions {
    /// Results scoring below this are skipped
    pub min_score: f64,
    pub max_results: usize,
    /// Reject the generic label itself as a result
    pub unify_unknowns: bool,
}

impl From<&MiningConfig> for FormatOptions {
    fn from(m: &MiningConfig) -> Self {
        FormatOptions {
            min_score: m.output_cutoff,
            max_results: m.max_results,
            unify_unknowns: m.unify_unknowns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResult {
    pub score: f64,
    pub text: String,
}

impl FormattedResult {
    /// Line printed when a query has no acceptable result.
    pub fn fallback(options: &FormatOptions) -> Self {
        FormattedResult {
            score: options.min_score + 1.0,
            text: UNKNOWN_LABEL.to_string(),
        }
    }

}

/// Printable results of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub results: Vec<FormattedResult>,
    /// Nothing acceptable was mined; `results` holds only the fallback line
    pub fallback: bool,
}

fn acceptable(text: &str, options: &FormatOptions) -> bool {
    if is_mangled(text) || text.chars().count() <= 2 {
        return false;
    }
    !(options.unify_unknowns && text == UNKNOWN_LABEL)
}

/// Turn ranked phrases into printable results, best first.
pub fn format(ranked: &RankedResults, mapping: &TextMapping, options: &FormatOptions) -> Formatted {
    let mut results: Vec<FormattedResult> = Vec::new();

    'ranked: for (score, phrases) in ranked.iter() {
        if score < options.min_score {
            break;
        }
        // equal scores: longer phrases first
        let mut ordered: Vec<&String> = phrases.iter().collect();
        ordered.sort_by_key(|p| Reverse(p.split(' ').count()));
        for phrase in ordered {
            let Some(original) = mapping.retrieve_original(phrase) else {
                let err = MineError::MissingCanonicalMapping(phrase.clone());
                tracing::warn!(error = %err, "Dropping phrase");
                continue;
            };
            let text = clean_output(original);
            if !acceptable(&text, options) {
                tracing::trace!(phrase = %phrase, text = %text, "Rejected result text");
                continue;
            }
            if results.iter().any(|r| r.text == text) {
                continue;
            }
            results.push(FormattedResult { score, text });
            if results.len() >= options.max_results {
                break 'ranked;
            }
        }
    }

    if results.is_empty() {
        return Formatted {
            results: vec![FormattedResult::fallback(options)],
            fallback: true,
        };
    }
    Formatted { results, fallback: false }
}

/// Integral scores print without decimals, others with three.
pub fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.3}", score)
    }
}

/// Writes `query \t score \t description` lines.
pub struct ResultWriter<W: Write> {
    inner: W,
    lines: usize,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W) -> Self {
        ResultWriter { inner, lines: 0 }
    }

    pub fn write_results(
        &mut self,
        query: &str,
        results: &[FormattedResult],
    ) -> std::io::Result<()> {
        for result in results {
            writeln!(self.inner, "{}\t{}\t{}", query, format_score(result.score), result.text)?;
            self.lines += 1;
        }
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
