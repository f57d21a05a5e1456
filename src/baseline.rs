/// Best-hit baseline predictor.
///
/// Reports the first description of each query as-is, optionally skipping generic
/// descriptions. Used as a reference point for mined results.

use crate::io::concatenated::RecordGroup;
use crate::output::FormattedResult;
use crate::text::{is_generic, UNKNOWN_LABEL};

/// Score reported when no usable hit exists.
const NO_HIT_SCORE: f64 = 1.0;

/// Drop the last `[...]` segment of a hit (typically the organism).
fn clean_hit(description: &str) -> String {
    match (description.rfind('['), description.rfind(']')) {
        (Some(open), Some(close)) if open < close => {
            let joined = format!("{} {}", &description[..open], &description[close + 1..]);
            joined.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        _ => description.trim().to_string(),
    }
}

/// First hit of a query, or the first non-generic hit when `avoid_generic` is set.
pub fn best_hit(group: &RecordGroup, avoid_generic: bool) -> Option<FormattedResult> {
    group
        .records
        .iter()
        .map(|r| (r.weight, clean_hit(&r.description)))
        .find(|(_, text)| !text.is_empty() && !(avoid_generic && is_generic(text)))
        .map(|(score, text)| FormattedResult { score, text })
}

/// Line reported for a query without a usable hit.
pub fn no_hit() -> FormattedResult {
    FormattedResult {
        score: NO_HIT_SCORE,
        text: UNKNOWN_LABEL.to_string(),
    }
}
