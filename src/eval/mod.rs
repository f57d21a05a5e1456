/// Evaluation of predicted descriptions against manual gold annotations.
///
/// Each gold query is judged on its first prediction. Manual annotations are tried in
/// order until one is not outright different. Generic descriptions on either side
/// count as negatives, so "hypothetical protein" against a manual
/// "uncharacterized protein" is a true negative.

pub mod dataset;
pub mod report;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Descriptions that carry no function, matched lowercase.
const UNDEFINED_EXACT: &[&str] = &[
    "hypothetical protein",
    "uncharacterized protein",
    "predicted protein",
    "conserved unknown protein",
    "conserved hypothetical protein",
    "unnamed protein product",
];

/// "hypothetical protein XXX" with a single trailing identifier is undefined as well.
const UNDEFINED_PREFIXES: &[&str] = &["hypothetical protein", "uncharacterized protein"];

/// Leading qualifiers removed before comparison, in this order.
const AFFIX_PREFIXES: &[&str] = &[
    "uncharacterized",
    "predicted:",
    "predicted",
    "probable",
    "putative",
];

/// Trailing qualifiers removed before comparison, in this order.
const AFFIX_SUFFIXES: &[&str] = &[
    ", putative",
    "(iss)",
    "protein",
    "homolog",
    "isoform x1",
    "isoform x2",
    "isoform x3",
    "isoform",
    "-like",
];

/// How a prediction relates to a manual annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Equal,
    /// Equal once qualifiers such as "putative" or "protein" are removed
    EqualAffix,
    /// The prediction is contained in the manual annotation
    Shorter,
    /// The manual annotation is contained in the prediction
    Longer,
    Different,
}

/// Judgement of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    TruePositive,
    TrueNegative,
    /// Generic prediction where the manual annotation names a function
    FalseNegative,
    /// A function predicted where the manual annotation is generic
    Invented,
    Shorter,
    Longer,
    Different,
}

impl Verdict {
    pub fn is_false_positive(self) -> bool {
        matches!(
            self,
            Verdict::Invented | Verdict::Shorter | Verdict::Longer | Verdict::Different
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub query: String,
    /// The manual annotation the prediction was finally compared with
    pub manual: String,
    pub predicted: String,
    pub comparison: Comparison,
    pub verdict: Verdict,
    /// A later manual annotation was consulted because the first one differed
    pub consulted_next: bool,
}

/// Whether a description names no function at all.
pub fn is_undefined(description: &str) -> bool {
    let lower = description.to_lowercase();
    if UNDEFINED_EXACT.contains(&lower.as_str()) {
        return true;
    }
    UNDEFINED_PREFIXES.iter().any(|p| lower.starts_with(p))
        && description.split(' ').filter(|t| !t.is_empty()).count() == 3
}

/// Lowercase and strip qualifying affixes until nothing changes.
pub fn clean(description: &str) -> String {
    let mut current = description.trim().to_lowercase();
    loop {
        let before = current.len();
        for prefix in AFFIX_PREFIXES {
            if let Some(rest) = current.strip_prefix(prefix) {
                current = rest.trim().to_string();
            }
        }
        for suffix in AFFIX_SUFFIXES {
            if let Some(rest) = current.strip_suffix(suffix) {
                current = rest.trim().to_string();
            }
        }
        if current.len() == before {
            return current;
        }
    }
}

/// Hyphens read as spaces, commas dropped.
fn relaxed(text: &str) -> String {
    text.replace('-', " ").replace(',', "")
}

/// Compare texts as given: equal, or one contained in the other.
fn compare_texts(gold: &str, prediction: &str) -> Comparison {
    if gold == prediction {
        return Comparison::Equal;
    }
    if gold.contains(prediction) {
        return Comparison::Shorter;
    }
    let gold = relaxed(gold);
    let prediction = relaxed(prediction);
    if gold == prediction {
        Comparison::Equal
    } else if gold.contains(&prediction) {
        Comparison::Shorter
    } else if prediction.contains(&gold) {
        Comparison::Longer
    } else {
        Comparison::Different
    }
}

/// Compare a prediction with one manual annotation.
///
/// Exact equality of the raw texts is `Equal`; equality after `clean` is
/// `EqualAffix`. Containment is judged on the cleaned texts.
pub fn compare(manual: &str, predicted: &str) -> Comparison {
    if compare_texts(manual, predicted) == Comparison::Equal {
        return Comparison::Equal;
    }
    match compare_texts(&clean(manual), &clean(predicted)) {
        Comparison::Equal => Comparison::EqualAffix,
        other => other,
    }
}

fn verdict(manual: &str, predicted: &str, comparison: Comparison) -> Verdict {
    match (is_undefined(manual), is_undefined(predicted)) {
        (true, true) => Verdict::TrueNegative,
        (false, true) => Verdict::FalseNegative,
        (true, false) => Verdict::Invented,
        (false, false) => match comparison {
            Comparison::Equal | Comparison::EqualAffix => Verdict::TruePositive,
            Comparison::Shorter => Verdict::Shorter,
            Comparison::Longer => Verdict::Longer,
            Comparison::Different => Verdict::Different,
        },
    }
}

/// Judge one prediction against the ordered manual annotations of its query.
///
/// Returns None when there is no manual annotation.
pub fn evaluate_query(
    query: &str,
    manuals: &[String],
    predicted: &str,
) -> Option<QueryEvaluation> {
    let mut manuals = manuals.iter();
    let mut manual = manuals.next()?;
    let mut comparison = compare(manual, predicted);
    let mut consulted_next = false;
    while comparison == Comparison::Different {
        let Some(next) = manuals.next() else {
            break;
        };
        manual = next;
        comparison = compare(manual, predicted);
        consulted_next = true;
    }
    Some(QueryEvaluation {
        query: query.to_string(),
        manual: manual.clone(),
        predicted: predicted.to_string(),
        comparison,
        verdict: verdict(manual, predicted, comparison),
        consulted_next,
    })
}

/// Outcome of evaluating a whole prediction set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub queries: Vec<QueryEvaluation>,
    /// Gold queries without any prediction (or without a manual annotation)
    pub missing: Vec<String>,
}

/// Evaluate every gold query. Predictions for queries outside the gold set are ignored.
pub fn evaluate(
    gold: &BTreeMap<String, Vec<String>>,
    predictions: &BTreeMap<String, String>,
) -> Evaluation {
    let mut evaluation = Evaluation::default();
    for (query, manuals) in gold {
        let judged = predictions
            .get(query)
            .and_then(|predicted| evaluate_query(query, manuals, predicted));
        match judged {
            Some(judged) => evaluation.queries.push(judged),
            None => {
                tracing::warn!(query = %query, "No prediction for gold query");
                evaluation.missing.push(query.clone());
            }
        }
    }
    evaluation
}
