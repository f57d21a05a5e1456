/// Gold annotations and prediction files.
///
/// Gold lines are `query \t annotation [\t annotation ...]`, manual annotations in
/// order of preference; a query may span several lines. Prediction lines are the
/// `query \t score \t description` lines written by `mine`, best first.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::MineError;
use crate::io::{is_skippable, read_records, ColumnLayout, WeightColumn};

/// Column layout of a result file.
const PREDICTION_LAYOUT: ColumnLayout = ColumnLayout {
    description: 2,
    query: Some(0),
    weight: WeightColumn::Score(1),
};

/// Manual annotations per query. Returns the annotations and the number of skipped lines.
pub fn read_gold<R: BufRead>(
    reader: R,
) -> Result<(BTreeMap<String, Vec<String>>, usize), MineError> {
    let mut gold: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut skipped = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
        let (Some(query), Some(first)) = (fields.next(), fields.next()) else {
            tracing::warn!(line = idx + 1, "Skipping gold line without annotation");
            skipped += 1;
            continue;
        };
        let annotations = gold.entry(query.to_string()).or_default();
        annotations.push(first.to_string());
        annotations.extend(fields.map(str::to_string));
    }
    Ok((gold, skipped))
}

/// First (best) prediction per query. Returns the predictions and the number of skipped lines.
pub fn read_predictions<R: BufRead>(
    reader: R,
    source: &str,
) -> Result<(BTreeMap<String, String>, usize), MineError> {
    let (records, skipped) = read_records(reader, &PREDICTION_LAYOUT, source)?;
    let mut predictions = BTreeMap::new();
    for record in records {
        let query = record.query.unwrap_or_default();
        predictions.entry(query).or_insert(record.description);
    }
    Ok((predictions, skipped))
}

pub fn load_gold(path: &Path) -> Result<(BTreeMap<String, Vec<String>>, usize), MineError> {
    read_gold(BufReader::new(File::open(path)?))
}

pub fn load_predictions(path: &Path) -> Result<(BTreeMap<String, String>, usize), MineError> {
    let source = path.display().to_string();
    read_predictions(BufReader::new(File::open(path)?), &source)
}
