/// Tab-delimited input records
///
/// - `concatenated`: one file, consecutive records grouped by query
/// - `directory`: one file per query, and background corpus loading

pub mod concatenated;
pub mod directory;

use std::io::BufRead;

use crate::config::ColumnsConfig;
use crate::errors::MineError;

/// Score assigned to an e-value of exactly zero.
pub const ZERO_EVALUE_SCORE: f64 = 250.0;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub query: Option<String>,
    pub description: String,
    pub weight: f64,
}

/// Where the weight of a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightColumn {
    /// Every record weighs 1.0
    Unit,
    Score(usize),
    EValue(usize),
}

/// Column positions for one kind of input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub description: usize,
    pub query: Option<usize>,
    pub weight: WeightColumn,
}

impl ColumnLayout {
    fn weighted(columns: &ColumnsConfig, query: Option<usize>) -> Self {
        let weight = match (columns.score, columns.evalue) {
            (Some(col), _) => WeightColumn::Score(col),
            (None, Some(col)) => WeightColumn::EValue(col),
            (None, None) => WeightColumn::Unit,
        };
        ColumnLayout {
            description: columns.description,
            query,
            weight,
        }
    }

    /// Records of many queries in one file.
    pub fn concatenated(columns: &ColumnsConfig) -> Self {
        Self::weighted(columns, Some(columns.query))
    }

    /// Records of one query per file; the query column is not read.
    pub fn per_file(columns: &ColumnsConfig) -> Self {
        Self::weighted(columns, None)
    }

    /// Background corpus lines: one description column, unit weight.
    pub fn background(columns: &ColumnsConfig) -> Self {
        ColumnLayout {
            description: columns.background_description,
            query: None,
            weight: WeightColumn::Unit,
        }
    }
}

/// Header lines start with "querylocus" in any case.
pub fn is_header(line: &str) -> bool {
    line.trim_start().to_lowercase().starts_with("querylocus")
}

/// Whether a line carries no record at all (blank or header).
pub fn is_skippable(line: &str) -> bool {
    line.trim().is_empty() || is_header(line)
}

fn column<'a>(fields: &[&'a str], column: usize) -> Result<&'a str, MineError> {
    fields.get(column).copied().ok_or(MineError::InvalidColumnIndex {
        column,
        available: fields.len(),
    })
}

/// Convert an e-value into a score: 250 for zero, otherwise one plus the number of
/// tenfold steps needed to reach 1.
pub fn evalue_to_score(raw: &str) -> Result<f64, MineError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| MineError::malformed_weight(raw, "e-value is not a number"))?;
    if value.is_nan() || value < 0.0 {
        return Err(MineError::malformed_weight(raw, "e-value must be non-negative"));
    }
    if value == 0.0 {
        return Ok(ZERO_EVALUE_SCORE);
    }
    // compare against 10^-k directly; repeated *10 drifts off exact powers
    let mut steps = 0i32;
    while value < 1.0 / 10f64.powi(steps) {
        steps += 1;
    }
    Ok(f64::from(steps) + 1.0)
}

/// Parse one tab-delimited line.
pub fn parse_record(line: &str, layout: &ColumnLayout) -> Result<RawRecord, MineError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let description = column(&fields, layout.description)?.trim().to_string();
    let query = match layout.query {
        Some(col) => Some(column(&fields, col)?.trim().to_string()),
        None => None,
    };
    let weight = match layout.weight {
        WeightColumn::Unit => 1.0,
        WeightColumn::Score(col) => {
            let raw = column(&fields, col)?;
            let score = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| MineError::malformed_weight(raw, "score is not a number"))?;
            if !score.is_finite() {
                return Err(MineError::malformed_weight(raw, "score is not finite"));
            }
            score
        }
        WeightColumn::EValue(col) => evalue_to_score(column(&fields, col)?)?,
    };
    Ok(RawRecord { query, description, weight })
}

/// Read every record of a reader, skipping bad lines with a warning.
///
/// Returns the records and the number of skipped lines. IO errors are fatal.
pub fn read_records<R: BufRead>(
    reader: R,
    layout: &ColumnLayout,
    source: &str,
) -> Result<(Vec<RawRecord>, usize), MineError> {
    let mut records = Vec::new();
    let mut skipped = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        match parse_record(&line, layout) {
            Ok(record) => records.push(record),
            Err(e) if e.is_record_level() => {
                tracing::warn!(source, line = idx + 1, error = %e, "Skipping record");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((records, skipped))
}
