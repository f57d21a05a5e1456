/// Grouped reading of a concatenated multi-query file.
///
/// Consecutive records with the same query form one group. A query that reappears
/// later in the file starts a new group.

use std::io::{BufRead, Lines};

use crate::errors::MineError;
use super::{is_skippable, parse_record, ColumnLayout, RawRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub query: String,
    pub records: Vec<RawRecord>,
}

pub struct GroupedReader<R: BufRead> {
    lines: Lines<R>,
    layout: ColumnLayout,
    pending: Option<RawRecord>,
    line_no: usize,
    skipped: usize,
    finished: bool,
}

impl<R: BufRead> GroupedReader<R> {
    pub fn new(reader: R, layout: ColumnLayout) -> Self {
        GroupedReader {
            lines: reader.lines(),
            layout,
            pending: None,
            line_no: 0,
            skipped: 0,
            finished: false,
        }
    }

    /// Records skipped so far because they failed to parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_record(&mut self) -> Result<Option<RawRecord>, MineError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if is_skippable(&line) {
                continue;
            }
            match parse_record(&line, &self.layout) {
                Ok(record) => return Ok(Some(record)),
                Err(e) if e.is_record_level() => {
                    tracing::warn!(line = self.line_no, error = %e, "Skipping record");
                    self.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

fn query_of(record: &RawRecord) -> &str {
    record.query.as_deref().unwrap_or_default()
}

impl<R: BufRead> Iterator for GroupedReader<R> {
    type Item = Result<RecordGroup, MineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut group: Option<RecordGroup> = self.pending.take().map(|record| RecordGroup {
            query: query_of(&record).to_string(),
            records: vec![record],
        });

        loop {
            let record = match self.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    self.finished = true;
                    return group.map(Ok);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };
            match group.as_mut() {
                None => {
                    group = Some(RecordGroup {
                        query: query_of(&record).to_string(),
                        records: vec![record],
                    });
                }
                Some(current) if current.query == query_of(&record) => current.records.push(record),
                Some(_) => {
                    self.pending = Some(record);
                    return group.map(Ok);
                }
            }
        }
    }
}
