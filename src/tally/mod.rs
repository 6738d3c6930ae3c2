//! Tally of labeled-vs-predicted outcomes from a tagged CSV file.
//!
//! Each data row carries a category label at a fixed column and an outcome
//! marker in its last column. The tally buckets outcomes per category into
//! correct / incorrect / unknown counts.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::open_maybe_gzip;

/// 0-based index of the category column in the tagged file
const CATEGORY_FIELD: usize = 4;

/// Categories present in every table before any row is read
const SEEDED_CATEGORIES: &[&str] = &["t", ""];

/// Errors raised while tallying a tagged file
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("data row {row}: expected at least {required} fields, got {got}")]
    MissingField {
        row: usize,
        required: usize,
        got: usize,
    },

    #[error("failed to read tagged file")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV")]
    Csv(#[from] csv::Error),
}

/// Per-category outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub correct: u64,
    pub incorrect: u64,
    pub unknown: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.correct + self.incorrect + self.unknown
    }

    /// Bucket one outcome marker.
    ///
    /// Only "1" and "UNKNOWN" are matched, exactly and case-sensitively;
    /// every other value (including "0", "-1" and malformed markers) counts
    /// as incorrect. The catch-all is deliberate, not a missing validation.
    fn record(&mut self, outcome: &str) {
        match outcome {
            "1" => self.correct += 1,
            "UNKNOWN" => self.unknown += 1,
            _ => self.incorrect += 1,
        }
    }

    fn add(&mut self, other: &OutcomeCounts) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.unknown += other.unknown;
    }
}

/// Mapping from category label to outcome counts.
///
/// Categories are not pre-declared: the first row mentioning a new category
/// initializes its counts to zero. Two sentinel categories, `"t"` and the
/// empty string, are seeded at zero when the table is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TallyTable {
    categories: BTreeMap<String, OutcomeCounts>,
}

impl TallyTable {
    /// Create a table holding only the seeded sentinel categories
    pub fn new() -> Self {
        let categories = SEEDED_CATEGORIES
            .iter()
            .map(|c| (c.to_string(), OutcomeCounts::default()))
            .collect();
        Self { categories }
    }

    /// Bucket one outcome under the given category, initializing the
    /// category on first touch
    pub fn record(&mut self, category: &str, outcome: &str) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .record(outcome);
    }

    pub fn get(&self, category: &str) -> Option<&OutcomeCounts> {
        self.categories.get(category)
    }

    /// Iterate categories in sorted order
    pub fn iter(&self) -> btree_map::Iter<'_, String, OutcomeCounts> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Counts summed over every category
    pub fn totals(&self) -> OutcomeCounts {
        let mut totals = OutcomeCounts::default();
        for counts in self.categories.values() {
            totals.add(counts);
        }
        totals
    }
}

impl Default for TallyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TallyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Labeled\tcorrect\tincorrect\tunknown\tTotal")?;
        for (category, counts) in self.iter() {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}",
                category,
                counts.correct,
                counts.incorrect,
                counts.unknown,
                counts.total()
            )?;
        }
        let totals = self.totals();
        writeln!(
            f,
            "TOTAL\t{}\t{}\t{}\t{}",
            totals.correct,
            totals.incorrect,
            totals.unknown,
            totals.total()
        )
    }
}

fn tally_record(table: &mut TallyTable, record: &StringRecord, row_no: usize) -> Result<(), TallyError> {
    let got = record.len();
    let category = record
        .get(CATEGORY_FIELD)
        .ok_or(TallyError::MissingField {
            row: row_no,
            required: CATEGORY_FIELD + 1,
            got,
        })?;
    // the outcome marker lives in the last field; rows long enough to have
    // a category always have one
    let outcome = record.iter().last().ok_or(TallyError::MissingField {
        row: row_no,
        required: 1,
        got,
    })?;
    table.record(category, outcome);
    Ok(())
}

/// Tally pre-skipped data rows (no header) into a fresh table.
///
/// A row without the category column fails the whole run; nothing of the bad
/// row is tallied.
pub fn tally_rows<I>(rows: I) -> Result<TallyTable, TallyError>
where
    I: IntoIterator<Item = StringRecord>,
{
    let mut table = TallyTable::new();
    for (idx, record) in rows.into_iter().enumerate() {
        tally_record(&mut table, &record, idx + 1)?;
    }
    Ok(table)
}

/// Tally every data row from a CSV source. The first row is a header and is
/// skipped unconditionally.
pub fn tally_reader<R: Read>(reader: R) -> Result<TallyTable, TallyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut table = TallyTable::new();
    let mut row_no = 0;
    for record in csv_reader.records() {
        let record = record?;
        row_no += 1;
        tally_record(&mut table, &record, row_no)?;
    }
    Ok(table)
}

/// Tally a tagged CSV file (gzip-aware). The file handle is released when
/// this returns, on success and on error alike.
pub fn tally_file<P: AsRef<Path>>(path: P) -> Result<TallyTable, TallyError> {
    let reader = open_maybe_gzip(path.as_ref())?;
    tally_reader(reader)
}
