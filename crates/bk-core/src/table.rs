//! Wide marker table: one row per label, one column per recording.
//!
//! # CSV form
//!
//! ```text
//! Marker Labels,s01.acq,s02.acq
//! Recording Date,2024-03-04 10:00,2024-03-05 09:30
//! Rest,00:05:00,00:04:10
//! Stroop,00:12:00,
//! ```
//!
//! An empty cell means the recording has no such marker.

use std::collections::HashMap;
use std::io::{Read, Write};

use thiserror::Error;

use crate::offset::PerRecordingResult;

pub const LABELS_HEADER: &str = "Marker Labels";
pub const DATE_HEADER: &str = "Recording Date";
/// Legacy trailer row; reading stops there.
const NOTES_ROW: &str = "Notes";

/// Errors reading or writing the table CSV.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The CSV has no header row naming the recordings.
    #[error("marker table is empty")]
    MissingHeader,
}

/// A recording column of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingColumn {
    pub filename: String,
    pub recording_date: String,
}

/// Accumulates per-recording offsets into the wide table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTable {
    columns: Vec<RecordingColumn>,
    labels: Vec<String>,
    /// label -> column index -> `HH:MM:SS`
    cells: HashMap<String, HashMap<usize, String>>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from results in processing order.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a PerRecordingResult>) -> Self {
        let mut table = Self::new();
        for result in results {
            table.fold(result);
        }
        table
    }

    /// Adds one recording as the next column.
    ///
    /// Labels not seen before are appended in the recording's event order.
    pub fn fold(&mut self, result: &PerRecordingResult) {
        let column = self.columns.len();
        self.columns.push(RecordingColumn {
            filename: result.filename.clone(),
            recording_date: result.recording_date.clone(),
        });

        for offset in &result.offsets {
            self.insert(&offset.label, column, offset.time());
        }
    }

    fn insert(&mut self, label: &str, column: usize, time: String) {
        if !self.cells.contains_key(label) {
            self.labels.push(label.to_string());
        }
        self.cells
            .entry(label.to_string())
            .or_default()
            .entry(column)
            .or_insert(time);
    }

    /// Labels in first-occurrence order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn columns(&self) -> &[RecordingColumn] {
        &self.columns
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.filename.as_str())
    }

    /// The time cell for `label` in column `column`, empty if absent.
    pub fn cell(&self, label: &str, column: usize) -> &str {
        self.cells
            .get(label)
            .and_then(|row| row.get(&column))
            .map_or("", String::as_str)
    }

    /// The time cell for `label` in the first column named `filename`.
    pub fn time(&self, label: &str, filename: &str) -> Option<&str> {
        let column = self.columns.iter().position(|c| c.filename == filename)?;
        Some(self.cell(label, column)).filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Writes the two header rows followed by one row per label.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);

        csv.write_record(
            std::iter::once(LABELS_HEADER).chain(self.columns.iter().map(|c| c.filename.as_str())),
        )?;
        csv.write_record(
            std::iter::once(DATE_HEADER)
                .chain(self.columns.iter().map(|c| c.recording_date.as_str())),
        )?;
        for label in &self.labels {
            csv.write_record(
                std::iter::once(label.as_str())
                    .chain((0..self.columns.len()).map(|column| self.cell(label, column))),
            )?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Reads a table back from its CSV form.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = csv.records();

        let header = records.next().ok_or(TableError::MissingHeader)??;
        let dates = records.next().transpose()?;

        let mut table = Self::new();
        table.columns = header
            .iter()
            .skip(1)
            .enumerate()
            .map(|(idx, filename)| RecordingColumn {
                filename: filename.to_string(),
                recording_date: dates
                    .as_ref()
                    .and_then(|d| d.get(idx + 1))
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        let mut reached_notes = false;
        for record in records.by_ref() {
            let record = record?;
            let label = record.get(0).unwrap_or_default().trim();
            if label == NOTES_ROW {
                reached_notes = true;
                break;
            }
            if label.is_empty() {
                continue;
            }
            if !table.cells.contains_key(label) {
                table.labels.push(label.to_string());
                table.cells.insert(label.to_string(), HashMap::new());
            }
            for column in 0..table.columns.len() {
                let time = record.get(column + 1).unwrap_or_default().trim();
                if !time.is_empty() {
                    table.insert(label, column, time.to_string());
                }
            }
        }

        if reached_notes {
            let dropped = records.count();
            if dropped > 0 {
                tracing::warn!(dropped, "ignoring rows after the 'Notes' row");
            }
        }

        Ok(table)
    }
}
