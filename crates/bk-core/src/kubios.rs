//! `Kubios_Samples.csv` generation.
//!
//! Kubios reads sample definitions from a CSV next to the measurement file:
//! one row per file, then a (label, start, end) triple per sample. Times here
//! are relative to the reference marker, formatted `HH:MM:SS`.

use std::io::{Read, Write};

use thiserror::Error;

use crate::section::{SectionSetting, SectionSettings};
use crate::table::{AggregateTable, TableError};
use crate::timefmt::{InvalidTime, format_hms, parse_hms};

/// Column 2 value written on every row.
pub const TIME_BASE_FLAG: &str = "0";

/// Documentation rows Kubios expects at the top of the file. `None` is a
/// blank line.
const PREAMBLE: [Option<&str>; 10] = [
    Some("Kubios_Samples.csv"),
    Some(
        "File is used for the automatic sample generation. Kubios_Samples.csv file must be saved in the same folder as measurement file.",
    ),
    None,
    Some("Column 1: File name e.g: polar_rr_data.hrm"),
    Some(
        "Column 2: 0 = Sample time is given in absolute time; 1 = Sample time is given relative to beginning of the measurement",
    ),
    Some(
        r#"Column 3: Sample Label for first sample (e.g. "Sample 1") and optionally followed by an RGB color code for the sample (e.g. "Sample 1 #255 0 0")"#,
    ),
    Some(
        r#"Column 4: Start time of the sample in seconds (e.g. "600"); in hh:mm:ss format (e.g. "00:10:00"); or "START" to indicate that sample starts from the beginning of the measurement"#,
    ),
    Some(
        r#"Column 5: End time of the sample in seconds (e.g. "600"); in hh:mm:ss format (e.g. "00:10:00"); or "END" to indicate that the sample ends at the end of the measurement"#,
    ),
    Some("Column 6-xx: Repeat columns 3-5 for Samples 2...N"),
    None,
];

/// Labels in the table without section settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing section settings for: {}", labels.join(", "))]
pub struct MissingSectionSettingError {
    pub labels: Vec<String>,
}

#[derive(Debug, Error)]
pub enum KubiosError {
    #[error(transparent)]
    MissingSectionSetting(#[from] MissingSectionSettingError),
    /// A table cell is not a valid time.
    #[error("bad time for '{label}' in {filename}")]
    InvalidTime {
        filename: String,
        label: String,
        #[source]
        source: InvalidTime,
    },
    /// Buffer plus duration pushes a sample past what a time can hold.
    #[error("sample window for '{label}' in {filename} is out of range")]
    WindowOverflow { filename: String, label: String },
    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<csv::Error> for KubiosError {
    fn from(err: csv::Error) -> Self {
        Self::Table(TableError::Csv(err))
    }
}

impl From<std::io::Error> for KubiosError {
    fn from(err: std::io::Error) -> Self {
        Self::Table(TableError::Io(err))
    }
}

/// One Kubios sample: colored label with its start and end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    pub annotated_label: String,
    pub start: String,
    pub end: String,
}

/// All samples of one recording, one slot per table label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubiosRow {
    pub filename: String,
    /// `None` where the recording has no marker for that label.
    pub samples: Vec<Option<SampleWindow>>,
}

/// Sample definitions for every recording of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubiosSamples {
    labels: Vec<String>,
    rows: Vec<KubiosRow>,
}

/// Looks up the settings of every table label, in table order.
///
/// Fails with every label that has no settings.
pub fn resolve_settings<'a>(
    table: &AggregateTable,
    settings: &'a SectionSettings,
) -> Result<Vec<&'a SectionSetting>, MissingSectionSettingError> {
    let mut resolved = Vec::with_capacity(table.labels().len());
    let mut missing = Vec::new();
    for label in table.labels() {
        match settings.get(label) {
            Some(setting) => resolved.push(setting),
            None => missing.push(label.clone()),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(MissingSectionSettingError { labels: missing })
    }
}

impl KubiosSamples {
    /// Computes every sample window. Nothing is produced unless all labels
    /// have settings and all cells parse.
    pub fn build(table: &AggregateTable, settings: &SectionSettings) -> Result<Self, KubiosError> {
        let resolved = resolve_settings(table, settings)?;

        let mut rows = Vec::with_capacity(table.columns().len());
        for (column, recording) in table.columns().iter().enumerate() {
            let mut samples = Vec::with_capacity(resolved.len());
            for (label, setting) in table.labels().iter().zip(&resolved) {
                let cell = table.cell(label, column);
                if cell.is_empty() {
                    samples.push(None);
                    continue;
                }
                let offset = parse_hms(cell).map_err(|source| KubiosError::InvalidTime {
                    filename: recording.filename.clone(),
                    label: label.clone(),
                    source,
                })?;
                let window = offset.checked_add(setting.buffer_seconds()).and_then(|start| {
                    start
                        .checked_add(setting.duration_seconds())
                        .map(|end| (start, end))
                });
                let Some((start, end)) = window else {
                    return Err(KubiosError::WindowOverflow {
                        filename: recording.filename.clone(),
                        label: label.clone(),
                    });
                };
                samples.push(Some(SampleWindow {
                    annotated_label: setting.annotated_label(),
                    start: format_hms(start),
                    end: format_hms(end),
                }));
            }
            rows.push(KubiosRow {
                filename: recording.filename.clone(),
                samples,
            });
        }

        Ok(Self {
            labels: table.labels().to_vec(),
            rows,
        })
    }

    /// Reads a marker table CSV and builds its samples.
    pub fn from_table_csv<R: Read>(
        reader: R,
        settings: &SectionSettings,
    ) -> Result<Self, KubiosError> {
        let table = AggregateTable::read_csv(reader)?;
        Self::build(&table, settings)
    }

    pub fn rows(&self) -> &[KubiosRow] {
        &self.rows
    }

    /// Writes the preamble, the header row and one row per recording.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<(), KubiosError> {
        for line in PREAMBLE {
            match line {
                Some(text) => {
                    let mut row = csv_writer(&mut writer);
                    row.write_record([text])?;
                    row.flush()?;
                }
                None => writer.write_all(b"\r\n")?,
            }
        }

        let mut csv = csv_writer(writer);
        let mut header = vec!["FILENAME", TIME_BASE_FLAG];
        for label in &self.labels {
            header.extend([label.as_str(), "START", "END"]);
        }
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.filename.as_str(), TIME_BASE_FLAG];
            for sample in &row.samples {
                match sample {
                    Some(window) => record.extend([
                        window.annotated_label.as_str(),
                        window.start.as_str(),
                        window.end.as_str(),
                    ]),
                    None => record.extend(["", "", ""]),
                }
            }
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::section::{Rgb, SectionEntry};

    const TABLE: &str = "Marker Labels,a.acq,b.acq\r\n\
                         Recording Date,2024-03-04 10:00,2024-03-05 09:30\r\n\
                         Rest,00:10:00,05:00\r\n\
                         Stroop,,01:00:30\r\n";

    fn setting(label: &str, duration_minutes: f64, buffer_minutes: u32) -> SectionSetting {
        SectionSetting {
            label: label.to_string(),
            duration_minutes,
            buffer_minutes,
            color: Rgb::new(60, 180, 75),
        }
    }

    fn table() -> AggregateTable {
        AggregateTable::read_csv(TABLE.as_bytes()).unwrap()
    }

    #[test]
    fn buffer_then_duration() {
        let settings =
            SectionSettings::from_iter([setting("Rest", 5.0, 2), setting("Stroop", 1.5, 0)]);

        let samples = KubiosSamples::build(&table(), &settings).unwrap();

        let rest = samples.rows()[0].samples[0].as_ref().unwrap();
        assert_eq!(rest.start, "00:12:00");
        assert_eq!(rest.end, "00:17:00");
        assert_eq!(rest.annotated_label, "Rest #60 180 75");

        let short_form = samples.rows()[1].samples[0].as_ref().unwrap();
        assert_eq!(short_form.start, "00:07:00");
        assert_eq!(short_form.end, "00:12:00");

        assert_eq!(samples.rows()[0].samples[1], None);
        let stroop = samples.rows()[1].samples[1].as_ref().unwrap();
        assert_eq!(stroop.start, "01:00:30");
        assert_eq!(stroop.end, "01:02:00");
    }

    #[test]
    fn missing_settings_are_all_reported() {
        let settings = SectionSettings::default();

        let err = KubiosSamples::build(&table(), &settings).unwrap_err();

        match err {
            KubiosError::MissingSectionSetting(missing) => {
                assert_eq!(missing.labels, ["Rest", "Stroop"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_cells_name_file_and_label() {
        let input = "Marker Labels,a.acq\nRecording Date,\nRest,ten minutes\n";
        let table = AggregateTable::read_csv(input.as_bytes()).unwrap();
        let settings = SectionSettings::from_iter([setting("Rest", 5.0, 0)]);

        let err = KubiosSamples::build(&table, &settings).unwrap_err();

        assert_eq!(err.to_string(), "bad time for 'Rest' in a.acq");
    }

    #[test]
    fn oversized_windows_are_an_error() {
        let huge = SectionEntry {
            label: "Rest".to_string(),
            duration: "1e300".to_string(),
            buffer_minutes: 0,
            color: Some("#3cb44b".to_string()),
        };
        let settings =
            SectionSettings::from_iter([huge.validate().unwrap(), setting("Stroop", 1.5, 0)]);

        let err = KubiosSamples::build(&table(), &settings).unwrap_err();

        assert!(matches!(
            err,
            KubiosError::WindowOverflow { ref label, .. } if label == "Rest"
        ));
        assert_eq!(err.to_string(), "sample window for 'Rest' in a.acq is out of range");
    }

    #[test]
    fn huge_cells_overflow_into_an_error() {
        let input = format!("Marker Labels,a.acq\nRecording Date,\nRest,{}\n", u64::MAX);
        let table = AggregateTable::read_csv(input.as_bytes()).unwrap();
        let settings = SectionSettings::from_iter([setting("Rest", 5.0, 2)]);

        let err = KubiosSamples::build(&table, &settings).unwrap_err();

        assert!(matches!(err, KubiosError::WindowOverflow { .. }));
    }

    #[test]
    fn writes_preamble_header_and_rows() {
        let settings =
            SectionSettings::from_iter([setting("Rest", 5.0, 2), setting("Stroop", 1.5, 0)]);
        let samples = KubiosSamples::build(&table(), &settings).unwrap();

        let mut out = Vec::new();
        samples.write_csv(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "Kubios_Samples.csv");
        assert_eq!(lines[2], "");
        assert_eq!(lines[9], "");
        assert_eq!(lines[10], "FILENAME,0,Rest,START,END,Stroop,START,END");
        assert_eq!(lines[11], "a.acq,0,Rest #60 180 75,00:12:00,00:17:00,,,");
        assert_eq!(
            lines[12],
            "b.acq,0,Rest #60 180 75,00:07:00,00:12:00,Stroop #60 180 75,01:00:30,01:02:00"
        );
    }
}
