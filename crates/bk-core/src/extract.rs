//! Batch extraction: recordings in, marker table out.

use std::path::Path;

use thiserror::Error;

use crate::duplicate::{DuplicatePrompt, DuplicateResolutionCancelled, resolve_duplicates};
use crate::marker::{MissingReferenceError, read_markers};
use crate::offset::{PerRecordingResult, ProblematicMarker, compute_offsets};
use crate::recording::{DecodedRecording, FileReadError, RecordingSource, recording_name};
use crate::table::AggregateTable;

/// Why a single recording was left out of the batch.
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Read(#[from] FileReadError),
    #[error(transparent)]
    MissingReference(#[from] MissingReferenceError),
}

/// A recording skipped during extraction.
#[derive(Debug)]
pub struct FileFailure {
    pub filename: String,
    pub error: FileError,
}

/// Outcome of one extraction run.
#[derive(Debug)]
pub struct Extraction {
    pub table: AggregateTable,
    /// Recordings that were skipped, in processing order.
    pub failures: Vec<FileFailure>,
    /// Markers placed before Segment 1, across all recordings.
    pub problematic: Vec<ProblematicMarker>,
}

/// Anchors and offsets the markers of one decoded recording.
pub fn process_recording(
    filename: &str,
    recording: &DecodedRecording,
) -> Result<PerRecordingResult, MissingReferenceError> {
    let anchored = read_markers(filename, recording)?;
    Ok(compute_offsets(&anchored))
}

/// Processes recordings one at a time and assembles the table.
///
/// A recording that fails to decode or has no reference marker is skipped and
/// reported; the rest of the batch continues. Cancelling duplicate resolution
/// aborts the whole run.
pub fn extract<S, P>(
    paths: &[impl AsRef<Path>],
    source: &S,
    prompt: &mut P,
) -> Result<Extraction, DuplicateResolutionCancelled>
where
    S: RecordingSource + ?Sized,
    P: DuplicatePrompt + ?Sized,
{
    let mut results = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let filename = recording_name(path);
        let outcome = source
            .decode(path)
            .map_err(FileError::from)
            .and_then(|recording| {
                process_recording(&filename, &recording).map_err(FileError::from)
            });

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    file = %filename,
                    markers = result.offsets.len(),
                    "processed recording"
                );
                results.push(result);
            }
            Err(error) => {
                tracing::warn!(file = %filename, error = %error, "skipping recording");
                failures.push(FileFailure { filename, error });
            }
        }
    }

    let problematic = results
        .iter()
        .flat_map(|r| r.problematic.iter().cloned())
        .collect();

    let results = resolve_duplicates(results, prompt)?;
    let table = AggregateTable::from_results(&results);

    Ok(Extraction {
        table,
        failures,
        problematic,
    })
}
