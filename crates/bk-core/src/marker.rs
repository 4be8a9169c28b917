//! Reference marker lookup over a decoded recording.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::recording::DecodedRecording;

const REFERENCE_LABEL: &str = "Segment 1";
const SEGMENT_PREFIX: &str = "Segment";

/// The recording has no "Segment 1" marker to anchor offsets to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no 'Segment 1' marker found in {filename}")]
pub struct MissingReferenceError {
    pub filename: String,
}

/// A global marker with a known creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl Marker {
    /// Segment markers only anchor time and never appear in the output table.
    pub fn is_segment(&self) -> bool {
        self.label.starts_with(SEGMENT_PREFIX)
    }
}

/// Global markers of one recording anchored to its reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredMarkers {
    pub filename: String,
    pub reference: Marker,
    /// All global markers in recording order, the reference included.
    pub markers: Vec<Marker>,
}

/// Returns true for labels containing "Segment 1" but not "Segment 10" etc.
pub fn is_reference_label(label: &str) -> bool {
    label.match_indices(REFERENCE_LABEL).any(|(idx, _)| {
        !label[idx + REFERENCE_LABEL.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Filters a recording to its global markers and locates the reference.
///
/// The first qualifying "Segment 1" marker wins.
pub fn read_markers(
    filename: &str,
    recording: &DecodedRecording,
) -> Result<AnchoredMarkers, MissingReferenceError> {
    let mut markers = Vec::new();
    for event in recording.event_markers.iter().filter(|e| e.is_global()) {
        let label = event.label.trim();
        let Some(timestamp) = event.timestamp else {
            tracing::debug!(file = filename, label, "skipping marker without timestamp");
            continue;
        };
        markers.push(Marker {
            label: label.to_string(),
            timestamp,
        });
    }

    let reference = markers
        .iter()
        .find(|m| {
            let found = is_reference_label(&m.label);
            if !found && m.label.contains(REFERENCE_LABEL) {
                tracing::debug!(
                    file = filename,
                    label = %m.label,
                    "not a reference marker, \"Segment 1\" is followed by a digit"
                );
            }
            found
        })
        .cloned()
        .ok_or_else(|| MissingReferenceError {
            filename: filename.to_string(),
        })?;

    Ok(AnchoredMarkers {
        filename: filename.to_string(),
        reference,
        markers,
    })
}
