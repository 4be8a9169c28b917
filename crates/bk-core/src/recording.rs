//! Decoded recordings and the sources that produce them.
//!
//! ACQ decoding itself happens outside this crate. A decoder exports the
//! recording's `event_markers` list as JSON, which [`JsonMarkerDump`] reads:
//!
//! ```json
//! {"event_markers": [
//!   {"text": "Segment 1", "channel": null, "date_created_utc": "2024-03-04T10:00:00Z"},
//!   {"text": "Rest Mon Mar 04", "channel": null, "date_created_utc": "2024-03-04T10:05:00Z"}
//! ]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A decoder could not turn a file into a [`DecodedRecording`].
#[derive(Debug, Error)]
pub enum FileReadError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file contents are not a valid marker dump.
    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Channel a marker is attached to, as reported by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelRef {
    Index(u32),
    Name(String),
}

/// A labeled, timestamped annotation inside a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingEvent {
    /// Free-text marker label as authored during the session.
    #[serde(rename = "text", alias = "label")]
    pub label: String,
    /// `None` for global session markers.
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    /// Creation time of the marker. Some decoders omit it.
    #[serde(rename = "date_created_utc", alias = "timestamp", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RecordingEvent {
    /// Global markers carry no channel tag.
    pub const fn is_global(&self) -> bool {
        self.channel.is_none()
    }
}

/// The event list of one recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRecording {
    #[serde(default)]
    pub event_markers: Vec<RecordingEvent>,
}

/// Anything that can decode a recording file into its event list.
pub trait RecordingSource {
    fn decode(&self, path: &Path) -> Result<DecodedRecording, FileReadError>;
}

/// Reads JSON marker dumps exported from ACQ files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarkerDump;

impl RecordingSource for JsonMarkerDump {
    fn decode(&self, path: &Path) -> Result<DecodedRecording, FileReadError> {
        let content = fs::read_to_string(path).map_err(|source| FileReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| FileReadError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Name a recording is reported under: the file name without a `.json` suffix.
///
/// `subject01.acq.json` reports as `subject01.acq`.
pub fn recording_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    match name.strip_suffix(".json") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}
