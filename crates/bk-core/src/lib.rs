//! Core logic for turning Biopac event markers into Kubios sample files.
//!
//! This crate contains:
//! - Marker reading: locating the "Segment 1" reference in a decoded recording
//! - Offsets: elapsed time of every marker since the reference
//! - Duplicate resolution: one authoritative time per label and recording
//! - Table assembly: the wide label-by-recording CSV
//! - Kubios generation: sample windows from the table and per-label settings

pub mod duplicate;
pub mod extract;
pub mod kubios;
pub mod marker;
pub mod offset;
pub mod recording;
pub mod section;
pub mod table;
pub mod timefmt;

pub use duplicate::{
    DuplicateGroup, DuplicatePrompt, DuplicateResolutionCancelled, Submission, resolve_duplicates,
};
pub use extract::{Extraction, FileError, FileFailure, extract, process_recording};
pub use kubios::{KubiosError, KubiosSamples, MissingSectionSettingError};
pub use marker::{AnchoredMarkers, Marker, MissingReferenceError, read_markers};
pub use offset::{MarkerOffset, PerRecordingResult, ProblematicMarker, compute_offsets};
pub use recording::{
    DecodedRecording, FileReadError, JsonMarkerDump, RecordingEvent, RecordingSource,
    recording_name,
};
pub use section::{
    InvalidSectionSetting, Rgb, SectionEntry, SectionEntryCancelled, SectionPrompt,
    SectionSetting, SectionSettings, SectionSubmission, collect_settings,
};
pub use table::{AggregateTable, TableError};
