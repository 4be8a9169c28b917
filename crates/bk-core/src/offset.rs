//! Elapsed time of each marker relative to the recording's reference.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::marker::AnchoredMarkers;
use crate::timefmt::format_hms;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Format of the per-recording date shown in the table header.
pub const RECORDING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A marker with its non-negative offset from the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerOffset {
    pub label: String,
    pub elapsed_seconds: u64,
}

impl MarkerOffset {
    /// The offset as `HH:MM:SS`.
    pub fn time(&self) -> String {
        format_hms(self.elapsed_seconds)
    }
}

/// A marker placed before the reference, excluded from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblematicMarker {
    pub filename: String,
    pub label: String,
    pub marker_time: DateTime<Utc>,
    pub reference_time: DateTime<Utc>,
    pub difference_seconds: i64,
}

/// Offsets of one recording, ready to be folded into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerRecordingResult {
    pub filename: String,
    pub recording_date: String,
    pub offsets: Vec<MarkerOffset>,
    pub problematic: Vec<ProblematicMarker>,
}

/// Removes the weekday suffix decoders append to marker labels.
///
/// Everything from the first standalone `Mon`..`Sun` token onwards is dropped.
/// A label consisting only of a weekday is returned unchanged.
pub fn canonical_label(label: &str) -> &str {
    let cut = label
        .char_indices()
        .filter(|&(idx, _)| {
            label[..idx]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric())
        })
        .find(|&(idx, _)| {
            let rest = &label[idx..];
            WEEKDAYS.iter().any(|day| {
                rest.starts_with(day)
                    && !rest[day.len()..]
                        .chars()
                        .next()
                        .is_some_and(char::is_alphabetic)
            })
        })
        .map(|(idx, _)| idx);

    match cut {
        Some(idx) if !label[..idx].trim().is_empty() => label[..idx].trim_end(),
        _ => label,
    }
}

/// Signed seconds between two instants, rounded half away from zero.
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = (to - from).num_milliseconds();
    (millis.abs() + 500) / 1000 * millis.signum()
}

/// Computes offsets for every non-segment marker of one recording.
pub fn compute_offsets(anchored: &AnchoredMarkers) -> PerRecordingResult {
    let reference_time = anchored.reference.timestamp;
    let mut offsets = Vec::new();
    let mut problematic = Vec::new();

    for marker in anchored.markers.iter().filter(|m| !m.is_segment()) {
        let label = canonical_label(&marker.label).to_string();
        let elapsed = elapsed_seconds(reference_time, marker.timestamp);

        match u64::try_from(elapsed) {
            Ok(elapsed_seconds) => offsets.push(MarkerOffset {
                label,
                elapsed_seconds,
            }),
            Err(_) => {
                tracing::warn!(
                    file = %anchored.filename,
                    label = %label,
                    difference = elapsed,
                    "marker precedes Segment 1, excluding it"
                );
                problematic.push(ProblematicMarker {
                    filename: anchored.filename.clone(),
                    label,
                    marker_time: marker.timestamp,
                    reference_time,
                    difference_seconds: elapsed,
                });
            }
        }
    }

    PerRecordingResult {
        filename: anchored.filename.clone(),
        recording_date: reference_time.format(RECORDING_DATE_FORMAT).to_string(),
        offsets,
        problematic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::marker::read_markers;
    use crate::marker::tests::{at, global};
    use crate::recording::DecodedRecording;
    use crate::timefmt::parse_hms;

    fn result_for(events: Vec<crate::recording::RecordingEvent>) -> PerRecordingResult {
        let recording = DecodedRecording {
            event_markers: events,
        };
        compute_offsets(&read_markers("s01.acq", &recording).unwrap())
    }

    #[test]
    fn strips_weekday_suffix() {
        assert_eq!(canonical_label("Rest Mon Mar 04 2024"), "Rest");
        assert_eq!(canonical_label("Task A Fri 10:00"), "Task A");
        assert_eq!(canonical_label("Stroop"), "Stroop");
    }

    #[test]
    fn weekday_must_be_a_standalone_word() {
        assert_eq!(canonical_label("Monitoring Tue"), "Monitoring");
        assert_eq!(canonical_label("Sunset"), "Sunset");
        assert_eq!(canonical_label("Mon"), "Mon");
    }

    #[test]
    fn earliest_weekday_wins() {
        assert_eq!(canonical_label("Recovery Sun Mon"), "Recovery");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let base = at(10, 0, 0);
        assert_eq!(elapsed_seconds(base, base + Duration::milliseconds(1_499)), 1);
        assert_eq!(elapsed_seconds(base, base + Duration::milliseconds(1_500)), 2);
        assert_eq!(elapsed_seconds(base, base - Duration::milliseconds(1_500)), -2);
        assert_eq!(elapsed_seconds(base, base - Duration::milliseconds(400)), 0);
    }

    #[test]
    fn segment_markers_never_reach_offsets() {
        let result = result_for(vec![
            global("Segment 1", at(10, 0, 0)),
            global("Rest Mon", at(10, 5, 0)),
            global("Segment 2", at(10, 6, 0)),
        ]);

        assert_eq!(
            result.offsets,
            vec![MarkerOffset {
                label: "Rest".to_string(),
                elapsed_seconds: 300,
            }]
        );
        assert_eq!(result.recording_date, "2024-03-04 10:00");
    }

    #[test]
    fn negative_offsets_are_reported_not_kept() {
        let result = result_for(vec![
            global("Baseline", at(9, 58, 0)),
            global("Segment 1", at(10, 0, 0)),
            global("Baseline", at(10, 2, 0)),
        ]);

        assert_eq!(result.offsets.len(), 1);
        assert_eq!(result.offsets[0].time(), "00:02:00");
        assert_eq!(result.problematic.len(), 1);
        let problem = &result.problematic[0];
        assert_eq!(problem.label, "Baseline");
        assert_eq!(problem.difference_seconds, -120);
        assert_eq!(problem.reference_time, at(10, 0, 0));
    }

    #[test]
    fn formatted_offsets_parse_back_to_elapsed_seconds() {
        let result = result_for(vec![
            global("Segment 1", at(10, 0, 0)),
            global("A", at(10, 0, 0)),
            global("B", at(11, 1, 1)),
            global("C", at(23, 59, 59)),
        ]);

        for offset in &result.offsets {
            assert_eq!(parse_hms(&offset.time()), Ok(offset.elapsed_seconds));
        }
        assert_eq!(result.offsets[0].elapsed_seconds, 0);
    }
}
