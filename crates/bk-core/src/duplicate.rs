//! Per-recording duplicate label detection and resolution.
//!
//! A recording may contain the same marker label several times (a marker
//! re-entered after a mistake, for example). Only one time per label can go
//! into the table, so every such group is put to a [`DuplicatePrompt`] and the
//! answer is applied before assembly.

use std::collections::HashMap;

use thiserror::Error;

use crate::offset::PerRecordingResult;
use crate::timefmt::format_hms;

/// The user cancelled duplicate resolution. The export must be abandoned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("duplicate marker resolution was cancelled")]
pub struct DuplicateResolutionCancelled;

/// All occurrences of one label within one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Position of the recording in the processed batch.
    pub file_index: usize,
    pub filename: String,
    pub label: String,
    /// Elapsed seconds of each occurrence, in recording order.
    pub candidates: Vec<u64>,
}

impl DuplicateGroup {
    /// Candidate offsets as `HH:MM:SS`.
    pub fn candidate_times(&self) -> Vec<String> {
        self.candidates.iter().map(|&s| format_hms(s)).collect()
    }
}

/// Answer to one round of duplicate questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// One entry per group, holding the index of the chosen candidate.
    Selected(Vec<Option<usize>>),
    Cancelled,
}

/// Blocking request/response boundary for choosing among duplicate times.
pub trait DuplicatePrompt {
    /// Presents every group and waits for a submission.
    ///
    /// `attempt` starts at 1 and grows each time an incomplete submission is
    /// rejected.
    fn ask(&mut self, groups: &[DuplicateGroup], attempt: u32) -> Submission;
}

/// Finds labels occurring more than once per recording.
///
/// Groups are ordered by recording, then by first occurrence of the label.
pub fn find_duplicates(results: &[PerRecordingResult]) -> Vec<DuplicateGroup> {
    let mut groups = Vec::new();

    for (file_index, result) in results.iter().enumerate() {
        let mut order: Vec<&str> = Vec::new();
        let mut candidates: HashMap<&str, Vec<u64>> = HashMap::new();
        for offset in &result.offsets {
            let entry = candidates.entry(offset.label.as_str()).or_default();
            if entry.is_empty() {
                order.push(offset.label.as_str());
            }
            entry.push(offset.elapsed_seconds);
        }

        for label in order {
            let times = candidates.remove(label).unwrap_or_default();
            if times.len() > 1 {
                groups.push(DuplicateGroup {
                    file_index,
                    filename: result.filename.clone(),
                    label: label.to_string(),
                    candidates: times,
                });
            }
        }
    }

    groups
}

/// Checks that a submission picks exactly one valid candidate per group.
fn complete_selection(groups: &[DuplicateGroup], selection: &[Option<usize>]) -> Option<Vec<u64>> {
    if selection.len() != groups.len() {
        return None;
    }
    groups
        .iter()
        .zip(selection)
        .map(|(group, choice)| choice.and_then(|idx| group.candidates.get(idx).copied()))
        .collect()
}

/// Resolves every duplicate group through `prompt`.
///
/// Returns the input untouched when there are no duplicates. Incomplete
/// submissions are rejected and the prompt is asked again.
pub fn resolve_duplicates<P: DuplicatePrompt + ?Sized>(
    mut results: Vec<PerRecordingResult>,
    prompt: &mut P,
) -> Result<Vec<PerRecordingResult>, DuplicateResolutionCancelled> {
    let groups = find_duplicates(&results);
    if groups.is_empty() {
        return Ok(results);
    }

    tracing::info!(groups = groups.len(), "duplicate markers need a choice");

    let mut attempt = 1;
    let chosen = loop {
        match prompt.ask(&groups, attempt) {
            Submission::Cancelled => return Err(DuplicateResolutionCancelled),
            Submission::Selected(selection) => {
                if let Some(chosen) = complete_selection(&groups, &selection) {
                    break chosen;
                }
                tracing::warn!(attempt, "every duplicate marker needs a selection");
                attempt += 1;
            }
        }
    };

    for (group, elapsed_seconds) in groups.iter().zip(chosen) {
        tracing::debug!(
            file = %group.filename,
            label = %group.label,
            time = %format_hms(elapsed_seconds),
            "resolved duplicate marker"
        );
        let offsets = &mut results[group.file_index].offsets;
        let mut seen = false;
        offsets.retain_mut(|offset| {
            if offset.label != group.label {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            offset.elapsed_seconds = elapsed_seconds;
            true
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::offset::MarkerOffset;

    struct Scripted {
        answers: Vec<Submission>,
        asked: u32,
    }

    impl Scripted {
        fn new(answers: Vec<Submission>) -> Self {
            Self { answers, asked: 0 }
        }
    }

    impl DuplicatePrompt for Scripted {
        fn ask(&mut self, _groups: &[DuplicateGroup], attempt: u32) -> Submission {
            self.asked += 1;
            assert_eq!(attempt, self.asked);
            self.answers.remove(0)
        }
    }

    fn recording(filename: &str, offsets: &[(&str, u64)]) -> PerRecordingResult {
        PerRecordingResult {
            filename: filename.to_string(),
            recording_date: "2024-03-04 10:00".to_string(),
            offsets: offsets
                .iter()
                .map(|&(label, elapsed_seconds)| MarkerOffset {
                    label: label.to_string(),
                    elapsed_seconds,
                })
                .collect(),
            problematic: Vec::new(),
        }
    }

    fn labels_and_times(result: &PerRecordingResult) -> Vec<(String, String)> {
        result
            .offsets
            .iter()
            .map(|o| (o.label.clone(), o.time()))
            .collect()
    }

    #[test]
    fn no_duplicates_is_identity_and_never_prompts() {
        let input = vec![
            recording("a.acq", &[("X", 10), ("Y", 20)]),
            recording("b.acq", &[("X", 30)]),
        ];
        let mut prompt = Scripted::new(Vec::new());

        let output = resolve_duplicates(input.clone(), &mut prompt).unwrap();

        assert_eq!(output, input);
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn detection_is_per_file() {
        let input = vec![
            recording("a.acq", &[("Rest", 300), ("Task", 400), ("Rest", 330)]),
            recording("b.acq", &[("Rest", 300)]),
        ];

        let groups = find_duplicates(&input);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].filename, "a.acq");
        assert_eq!(groups[0].label, "Rest");
        assert_eq!(groups[0].candidate_times(), ["00:05:00", "00:05:30"]);
    }

    #[test]
    fn chosen_time_replaces_all_occurrences() {
        let input = vec![recording(
            "a.acq",
            &[("Rest", 300), ("Task", 400), ("Rest", 330)],
        )];
        let mut prompt = Scripted::new(vec![Submission::Selected(vec![Some(1)])]);

        let output = resolve_duplicates(input, &mut prompt).unwrap();

        assert_eq!(
            labels_and_times(&output[0]),
            vec![
                ("Rest".to_string(), "00:05:30".to_string()),
                ("Task".to_string(), "00:06:40".to_string()),
            ]
        );
    }

    #[test]
    fn incomplete_submission_is_asked_again() {
        let input = vec![
            recording("a.acq", &[("Rest", 300), ("Rest", 330)]),
            recording("b.acq", &[("Task", 10), ("Task", 20), ("Task", 30)]),
        ];
        let mut prompt = Scripted::new(vec![
            Submission::Selected(vec![Some(0), None]),
            Submission::Selected(vec![Some(0)]),
            Submission::Selected(vec![Some(0), Some(7)]),
            Submission::Selected(vec![Some(0), Some(2)]),
        ]);

        let output = resolve_duplicates(input, &mut prompt).unwrap();

        assert_eq!(prompt.asked, 4);
        assert_eq!(output[0].offsets.len(), 1);
        assert_eq!(output[0].offsets[0].elapsed_seconds, 300);
        assert_eq!(output[1].offsets.len(), 1);
        assert_eq!(output[1].offsets[0].elapsed_seconds, 30);
    }

    #[test]
    fn cancellation_aborts() {
        let input = vec![recording("a.acq", &[("Rest", 300), ("Rest", 330)])];
        let mut prompt = Scripted::new(vec![
            Submission::Selected(vec![None]),
            Submission::Cancelled,
        ]);

        let err = resolve_duplicates(input, &mut prompt).unwrap_err();

        assert_eq!(err, DuplicateResolutionCancelled);
    }
}
