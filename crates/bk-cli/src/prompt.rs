//! Interactive terminal prompts for duplicate choices and section settings.
//!
//! Typing `q` at any question cancels; end of input also cancels.

use std::io::{BufRead, Write};

use bk_core::{
    DuplicateGroup, DuplicatePrompt, InvalidSectionSetting, Rgb, SectionEntry, SectionPrompt,
    SectionSubmission, Submission,
};

const CANCEL: &str = "q";

/// Result of reading one answer line.
enum Answer {
    Text(String),
    Cancel,
}

/// Line-oriented prompt over any reader/writer pair.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    palette: Vec<Rgb>,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub const fn new(input: R, output: W, palette: Vec<Rgb>) -> Self {
        Self {
            input,
            output,
            palette,
        }
    }

    /// Prints `question` and reads one trimmed line.
    fn answer(&mut self, question: &str) -> Answer {
        let _ = write!(self.output, "{question}");
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Answer::Cancel,
            Ok(_) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case(CANCEL) {
                    Answer::Cancel
                } else {
                    Answer::Text(line.to_string())
                }
            }
        }
    }

    fn say(&mut self, line: &str) {
        let _ = writeln!(self.output, "{line}");
    }

    /// Asks for a buffer in whole minutes, repeating until it parses.
    fn buffer_minutes(&mut self) -> Option<u32> {
        loop {
            match self.answer("  Timing buffer (min) [0]: ") {
                Answer::Cancel => return None,
                Answer::Text(text) if text.is_empty() => return Some(0),
                Answer::Text(text) => match text.parse() {
                    Ok(minutes) => return Some(minutes),
                    Err(_) => self.say("  Buffer must be a whole number of minutes."),
                },
            }
        }
    }

    /// Maps a palette number to its color; anything else is passed through.
    fn color(&self, text: String) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let picked = text
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.palette.get(idx));
        Some(picked.map_or(text, ToString::to_string))
    }
}

impl<R: BufRead, W: Write> DuplicatePrompt for TerminalPrompt<R, W> {
    fn ask(&mut self, groups: &[DuplicateGroup], attempt: u32) -> Submission {
        if attempt > 1 {
            self.say("Please select a time for each duplicate marker.");
        }
        self.say("Select the correct timing for each duplicate marker per participant.");

        let mut selection = Vec::with_capacity(groups.len());
        let mut current_file = None;
        for group in groups {
            if current_file != Some(group.file_index) {
                current_file = Some(group.file_index);
                self.say(&format!("File: {}", group.filename));
            }
            self.say(&format!("  Marker: {}", group.label));
            let times = group.candidate_times();
            for (idx, time) in times.iter().enumerate() {
                self.say(&format!("    {}) {time}", idx + 1));
            }

            let question = format!("  Choice [1-{}, {CANCEL} to cancel]: ", times.len());
            match self.answer(&question) {
                Answer::Cancel => return Submission::Cancelled,
                Answer::Text(text) => selection.push(
                    text.parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .filter(|&idx| idx < times.len()),
                ),
            }
        }

        Submission::Selected(selection)
    }
}

impl<R: BufRead, W: Write> SectionPrompt for TerminalPrompt<R, W> {
    fn ask(
        &mut self,
        labels: &[String],
        rejected: Option<&InvalidSectionSetting>,
    ) -> SectionSubmission {
        if let Some(reason) = rejected {
            self.say(&format!("Invalid input: {reason}"));
        }

        let swatches = self
            .palette
            .iter()
            .enumerate()
            .map(|(idx, color)| format!("{}) {color}", idx + 1))
            .collect::<Vec<_>>()
            .join("  ");

        let mut entries = Vec::with_capacity(labels.len());
        for label in labels {
            self.say(&format!("Section: {label}"));

            let Answer::Text(duration) = self.answer("  Duration (min): ") else {
                return SectionSubmission::Cancelled;
            };
            let Some(buffer_minutes) = self.buffer_minutes() else {
                return SectionSubmission::Cancelled;
            };
            self.say(&format!("  Colors: {swatches}"));
            let Answer::Text(color) = self.answer("  Color (number or #rrggbb): ") else {
                return SectionSubmission::Cancelled;
            };

            entries.push(SectionEntry {
                label: label.clone(),
                duration,
                buffer_minutes,
                color: self.color(color),
            });
        }

        SectionSubmission::Entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use bk_core::{SectionEntryCancelled, collect_settings};
    use insta::assert_snapshot;

    fn prompt(input: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            vec![Rgb::new(0, 0, 117), Rgb::new(60, 180, 75)],
        )
    }

    fn groups() -> Vec<DuplicateGroup> {
        vec![
            DuplicateGroup {
                file_index: 0,
                filename: "s01.acq".to_string(),
                label: "Rest".to_string(),
                candidates: vec![300, 330],
            },
            DuplicateGroup {
                file_index: 0,
                filename: "s01.acq".to_string(),
                label: "Task".to_string(),
                candidates: vec![400, 460, 520],
            },
        ]
    }

    #[test]
    fn duplicate_prompt_collects_one_choice_per_group() {
        let mut prompt = prompt("2\n3\n");

        let submission = DuplicatePrompt::ask(&mut prompt, &groups(), 1);

        assert_eq!(submission, Submission::Selected(vec![Some(1), Some(2)]));
        let output = String::from_utf8(prompt.output).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        Select the correct timing for each duplicate marker per participant.
        File: s01.acq
          Marker: Rest
            1) 00:05:00
            2) 00:05:30
          Choice [1-2, q to cancel]:   Marker: Task
            1) 00:06:40
            2) 00:07:40
            3) 00:08:40
          Choice [1-3, q to cancel]:
        ");
    }

    #[test]
    fn blank_or_out_of_range_answers_leave_a_gap() {
        let mut prompt = prompt("\n9\n");

        let submission = DuplicatePrompt::ask(&mut prompt, &groups(), 1);

        assert_eq!(submission, Submission::Selected(vec![None, None]));
    }

    #[test]
    fn q_or_end_of_input_cancels() {
        assert_eq!(
            DuplicatePrompt::ask(&mut prompt("1\nq\n"), &groups(), 1),
            Submission::Cancelled
        );
        assert_eq!(
            DuplicatePrompt::ask(&mut prompt("1\n"), &groups(), 1),
            Submission::Cancelled
        );
    }

    #[test]
    fn section_prompt_maps_palette_numbers() {
        let labels = vec!["Rest".to_string(), "Task".to_string()];
        let mut prompt = prompt("5\n2\n2\n1.5\nx\n\n#ff0000\n");

        let submission = SectionPrompt::ask(&mut prompt, &labels, None);

        assert_eq!(
            submission,
            SectionSubmission::Entries(vec![
                SectionEntry {
                    label: "Rest".to_string(),
                    duration: "5".to_string(),
                    buffer_minutes: 2,
                    color: Some("#3cb44b".to_string()),
                },
                SectionEntry {
                    label: "Task".to_string(),
                    duration: "1.5".to_string(),
                    buffer_minutes: 0,
                    color: Some("#ff0000".to_string()),
                },
            ])
        );
        let output = String::from_utf8(prompt.output).unwrap();
        assert!(output.contains("Buffer must be a whole number of minutes."));
    }

    #[test]
    fn invalid_sections_are_asked_again() {
        let labels = vec!["Rest".to_string()];
        let mut prompt = prompt("0\n0\n1\n5\n0\n1\n");

        let settings = collect_settings(&labels, &mut prompt).unwrap();

        assert_eq!(settings.get("Rest").unwrap().duration_minutes, 5.0);
        let output = String::from_utf8(prompt.output).unwrap();
        assert!(output.contains("Invalid input: duration for 'Rest' must be greater than 0"));
    }

    #[test]
    fn section_prompt_cancels() {
        let labels = vec!["Rest".to_string()];
        let mut prompt = prompt("5\nq\n");

        assert_eq!(
            collect_settings(&labels, &mut prompt),
            Err(SectionEntryCancelled)
        );
    }
}
