//! Prepared answers for unattended runs.
//!
//! Duplicate choices:
//!
//! ```toml
//! [[duplicate]]
//! file = "s01.acq"
//! label = "Rest"
//! time = "00:05:30"
//! ```
//!
//! Section settings:
//!
//! ```toml
//! [sections.Rest]
//! duration = 5
//! buffer = 2
//! color = "#3cb44b"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bk_core::timefmt::parse_hms;
use bk_core::{
    DuplicateGroup, DuplicatePrompt, InvalidSectionSetting, SectionEntry, SectionSettings,
    Submission,
};
use figment::Figment;
use figment::providers::{Format, Toml};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Reads a whole TOML file; a missing file is an error.
fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(Figment::from(Toml::string(&content)).extract()?)
}

/// One prepared duplicate choice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DuplicateChoice {
    pub file: String,
    pub label: String,
    pub time: String,
}

/// Duplicate choices read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChoiceFile {
    #[serde(default, rename = "duplicate")]
    pub choices: Vec<DuplicateChoice>,
}

impl ChoiceFile {
    pub fn load(path: &Path) -> Result<Self> {
        load_toml(path)
            .with_context(|| format!("failed to load duplicate choices from {}", path.display()))
    }

    /// Index of the candidate matching the prepared time for `group`.
    fn choose(&self, group: &DuplicateGroup) -> Option<usize> {
        let choice = self
            .choices
            .iter()
            .find(|c| c.file == group.filename && c.label == group.label)?;
        let seconds = parse_hms(&choice.time).ok()?;
        group.candidates.iter().position(|&c| c == seconds)
    }
}

impl DuplicatePrompt for ChoiceFile {
    fn ask(&mut self, groups: &[DuplicateGroup], attempt: u32) -> Submission {
        // A file cannot answer differently the second time.
        if attempt > 1 {
            return Submission::Cancelled;
        }

        let selection = groups
            .iter()
            .map(|group| {
                let choice = self.choose(group);
                if choice.is_none() {
                    tracing::error!(
                        file = %group.filename,
                        label = %group.label,
                        candidates = %group.candidate_times().join(", "),
                        "no matching duplicate choice"
                    );
                }
                choice
            })
            .collect();
        Submission::Selected(selection)
    }
}

/// Section duration as written in TOML: a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Minutes(f64),
    Text(String),
}

impl DurationValue {
    fn into_text(self) -> String {
        match self {
            Self::Minutes(minutes) => minutes.to_string(),
            Self::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct SectionValues {
    duration: DurationValue,
    #[serde(default)]
    buffer: u32,
    #[serde(default)]
    color: Option<String>,
}

/// Section settings read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SectionFile {
    #[serde(default)]
    sections: BTreeMap<String, SectionValues>,
}

impl SectionFile {
    pub fn load(path: &Path) -> Result<Self> {
        load_toml(path)
            .with_context(|| format!("failed to load section settings from {}", path.display()))
    }

    /// Raw entries in label order.
    pub fn entries(&self) -> Vec<SectionEntry> {
        self.sections
            .iter()
            .map(|(label, values)| SectionEntry {
                label: label.clone(),
                duration: values.duration.clone().into_text(),
                buffer_minutes: values.buffer,
                color: values.color.clone(),
            })
            .collect()
    }

    /// Validates every entry present in the file.
    ///
    /// Labels absent from the file are left for the Kubios builder to report.
    pub fn settings(&self) -> Result<SectionSettings, InvalidSectionSetting> {
        self.entries().iter().map(SectionEntry::validate).collect()
    }
}
