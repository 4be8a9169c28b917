//! Per-label sample window settings and their validation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A color string that is not `#rrggbb`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid color {0:?}, expected #rrggbb")]
pub struct InvalidColor(pub String);

/// An RGB color used to paint a sample in Kubios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_string()
    }
}

/// Sample window settings for one marker label.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSetting {
    pub label: String,
    /// Length of the sample, always positive.
    pub duration_minutes: f64,
    /// Delay between the marker and the sample start.
    pub buffer_minutes: u32,
    pub color: Rgb,
}

impl SectionSetting {
    /// Label with Kubios's inline color code, e.g. `Rest #60 180 75`.
    pub fn annotated_label(&self) -> String {
        format!(
            "{} #{} {} {}",
            self.label, self.color.r, self.color.g, self.color.b
        )
    }

    /// Duration rounded to whole seconds.
    pub fn duration_seconds(&self) -> u64 {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "duration is validated positive and finite"
        )]
        let seconds = (self.duration_minutes * 60.0).round() as u64;
        seconds
    }

    pub fn buffer_seconds(&self) -> u64 {
        u64::from(self.buffer_minutes) * 60
    }
}

/// Raw, unvalidated settings as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub label: String,
    pub duration: String,
    #[serde(default)]
    pub buffer_minutes: u32,
    #[serde(default)]
    pub color: Option<String>,
}

/// A section entry that cannot be accepted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidSectionSetting {
    #[error("no settings entered for '{label}'")]
    Missing { label: String },
    #[error("please enter a valid duration for '{label}' (got {value:?})")]
    NonNumericDuration { label: String, value: String },
    #[error("duration for '{label}' must be greater than 0 (got {value})")]
    NonPositiveDuration { label: String, value: f64 },
    #[error("please select a color for '{label}'")]
    MissingColor { label: String },
    #[error("invalid color for '{label}': {source}")]
    InvalidColor {
        label: String,
        #[source]
        source: InvalidColor,
    },
}

impl SectionEntry {
    /// Validates the entry into a [`SectionSetting`].
    pub fn validate(&self) -> Result<SectionSetting, InvalidSectionSetting> {
        let label = self.label.clone();
        let duration_minutes = self
            .duration
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| InvalidSectionSetting::NonNumericDuration {
                label: label.clone(),
                value: self.duration.clone(),
            })?;
        if duration_minutes <= 0.0 {
            return Err(InvalidSectionSetting::NonPositiveDuration {
                label,
                value: duration_minutes,
            });
        }

        let color = self
            .color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| InvalidSectionSetting::MissingColor {
                label: label.clone(),
            })?
            .parse::<Rgb>()
            .map_err(|source| InvalidSectionSetting::InvalidColor {
                label: label.clone(),
                source,
            })?;

        Ok(SectionSetting {
            label,
            duration_minutes,
            buffer_minutes: self.buffer_minutes,
            color,
        })
    }
}

/// Validated settings keyed by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionSettings {
    by_label: HashMap<String, SectionSetting>,
}

impl SectionSettings {
    pub fn get(&self, label: &str) -> Option<&SectionSetting> {
        self.by_label.get(label)
    }

    pub fn insert(&mut self, setting: SectionSetting) {
        self.by_label.insert(setting.label.clone(), setting);
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}

impl FromIterator<SectionSetting> for SectionSettings {
    fn from_iter<I: IntoIterator<Item = SectionSetting>>(iter: I) -> Self {
        let mut settings = Self::default();
        for setting in iter {
            settings.insert(setting);
        }
        settings
    }
}

/// The user cancelled section settings entry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("section settings entry was cancelled")]
pub struct SectionEntryCancelled;

/// Answer to one round of section settings entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSubmission {
    Entries(Vec<SectionEntry>),
    Cancelled,
}

/// Blocking request/response boundary for entering section settings.
pub trait SectionPrompt {
    /// Asks for settings for every label. `rejected` carries the reason the
    /// previous submission was refused.
    fn ask(&mut self, labels: &[String], rejected: Option<&InvalidSectionSetting>)
    -> SectionSubmission;
}

/// Validates a full submission: every label needs a valid entry.
pub fn validate_entries(
    labels: &[String],
    entries: &[SectionEntry],
) -> Result<SectionSettings, InvalidSectionSetting> {
    labels
        .iter()
        .map(|label| {
            entries
                .iter()
                .find(|e| e.label == *label)
                .ok_or_else(|| InvalidSectionSetting::Missing {
                    label: label.clone(),
                })?
                .validate()
        })
        .collect()
}

/// Prompts until every label has valid settings or the user cancels.
pub fn collect_settings<P: SectionPrompt + ?Sized>(
    labels: &[String],
    prompt: &mut P,
) -> Result<SectionSettings, SectionEntryCancelled> {
    let mut rejected = None;
    loop {
        match prompt.ask(labels, rejected.as_ref()) {
            SectionSubmission::Cancelled => return Err(SectionEntryCancelled),
            SectionSubmission::Entries(entries) => match validate_entries(labels, &entries) {
                Ok(settings) => return Ok(settings),
                Err(err) => {
                    tracing::warn!(error = %err, "section settings rejected");
                    rejected = Some(err);
                }
            },
        }
    }
}
