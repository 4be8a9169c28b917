//! `HH:MM:SS` formatting and parsing for elapsed times.

use thiserror::Error;

/// A time cell that could not be parsed as `HH:MM:SS`, `MM:SS` or `SS`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid time format: {value:?}")]
pub struct InvalidTime {
    pub value: String,
}

/// Formats a non-negative number of seconds as `HH:MM:SS`.
///
/// Hours are zero padded to two digits but never wrap into days.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats signed seconds, prefixing `-` for negative values.
pub fn format_signed_hms(seconds: i64) -> String {
    let formatted = format_hms(seconds.unsigned_abs());
    if seconds < 0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}

/// Parses `HH:MM:SS`, `MM:SS` or `SS` into seconds.
pub fn parse_hms(value: &str) -> Result<u64, InvalidTime> {
    let invalid = || InvalidTime {
        value: value.to_string(),
    };

    let parts = value
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        [s] => (0, 0, *s),
        _ => return Err(invalid()),
    };

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(invalid)
}
