//! Shared utilities for CLI commands.

use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};

use crate::config::UTC_OFFSET_RANGE;

/// Display format for absolute marker times.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes `content` to `path` through a temporary file and a rename, so a
/// reader never sees a half-written file.
pub fn write_atomically(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        // Clean up temp file
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("failed to write {}", path.display()));
    }

    Ok(())
}

/// Formats an error with its whole source chain, `outer: inner: root`.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}

/// Rejects UTC offsets outside `-12..=14`.
pub fn check_utc_offset(hours: i8) -> anyhow::Result<i8> {
    if UTC_OFFSET_RANGE.contains(&hours) {
        Ok(hours)
    } else {
        anyhow::bail!(
            "UTC offset {hours} is out of range ({}..={})",
            UTC_OFFSET_RANGE.start(),
            UTC_OFFSET_RANGE.end()
        )
    }
}

/// Shifts a UTC time by a fixed number of hours (no DST rules).
pub fn adjust_utc(timestamp: DateTime<Utc>, hours: i8) -> String {
    (timestamp + Duration::hours(i64::from(hours)))
        .format(DATETIME_FORMAT)
        .to_string()
}
