//! Read command: list every global marker of each recording.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use bk_core::offset::elapsed_seconds;
use bk_core::timefmt::format_signed_hms;
use bk_core::{FileError, RecordingSource, read_markers, recording_name};
use clap::Args;

use super::util::{DATETIME_FORMAT, adjust_utc, check_utc_offset, error_chain};
use crate::Config;

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Decoded recording files (JSON marker dumps).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fixed UTC offset in hours for the adjusted column [default: from config].
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<i8>,
}

pub fn run<W: Write, S: RecordingSource + ?Sized>(
    writer: &mut W,
    args: &ReadArgs,
    config: &Config,
    source: &S,
) -> Result<()> {
    let offset = check_utc_offset(args.utc_offset.unwrap_or(config.utc_offset_hours))?;
    let adjusted_header = format!("UTC{offset:+}");

    writeln!(
        writer,
        "{:<20} {:<30} {:<20} {:<20} RELATIVE TO SEGMENT 1",
        "FILE", "LABEL", "ORIGINAL UTC", adjusted_header
    )?;

    let mut skipped = Vec::new();
    for path in &args.files {
        let filename = recording_name(path);
        let anchored = source
            .decode(path)
            .map_err(FileError::from)
            .and_then(|recording| read_markers(&filename, &recording).map_err(FileError::from));
        let anchored = match anchored {
            Ok(anchored) => anchored,
            Err(error) => {
                tracing::warn!(file = %filename, error = %error, "skipping recording");
                skipped.push((filename, error_chain(&error)));
                continue;
            }
        };

        for marker in &anchored.markers {
            let relative = elapsed_seconds(anchored.reference.timestamp, marker.timestamp);
            writeln!(
                writer,
                "{:<20} {:<30} {:<20} {:<20} {}",
                filename,
                marker.label,
                marker.timestamp.format(DATETIME_FORMAT).to_string(),
                adjust_utc(marker.timestamp, offset),
                format_signed_hms(relative)
            )?;
        }
        writeln!(writer)?;
    }

    if !skipped.is_empty() {
        writeln!(writer, "Skipped recordings:")?;
        for (filename, reason) in &skipped {
            writeln!(writer, "- {filename}: {reason}")?;
        }
    }

    Ok(())
}
