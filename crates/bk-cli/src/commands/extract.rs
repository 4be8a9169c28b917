//! Extract command: recordings to marker table CSV.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bk_core::{DuplicatePrompt, Extraction, RecordingSource};
use clap::Args;

use super::util::{DATETIME_FORMAT, error_chain, write_atomically};
use crate::Config;

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Decoded recording files (JSON marker dumps), processed in order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output CSV path [default: from config].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML file with prepared duplicate choices instead of prompting.
    #[arg(long)]
    pub choices: Option<PathBuf>,
}

pub fn run<W, S, P>(
    writer: &mut W,
    args: &ExtractArgs,
    config: &Config,
    source: &S,
    prompt: &mut P,
) -> Result<()>
where
    W: Write,
    S: RecordingSource + ?Sized,
    P: DuplicatePrompt + ?Sized,
{
    let output = args.output.as_ref().unwrap_or(&config.extract_output);

    let extraction = bk_core::extract(args.files.as_slice(), source, prompt)
        .context("export aborted, no marker table written")?;

    report(writer, &extraction)?;

    if extraction.table.is_empty() {
        anyhow::bail!("no recording could be processed, no marker table written");
    }

    let mut content = Vec::new();
    extraction
        .table
        .write_csv(&mut content)
        .context("failed to encode marker table")?;
    write_atomically(output, &content)?;

    tracing::info!(path = %output.display(), "marker table written");
    writeln!(
        writer,
        "Extracted {} markers from {} recordings to {}",
        extraction.table.labels().len(),
        extraction.table.columns().len(),
        output.display()
    )?;

    Ok(())
}

/// Prints problematic markers and skipped recordings.
fn report<W: Write>(writer: &mut W, extraction: &Extraction) -> Result<()> {
    if !extraction.problematic.is_empty() {
        writeln!(writer, "Problematic markers (before Segment 1, not tabled):")?;
        for marker in &extraction.problematic {
            writeln!(
                writer,
                "- {}: {} at {} (Segment 1 at {}, {} s)",
                marker.filename,
                marker.label,
                marker.marker_time.format(DATETIME_FORMAT),
                marker.reference_time.format(DATETIME_FORMAT),
                marker.difference_seconds
            )?;
        }
    }

    if !extraction.failures.is_empty() {
        writeln!(writer, "Skipped recordings:")?;
        for failure in &extraction.failures {
            writeln!(writer, "- {}: {}", failure.filename, error_chain(&failure.error))?;
        }
    }

    Ok(())
}
