//! Kubios command: marker table CSV to `Kubios_Samples.csv`.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bk_core::{AggregateTable, KubiosSamples, SectionPrompt, SectionSettings, collect_settings};
use clap::Args;

use super::util::write_atomically;
use crate::Config;
use crate::answers::SectionFile;

#[derive(Debug, Args)]
pub struct KubiosArgs {
    /// Marker table produced by `extract` [default: from config].
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output CSV path [default: from config].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML file with section settings instead of prompting.
    #[arg(long)]
    pub sections: Option<PathBuf>,
}

/// Where section settings come from.
pub enum Sections<'a, P: ?Sized> {
    File(&'a SectionFile),
    Prompt(&'a mut P),
}

pub fn run<W, P>(
    writer: &mut W,
    args: &KubiosArgs,
    config: &Config,
    sections: Sections<'_, P>,
) -> Result<()>
where
    W: Write,
    P: SectionPrompt + ?Sized,
{
    let input = args.input.as_ref().unwrap_or(&config.extract_output);
    let output = args.output.as_ref().unwrap_or(&config.kubios_output);

    let file = fs::File::open(input)
        .with_context(|| format!("failed to open marker table {}", input.display()))?;
    let table = AggregateTable::read_csv(file)
        .with_context(|| format!("failed to read marker table {}", input.display()))?;
    tracing::debug!(
        labels = table.labels().len(),
        recordings = table.columns().len(),
        "loaded marker table"
    );

    let settings: SectionSettings = match sections {
        Sections::File(file) => file.settings().context("invalid section settings")?,
        Sections::Prompt(prompt) => collect_settings(table.labels(), prompt)
            .context("Kubios generation aborted, nothing written")?,
    };

    let samples = KubiosSamples::build(&table, &settings)
        .context("Kubios generation failed, nothing written")?;

    let mut content = Vec::new();
    samples
        .write_csv(&mut content)
        .context("failed to encode Kubios samples")?;
    write_atomically(output, &content)?;

    tracing::info!(path = %output.display(), "Kubios samples written");
    writeln!(
        writer,
        "Wrote Kubios samples for {} recordings to {}",
        samples.rows().len(),
        output.display()
    )?;

    Ok(())
}
