//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{extract::ExtractArgs, kubios::KubiosArgs, read::ReadArgs};

/// Biopac marker extraction for Kubios HRV.
///
/// Reads event markers from decoded ACQ recordings, tabulates their offsets
/// from Segment 1 and turns that table into a Kubios sample file.
#[derive(Debug, Parser)]
#[command(name = "biokubios", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the markers of each recording with their times.
    Read(ReadArgs),

    /// Extract marker offsets from recordings into a marker table CSV.
    Extract(ExtractArgs),

    /// Convert a marker table CSV into Kubios_Samples.csv.
    Kubios(KubiosArgs),
}
