//! Biopac-to-Kubios CLI library.
//!
//! This crate provides the command-line surface over `bk-core`: argument
//! parsing, configuration, terminal prompts and prepared answer files.

pub mod answers;
mod cli;
pub mod commands;
mod config;
pub mod prompt;

pub use answers::{ChoiceFile, SectionFile};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use prompt::TerminalPrompt;
