//! CLI subcommand implementations.

pub mod extract;
pub mod kubios;
pub mod read;
pub mod util;
