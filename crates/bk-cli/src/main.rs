use std::io;

use anyhow::{Context, Result};
use bk_cli::commands::{extract, kubios, read};
use bk_cli::{ChoiceFile, Cli, Commands, Config, SectionFile, TerminalPrompt};
use bk_core::{DuplicatePrompt, JsonMarkerDump, SectionPrompt};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs share stderr with the prompts.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Read(args)) => {
            read::run(&mut stdout, args, &config, &JsonMarkerDump)?;
        }
        Some(Commands::Extract(args)) => {
            let mut prompt: Box<dyn DuplicatePrompt> = match &args.choices {
                Some(path) => Box::new(ChoiceFile::load(path)?),
                None => Box::new(TerminalPrompt::new(
                    io::stdin().lock(),
                    io::stderr(),
                    config.palette.clone(),
                )),
            };
            extract::run(&mut stdout, args, &config, &JsonMarkerDump, prompt.as_mut())?;
        }
        Some(Commands::Kubios(args)) => match &args.sections {
            Some(path) => {
                let file = SectionFile::load(path)?;
                kubios::run::<_, dyn SectionPrompt>(
                    &mut stdout,
                    args,
                    &config,
                    kubios::Sections::File(&file),
                )?;
            }
            None => {
                let mut prompt =
                    TerminalPrompt::new(io::stdin().lock(), io::stderr(), config.palette.clone());
                kubios::run(
                    &mut stdout,
                    args,
                    &config,
                    kubios::Sections::Prompt(&mut prompt),
                )?;
            }
        },
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
