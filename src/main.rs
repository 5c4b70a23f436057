mod cli;
mod commands;
mod config;
mod manifest;
mod progress;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Cluster file override
    pub config: Option<PathBuf>,
    /// Template directory override
    pub templates: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        templates: cli.templates,
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Plan { json } => commands::plan::run(&ctx, json),
        Command::Compose { role, json } => commands::compose::run(&ctx, role, json),
        Command::Render { role, output } => {
            commands::render::run(&ctx, role, output.as_deref())
        }
        Command::Diff { other, role } => commands::diff::run(&ctx, &other, role),
        Command::Validate => commands::validate::run(&ctx),
        Command::Boot { role, dry_run, yes } => commands::boot::run(&ctx, role, dry_run, yes),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "searchform", &mut io::stdout());
            Ok(())
        }
    }
}
