//! git-crossref CLI
//!
//! Syncs files tracked in `.gitcrossref` from external git repositories.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::SyncArgs;
use context::Context;
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let Some(command) = cli.command else {
        println!("{} Sync files from external git repositories", "git-crossref".green().bold());
        println!();
        println!("Run {} for available commands.", "git-crossref --help".cyan());
        return Ok(true);
    };

    let cwd = std::env::current_dir()?;
    let context = Context::discover(&cwd, cli.config.as_deref(), cli.cache_dir.as_deref())?;
    execute_command(&context, command)
}

fn execute_command(context: &Context, command: Commands) -> Result<bool> {
    match command {
        Commands::Sync {
            files,
            force,
            remote,
            dry_run,
            jobs,
            timeout,
            json,
        } => commands::run_sync(
            context,
            &SyncArgs {
                files,
                force,
                remote,
                dry_run,
                jobs,
                timeout,
                json,
            },
        ),
        Commands::Check { remote, jobs, json } => commands::run_check(context, remote.as_deref(), jobs, json),
        Commands::Clone { remote } => commands::run_clone(context, remote.as_deref()),
        Commands::Clean { stale } => commands::run_clean(context, stale),
        Commands::Validate => commands::run_validate(context),
        Commands::Init { clone } => commands::run_init(context, clone),
    }
}
