//! Sync and check command implementations

use colored::Colorize;

use crossref_core::{FailureKind, Outcome, RunMode, SyncReport, SyncResult};

use crate::context::Context;
use crate::error::Result;

/// Options of the sync command.
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub files: Vec<String>,
    pub force: bool,
    pub remote: Option<String>,
    pub dry_run: bool,
    pub jobs: usize,
    pub timeout: Option<u64>,
    pub json: bool,
}

/// Run the sync command
///
/// Returns whether every entry ended cleanly.
pub fn run_sync(context: &Context, args: &SyncArgs) -> Result<bool> {
    let loaded = context.load()?;
    let mut engine = context.engine(loaded, args.jobs, args.timeout);

    if !args.json {
        let verb = if args.dry_run { "Checking" } else { "Syncing" };
        println!("{} {} tracked files...", "=>".blue().bold(), verb);
    }

    let report = if args.dry_run {
        engine.check_all(args.remote.as_deref())?
    } else if args.files.is_empty() {
        engine.sync_all(args.force, args.remote.as_deref())?
    } else {
        engine.sync_files(&args.files, args.force)?
    };

    finish(&report, args.json)
}

/// Run the check command
pub fn run_check(context: &Context, remote: Option<&str>, jobs: usize, json: bool) -> Result<bool> {
    let loaded = context.load()?;
    let mut engine = context.engine(loaded, jobs, None);

    if !json {
        println!("{} Checking tracked files...", "=>".blue().bold());
    }
    let report = engine.check_all(remote)?;
    finish(&report, json)
}

fn finish(report: &SyncReport, json: bool) -> Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }
    Ok(report.is_success())
}

/// Print a report in human-readable form.
pub fn print_report(report: &SyncReport) {
    for resolved in &report.resolved {
        println!(
            "   {} {} at {}",
            "@".blue(),
            resolved.remote.cyan(),
            resolved.description.dimmed()
        );
    }

    for result in &report.results {
        print_result(result);
    }

    for failure in &report.failures {
        let kind = match failure.kind {
            FailureKind::VersionNotFound => "VERSION NOT FOUND",
            FailureKind::Unavailable => "UNAVAILABLE",
            FailureKind::Other => "FAILED",
        };
        println!(
            "   {} {} {}: {} ({} entries skipped)",
            "x".red(),
            kind.red().bold(),
            failure.remote.cyan(),
            failure.message,
            failure.skipped
        );
    }

    for path in &report.unmatched {
        println!("   {} {}: no entry tracks this destination", "?".red(), path.cyan());
    }

    println!();
    print_summary(report);
}

fn print_result(result: &SyncResult) {
    let marker = match (result.outcome, &result.error) {
        (_, Some(_)) | (None, _) => "x".red(),
        (Some(Outcome::Create), _) => "+".green(),
        (Some(Outcome::NeedsUpdate), _) => "~".green(),
        (Some(Outcome::Overwrite), _) => "!".yellow(),
        (Some(Outcome::InSync), _) => "=".dimmed(),
        (Some(Outcome::Conflict), _) => "!".red(),
        (Some(Outcome::SourceMissing), _) => "?".red(),
    };
    println!(
        "   {} {} ({}): {}",
        marker,
        result.destination.cyan(),
        result.remote.dimmed(),
        result.summary
    );
    if let Some(error) = &result.error {
        println!("     {}", error.red());
    }

    for file in result.files.iter().filter(|file| file.outcome != Outcome::InSync) {
        println!("     {} {}", file.outcome.label().dimmed(), file.relative);
    }
}

fn print_summary(report: &SyncReport) {
    let counts: Vec<String> = [
        Outcome::Create,
        Outcome::NeedsUpdate,
        Outcome::Overwrite,
        Outcome::InSync,
        Outcome::Conflict,
        Outcome::SourceMissing,
    ]
    .into_iter()
    .filter_map(|outcome| {
        let count = report.count(outcome);
        (count > 0).then(|| format!("{count} {}", outcome.label()))
    })
    .collect();
    let counts = if counts.is_empty() {
        "nothing to do".to_string()
    } else {
        counts.join(", ")
    };

    if report.is_success() {
        let done = match report.mode {
            RunMode::Sync => "Sync complete",
            RunMode::Check | RunMode::Clone => "Check complete",
        };
        println!("{} {}: {}", "OK".green().bold(), done, counts);
        return;
    }

    println!("{} {}", "FAILED".red().bold(), counts);
    if report.count(Outcome::Conflict) > 0 {
        println!(
            "Local changes were kept. Run {} to overwrite them.",
            "git-crossref sync --force".cyan()
        );
    }
}
