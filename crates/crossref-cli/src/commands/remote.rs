//! Clone and clean command implementations

use colored::Colorize;

use crossref_git::RemoteCache;

use crate::context::Context;
use crate::error::Result;

/// Run the clone command
///
/// Resolves the selected remotes into the cache without touching any
/// destination.
pub fn run_clone(context: &Context, remote: Option<&str>) -> Result<bool> {
    let loaded = context.load()?;
    let mut engine = context.engine(loaded, 1, None);

    println!("{} Cloning remotes into {}...", "=>".blue().bold(), context.cache_dir.display());
    let report = engine.clone_remotes(remote)?;

    for resolved in &report.resolved {
        println!(
            "   {} {} at {}",
            "+".green(),
            resolved.remote.cyan(),
            resolved.description
        );
    }
    for failure in &report.failures {
        println!("   {} {}: {}", "x".red(), failure.remote.cyan(), failure.message);
    }

    if report.failures.is_empty() {
        println!("{} {} remote(s) ready.", "OK".green().bold(), report.resolved.len());
    }
    Ok(report.failures.is_empty())
}

/// Run the clean command
///
/// Without `stale` every cached clone is removed; with it only clones of
/// remotes no longer in the configuration.
pub fn run_clean(context: &Context, stale: bool) -> Result<bool> {
    if stale {
        let loaded = context.load()?;
        let engine = context.engine(loaded, 1, None);
        let evicted = engine.prune_cache()?;
        for name in &evicted {
            println!("   {} {}", "-".yellow(), name.cyan());
        }
        println!("{} Removed {} stale clone(s).", "OK".green().bold(), evicted.len());
        return Ok(true);
    }

    let removed = context.cache().cleanup()?;
    println!(
        "{} Removed {} cached clone(s) from {}.",
        "OK".green().bold(),
        removed,
        context.cache_dir.display()
    );
    Ok(true)
}
