//! Validate and init command implementations

use colored::Colorize;

use crossref_meta::template::write_template;

use crate::commands::remote::run_clone;
use crate::context::Context;
use crate::error::Result;

/// Run the validate command
pub fn run_validate(context: &Context) -> Result<bool> {
    let loaded = context.load()?;
    let configuration = &loaded.configuration;

    tracing::info!("Schema validation passed for {}", context.config_path);
    tracing::info!(
        remotes = configuration.remotes.len(),
        entries = configuration.entry_count(),
        "Configuration file is valid"
    );
    println!("{} Configuration file is valid", "OK".green().bold());
    println!(
        "   {} remote(s), {} file entr{}",
        configuration.remotes.len(),
        configuration.entry_count(),
        if configuration.entry_count() == 1 { "y" } else { "ies" }
    );
    Ok(true)
}

/// Run the init command
///
/// An existing configuration is left alone.
pub fn run_init(context: &Context, clone: bool) -> Result<bool> {
    if !write_template(&context.config_path)? {
        tracing::warn!("Configuration file already exists: {}", context.config_path);
        return Ok(true);
    }

    println!("{} Created {}", "OK".green().bold(), context.config_path);
    println!("Edit this file to configure your remotes and files.");

    if clone {
        return run_clone(context, None);
    }
    Ok(true)
}
