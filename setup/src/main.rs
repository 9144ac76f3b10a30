//! Plugin activation setup for the host application.
//!
//! Merges plugin activations into the user's settings file
//! (`~/.claude/settings.json` by default) without disturbing anything else in
//! it, replacing the file atomically.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use molcajete_setup::exit_codes;
use molcajete_setup::io::paths::default_settings_path;
use molcajete_setup::list::configured_plugins;
use molcajete_setup::logging;
use molcajete_setup::setup::{SetupOutcome, failed_outcome, setup};

#[derive(Parser)]
#[command(
    name = "molcajete-setup",
    version,
    about = "Activate molcajete plugins in the host settings file"
)]
struct Cli {
    /// Settings file to update instead of `~/.claude/settings.json`.
    #[arg(long, global = true, env = "MOLCAJETE_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Print machine-readable JSON instead of a message.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Activate plugins (short names like `git`, or `molcajete/git`).
    Add {
        /// Plugins to activate. May be empty.
        plugins: Vec<String>,
    },
    /// List molcajete plugins currently activated.
    List,
    /// Print the settings file path in use.
    Path,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Add { plugins } => cmd_add(cli.settings, &plugins, cli.json),
        Command::List => cmd_list(cli.settings, cli.json),
        Command::Path => cmd_path(cli.settings),
    }
}

fn cmd_add(settings: Option<PathBuf>, plugins: &[String], json: bool) -> Result<i32> {
    let outcome = match settings {
        Some(path) => setup(&path, plugins),
        None => match default_settings_path() {
            Ok(path) => setup(&path, plugins),
            Err(err) => failed_outcome(&PathBuf::new(), &err),
        },
    };
    report(&outcome, json)?;
    Ok(if outcome.success {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

fn cmd_list(settings: Option<PathBuf>, json: bool) -> Result<i32> {
    let path = resolve(settings)?;
    let plugins = configured_plugins(&path)?;
    if json {
        print_json(&plugins)?;
    } else if plugins.is_empty() {
        println!("No molcajete plugins configured in {}", path.display());
    } else {
        for plugin in &plugins {
            println!("{} {}", plugin.id, plugin.version);
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_path(settings: Option<PathBuf>) -> Result<i32> {
    println!("{}", resolve(settings)?.display());
    Ok(exit_codes::OK)
}

fn resolve(settings: Option<PathBuf>) -> Result<PathBuf> {
    match settings {
        Some(path) => Ok(path),
        None => default_settings_path().context("resolve settings path"),
    }
}

fn report(outcome: &SetupOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }
    if outcome.success {
        println!("{}", outcome.message);
    } else {
        eprintln!("{}", outcome.message);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_add_with_plugins() {
        let cli = Cli::parse_from(["molcajete-setup", "add", "git", "res"]);
        match cli.command {
            Command::Add { plugins } => assert_eq!(plugins, vec!["git", "res"]),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn parse_add_without_plugins() {
        let cli = Cli::parse_from(["molcajete-setup", "add"]);
        assert!(matches!(cli.command, Command::Add { plugins } if plugins.is_empty()));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["molcajete-setup", "list", "--settings", "/tmp/s.json", "--json"]);
        assert!(matches!(cli.command, Command::List));
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
        assert!(cli.json);
    }
}
