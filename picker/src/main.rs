//! Cherry-pick approved tracking entries onto a release branch.
//!
//! Reads the tracking table, keeps entries that are deployable but not yet
//! release-candidate or production, and cherry-picks them in table order into
//! the configured repository, skipping entries already referenced in history.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use picker::apply::ApplicationEngine;
use picker::core::report::{outcome_label, render, render_listing, render_plan_line};
use picker::core::types::{RunReport, RunStatus};
use picker::error::ConfigError;
use picker::exit_codes;
use picker::io::config::{DEFAULT_CONFIG_PATH, Overrides, ResolvedConfig, load_config};
use picker::io::git::Git;
use picker::io::sheet::source_from_config;
use picker::logging;
use picker::select::{Selection, load_selection};

#[derive(Parser)]
#[command(
    name = "picker",
    version,
    about = "Cherry-pick approved tracking entries onto a release branch"
)]
struct Cli {
    /// Path to picker.toml.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Repository that receives the cherry-picks (overrides `repo_path`).
    #[arg(long, global = true, env = "PICKER_REPO")]
    repo: Option<PathBuf>,

    /// Credentials file for the Sheets source (overrides `source.credentials_path`).
    #[arg(long, global = true, env = "PICKER_CREDENTIALS")]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the entries eligible for picking.
    List,
    /// Show which eligible entries are already picked, without changing anything.
    Plan,
    /// Cherry-pick eligible entries in table order; stops at the first conflict.
    Pick {
        /// Print the run report as JSON instead of progress lines.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FATAL);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?
        .anchor_paths(&config_dir(&cli.config))
        .resolve(Overrides {
            repo_path: cli.repo,
            credentials_path: cli.credentials,
        })
        .context("invalid configuration")?;
    debug!(config = %cli.config.display(), repo = %config.repo_path.display(), "configuration loaded");

    match cli.command {
        Command::List => cmd_list(&config),
        Command::Plan => cmd_plan(&config),
        Command::Pick { json } => cmd_pick(&config, json),
    }
}

fn cmd_list(config: &ResolvedConfig) -> Result<i32> {
    let selection = read_selection(config)?;
    print_listing(&selection, config);
    Ok(exit_codes::OK)
}

fn cmd_plan(config: &ResolvedConfig) -> Result<i32> {
    let selection = read_selection(config)?;
    if !print_listing(&selection, config) {
        return Ok(exit_codes::OK);
    }
    let git = open_repo(config)?;
    let planned = ApplicationEngine::new(&git)
        .plan(&selection.eligible)
        .context("check history")?;
    println!();
    for item in &planned {
        println!(
            "{}",
            render_plan_line(item.position, &item.entry, item.already_present, &config.display)
        );
    }
    let pending = planned.iter().filter(|p| !p.already_present).count();
    println!("\n{pending} of {} entries pending", planned.len());
    Ok(exit_codes::OK)
}

fn cmd_pick(config: &ResolvedConfig, json: bool) -> Result<i32> {
    let selection = read_selection(config)?;
    if json && selection.is_empty() {
        print_json(&RunReport {
            records: Vec::new(),
            status: RunStatus::Completed,
        })?;
        return Ok(exit_codes::OK);
    }
    if !json && !print_listing(&selection, config) {
        return Ok(exit_codes::OK);
    }
    let git = open_repo(config)?;
    if !json {
        println!("\nRepository: {}\n", git.workdir().display());
    }

    let report = ApplicationEngine::new(&git).run(&selection.eligible, |record| {
        info!(
            position = record.position,
            identifier = %record.entry.identifier,
            outcome = %outcome_label(&record.outcome),
            "entry processed"
        );
    });

    if json {
        print_json(&report)?;
    } else {
        println!("{}", render(&report, &config.display).trim_end());
    }

    let code = match report.status {
        RunStatus::Completed if report.has_failures() => exit_codes::PARTIAL,
        RunStatus::Completed => exit_codes::OK,
        RunStatus::HaltedOnConflict => exit_codes::CONFLICT,
        RunStatus::HaltedOnAdapterFailure(_) => exit_codes::FATAL,
    };
    Ok(code)
}

fn print_json(report: &RunReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("serialize run report")?
    );
    Ok(())
}

fn read_selection(config: &ResolvedConfig) -> Result<Selection> {
    let source = source_from_config(&config.source);
    let selection = load_selection(source.as_ref()).context("read tracking table")?;
    Ok(selection)
}

/// Print the listing table, or "Nothing to pick". Returns false if there is nothing to do.
fn print_listing(selection: &Selection, config: &ResolvedConfig) -> bool {
    if selection.is_empty() {
        println!("Nothing to pick ({} tracked entries)", selection.total);
        return false;
    }
    print!("{}", render_listing(&selection.eligible, &config.display));
    true
}

fn open_repo(config: &ResolvedConfig) -> Result<Git> {
    if !config.repo_path.is_dir() {
        return Err(ConfigError::Invalid {
            key: "repo_path",
            reason: format!("{} is not a directory", config.repo_path.display()),
        })
        .context("invalid configuration");
    }
    Git::new(&config.repo_path, &config.git)
}

/// Directory used to resolve relative paths in the config file.
fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
