//! `license-bouncer`: find, identify and police the licenses of dependencies.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and set up logging.
//! 2. Load config ([`config::load_config`]) and apply CLI overrides.
//! 3. List the project's modules ([`modules`]).
//! 4. Locate and identify each module's license ([`scan::Aggregator`]).
//! 5. Render, check ([`rules`]) or save ([`save`]) the results.
//! 6. Exit `0`, or `1` when the policy check fails or anything errors.

mod cli;
mod config;
mod license;
mod link;
mod locator;
mod models;
mod modules;
mod progress;
mod report;
mod rules;
mod save;
mod scan;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use regex::Regex;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ReportFormat, ScanArgs};
use config::{load_config, Config, OneOrMany};
use license::classifier::TextClassifier;
use link::RepositoryLinker;
use locator::{default_stop_at, Locator};
use models::LicenseResult;
use modules::cargo::CargoMetadataLister;
use modules::{ListingFile, ModuleLister};
use progress::ScanProgress;
use scan::Aggregator;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_override = cli.config.as_deref();

    match cli.command {
        Command::List { scan, format } => {
            let path = project_path(&scan.path);
            let config = load_config(&path, config_override)?;
            config.validate()?;
            let results = scan_project(&path, &config, &scan, cli.quiet)?;

            match format {
                ReportFormat::Table => report::terminal::render(&results, &path, cli.quiet),
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            }
        }

        Command::Check { scan, allow, deny, exclude_types, ignore } => {
            let path = project_path(&scan.path);
            let mut config = load_config(&path, config_override)?;
            if !allow.is_empty() {
                config.allow = OneOrMany(allow);
                config.deny = OneOrMany::default();
            } else if !deny.is_empty() {
                config.deny = OneOrMany(deny);
                config.allow = OneOrMany::default();
            } else if !exclude_types.is_empty() {
                config.allow = OneOrMany::default();
                config.deny = OneOrMany::default();
                config.exclude_types = exclude_types.iter().map(Into::into).collect();
            }
            if !ignore.is_empty() {
                config.ignore_packages = OneOrMany(ignore);
            }
            config.validate()?;
            let policy = config.policy()?;

            let results = scan_project(&path, &config, &scan, cli.quiet)?;
            let evaluation = policy.evaluate(&results);
            report::terminal::render_evaluation(&policy, &evaluation);

            if !evaluation.passed {
                std::process::exit(1);
            }
        }

        Command::Save { scan, save_path, force } => {
            let path = project_path(&scan.path);
            let config = load_config(&path, config_override)?;
            config.validate()?;

            if save_path.exists() {
                if !force {
                    bail!(
                        "{} already exists; pass --force to overwrite it",
                        save_path.display()
                    );
                }
                std::fs::remove_dir_all(&save_path)
                    .with_context(|| format!("failed to remove {}", save_path.display()))?;
            }

            let results = scan_project(&path, &config, &scan, cli.quiet)?;
            let saved = save::save(&results, &save_path)?;

            if !cli.quiet {
                for entry in &saved {
                    eprintln!(
                        "  {} {} ({}) {}",
                        "→".cyan(),
                        entry.library,
                        entry.restrictiveness,
                        entry.dir.display()
                    );
                }
            }
            eprintln!(
                "{} saved {} libraries to {}",
                "✓".green(),
                saved.len(),
                save_path.display()
            );
        }

        Command::Candidates { dir, root } => {
            let config = load_config(&dir, config_override)?;
            config.validate()?;
            let classifier = TextClassifier::new(config.threshold());
            let locator = build_locator(&classifier, &config)?;

            let root = root.unwrap_or_else(|| dir.clone());
            tracing::debug!(
                pattern = %locator.pattern(),
                threshold = classifier.threshold(),
                "searching for license files"
            );
            let candidates = locator.locate_all(&dir, &root)?;
            report::terminal::render_candidates(&candidates);
        }
    }

    Ok(())
}

/// `-v` count picks the default level; `RUST_LOG` overrides it.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn project_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn build_locator<'a>(classifier: &'a TextClassifier, config: &Config) -> Result<Locator<'a>> {
    let mut locator = Locator::new(classifier);
    if let Some(pattern) = &config.license_file_pattern {
        locator = locator.with_pattern(Regex::new(pattern)?);
    }
    if !config.stop_at.0.is_empty() {
        let mut stop_at = default_stop_at();
        for pattern in &config.stop_at.0 {
            stop_at.push(Regex::new(pattern)?);
        }
        locator = locator.with_stop_at(stop_at);
    }
    Ok(locator)
}

/// List the project's modules and locate/identify each one's license.
fn scan_project(
    path: &Path,
    config: &Config,
    scan: &ScanArgs,
    quiet: bool,
) -> Result<Vec<LicenseResult>> {
    let lister: Box<dyn ModuleLister> = match &scan.modules {
        Some(file) => Box::new(ListingFile { path: file.clone() }),
        None => Box::new(CargoMetadataLister::new(path)),
    };
    let modules = lister
        .list_modules()
        .with_context(|| format!("failed to list modules of {}", path.display()))?;

    if !quiet {
        eprintln!("  {} {} modules", "→".cyan(), modules.len());
    }

    let classifier = TextClassifier::new(config.threshold());
    let locator = build_locator(&classifier, config)?;
    let progress = ScanProgress::new(quiet);

    let mut aggregator = Aggregator::new(&classifier)
        .with_locator(locator)
        .with_linker(&RepositoryLinker)
        .with_progress(&progress);

    // --root is relative to the working directory, the config key to the project.
    let root = match (&scan.root, &config.root) {
        (Some(root), _) => Some(project_path(root)),
        (None, Some(root)) => Some(path.join(root)),
        (None, None) => None,
    };
    if let Some(root) = root {
        aggregator = aggregator.with_root(root);
    }

    let results = aggregator.aggregate(&modules);
    let failed = results.iter().filter(|r| r.has_errors()).count();
    if failed > 0 {
        tracing::info!(failed, total = results.len(), "some modules reported errors");
    }
    Ok(results)
}
