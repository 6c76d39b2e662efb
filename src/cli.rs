//! Command-line interface and run orchestration.
//!
//! This module handles:
//! - Flag parsing (clap)
//! - Resolving the target directory (override or the user's Desktop)
//! - Validating every argument before anything is touched
//! - Running the enabled operations in the fixed order sort → dedupe → remove-old

use crate::age::{AgeRemover, RetentionDays};
use crate::config::CleanConfig;
use crate::dedupe::Deduplicator;
use crate::error::{CleanError, CleanResult};
use crate::report::{DedupeReport, RunSummary, SortReport};
use crate::scanner::{FileRecord, Scanner, ensure_directory};
use crate::sorter::Sorter;
use clap::Parser;
use directories::{BaseDirs, UserDirs};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Tidy a directory: sort files into folders, remove duplicates, delete stale files.
///
/// Operations run in the order sort, dedupe, remove-old; each one looks at
/// the directory as the previous one left it.
#[derive(Debug, Parser)]
#[command(name = "deskclean")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Move files into category folders (Images, Documents, ...) by extension
    #[arg(long)]
    pub sort: bool,

    /// Delete duplicate files, keeping the oldest copy
    #[arg(long)]
    pub dedupe: bool,

    /// Delete files not modified within the last DAYS days
    #[arg(long, value_name = "DAYS", allow_hyphen_values = true)]
    pub remove_old: Option<String>,

    /// Directory to clean [default: your Desktop]
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Let dedupe and remove-old descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Configuration file [default: ./.deskcleanrc.toml, then the user config dir]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// A fully validated run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory every operation works on.
    pub target: PathBuf,
    pub sort: bool,
    pub dedupe: bool,
    pub remove_old: Option<RetentionDays>,
    pub dry_run: bool,
    pub recursive: bool,
    /// Explicit configuration file, if any.
    pub config_path: Option<PathBuf>,
    pub show_progress: bool,
}

impl RunOptions {
    /// Options for `target` with every operation disabled.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            sort: false,
            dedupe: false,
            remove_old: None,
            dry_run: false,
            recursive: false,
            config_path: None,
            show_progress: false,
        }
    }

    /// Validates parsed flags.
    ///
    /// # Errors
    ///
    /// * [`CleanError::InvalidArgument`] for a bad `--remove-old` value
    /// * [`CleanError::DirectoryNotFound`] if the target directory is missing
    pub fn from_cli(cli: &Cli) -> CleanResult<Self> {
        let remove_old = cli
            .remove_old
            .as_deref()
            .map(RetentionDays::parse)
            .transpose()?
            .filter(|retention| {
                if retention.is_disabled() {
                    log::info!("--remove-old 0 leaves age removal off");
                }
                !retention.is_disabled()
            });
        let target = resolve_target(cli.path.as_deref())?;

        Ok(Self {
            target,
            sort: cli.sort,
            dedupe: cli.dedupe,
            remove_old,
            dry_run: cli.dry_run,
            recursive: cli.recursive,
            config_path: cli.config.clone(),
            show_progress: !cli.quiet,
        })
    }

    /// True if at least one operation is enabled.
    pub fn has_operation(&self) -> bool {
        self.sort || self.dedupe || self.remove_old.is_some()
    }
}

/// The directory to clean: `path` when given, otherwise the user's Desktop.
///
/// # Errors
///
/// [`CleanError::DirectoryNotFound`] if the directory does not exist.
pub fn resolve_target(path: Option<&Path>) -> CleanResult<PathBuf> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => default_target_dir()?,
    };
    ensure_directory(&target)?;
    Ok(target)
}

/// The platform Desktop directory, falling back to `<home>/Desktop`.
pub fn default_target_dir() -> CleanResult<PathBuf> {
    UserDirs::new()
        .and_then(|dirs| dirs.desktop_dir().map(Path::to_path_buf))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join("Desktop")))
        .ok_or_else(|| CleanError::DirectoryNotFound(PathBuf::from("~/Desktop")))
}

/// Validates already-parsed flags and runs them.
pub fn run_cli(cli: &Cli) -> CleanResult<RunSummary> {
    let options = RunOptions::from_cli(cli)?;
    run(&options)
}

/// Runs the enabled operations against `options.target`.
///
/// Configuration is loaded and compiled up front, so a bad config file fails
/// the run before any file is moved or deleted. Each operation scans the
/// directory afresh, except in a dry run: there the directory is scanned once
/// and each operation sees the planned result of the ones before it.
pub fn run(options: &RunOptions) -> CleanResult<RunSummary> {
    let target = options.target.as_path();
    ensure_directory(target)?;

    let config = CleanConfig::load(options.config_path.as_deref())?;
    let filters = config.compile_filters()?;
    let categories = config.category_map()?;
    let scanner = Scanner::new(filters).recursive(options.recursive);

    let mut summary = RunSummary::new(options.target.clone(), options.dry_run);
    if !options.has_operation() {
        log::warn!("No operation selected");
        return Ok(summary);
    }

    // Nothing changes on disk in a dry run, so later operations work on
    // this list as the earlier ones would have left it.
    let mut planned = if options.dry_run {
        Some(scanner.scan(target)?)
    } else {
        None
    };

    if options.sort {
        let sorter = Sorter::new(&scanner, categories).dry_run(options.dry_run);
        let report = sorter.run(target)?;
        planned = planned.map(|records| apply_moves(records, &report, &scanner, target));
        summary.sort = Some(report);
    }

    if options.dedupe {
        let deduplicator = Deduplicator::new(scanner.clone())
            .dry_run(options.dry_run)
            .show_progress(options.show_progress);
        let report = match planned.take() {
            Some(records) => {
                let report = deduplicator.run_on(records.clone());
                planned = Some(without_removed(records, &report));
                report
            }
            None => deduplicator.run(target)?,
        };
        summary.dedupe = Some(report);
    }

    if let Some(retention) = options.remove_old {
        let remover = AgeRemover::new(scanner, retention).dry_run(options.dry_run);
        let report = match &planned {
            Some(records) => remover.run_on(records),
            None => remover.run(target)?,
        };
        summary.age = Some(report);
    }

    Ok(summary)
}

/// `records` after the moves in `sort`, keeping what `scanner` would still find.
fn apply_moves(
    records: Vec<FileRecord>,
    sort: &SortReport,
    scanner: &Scanner,
    target: &Path,
) -> Vec<FileRecord> {
    let moves: HashMap<&Path, &Path> = sort
        .moved
        .iter()
        .map(|moved| (moved.from.as_path(), moved.to.as_path()))
        .collect();

    let mut records: Vec<FileRecord> = records
        .into_iter()
        .filter_map(|record| match moves.get(record.path.as_path()).copied() {
            None => Some(record),
            Some(to) => {
                let relocated = record.relocated(to.to_path_buf());
                scanner
                    .admits(target, &relocated.path)
                    .then_some(relocated)
            }
        })
        .collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));
    records
}

fn without_removed(records: Vec<FileRecord>, dedupe: &DedupeReport) -> Vec<FileRecord> {
    let removed: HashSet<&Path> = dedupe.removed.iter().map(|r| r.path.as_path()).collect();
    records
        .into_iter()
        .filter(|record| !removed.contains(record.path.as_path()))
        .collect()
}
