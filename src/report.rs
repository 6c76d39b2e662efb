//! Per-file outcomes and per-operation reports.
//!
//! Operations never return an error for a single bad file. They record a
//! [`Skipped`] entry and move on; the reports collected here are what the
//! summary at the end of a run is printed from.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// A file an operation could not process, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// The file that was skipped.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

impl Skipped {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Emits the warning for this skip. Called where a skip is recorded.
    pub fn log(&self) {
        log::warn!("Skipping {}: {}", self.path.display(), self.reason);
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome<T> {
    /// The file was handled; carries what was done.
    Done(T),
    /// The file was left alone.
    Skipped(Skipped),
}

impl<T> FileOutcome<T> {
    /// Wraps a per-file result, turning the error into a skip for `path`.
    pub fn from_result<E: ToString>(path: &Path, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => FileOutcome::Done(value),
            Err(e) => {
                let skipped = Skipped::new(path, e);
                skipped.log();
                FileOutcome::Skipped(skipped)
            }
        }
    }
}

/// A file the sorter moved (or would move, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    pub category: String,
}

/// Outcome of a sort pass.
#[derive(Debug, Clone, Default)]
pub struct SortReport {
    pub moved: Vec<MovedFile>,
    pub skipped: Vec<Skipped>,
}

impl SortReport {
    pub fn record(&mut self, outcome: FileOutcome<MovedFile>) {
        match outcome {
            FileOutcome::Done(moved) => self.moved.push(moved),
            FileOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    /// Number of moved files per category, sorted by category name.
    pub fn counts_by_category(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for moved in &self.moved {
            *counts.entry(moved.category.clone()).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}

/// A duplicate that was deleted (or would be, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedDuplicate {
    /// The deleted copy.
    pub path: PathBuf,
    /// The copy that was kept.
    pub survivor: PathBuf,
    /// Size of the deleted copy in bytes.
    pub size: u64,
}

/// Outcome of a deduplication pass.
#[derive(Debug, Clone, Default)]
pub struct DedupeReport {
    /// Files that were fingerprinted.
    pub files_hashed: usize,
    /// Content groups with more than one member.
    pub duplicate_groups: usize,
    pub removed: Vec<RemovedDuplicate>,
    pub skipped: Vec<Skipped>,
}

impl DedupeReport {
    pub fn record(&mut self, outcome: FileOutcome<RemovedDuplicate>) {
        match outcome {
            FileOutcome::Done(removed) => self.removed.push(removed),
            FileOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    /// Bytes freed by the removed copies.
    pub fn bytes_reclaimed(&self) -> u64 {
        self.removed.iter().map(|r| r.size).sum()
    }
}

/// Outcome of an age-based removal pass.
#[derive(Debug, Clone)]
pub struct AgeReport {
    /// Files modified before this instant were removed.
    pub cutoff: DateTime<Local>,
    pub removed: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

impl AgeReport {
    pub fn new(cutoff: DateTime<Local>) -> Self {
        Self {
            cutoff,
            removed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: FileOutcome<PathBuf>) {
        match outcome {
            FileOutcome::Done(path) => self.removed.push(path),
            FileOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }
}

/// Everything a run did, one report per enabled operation.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: PathBuf,
    pub dry_run: bool,
    pub sort: Option<SortReport>,
    pub dedupe: Option<DedupeReport>,
    pub age: Option<AgeReport>,
}

impl RunSummary {
    pub fn new(target: PathBuf, dry_run: bool) -> Self {
        Self {
            target,
            dry_run,
            sort: None,
            dedupe: None,
            age: None,
        }
    }

    /// True if no operation was enabled.
    pub fn is_empty(&self) -> bool {
        self.sort.is_none() && self.dedupe.is_none() && self.age.is_none()
    }

    /// Per-file failures across all operations.
    pub fn total_skipped(&self) -> usize {
        self.sort.as_ref().map_or(0, |r| r.skipped.len())
            + self.dedupe.as_ref().map_or(0, |r| r.skipped.len())
            + self.age.as_ref().map_or(0, |r| r.skipped.len())
    }
}
