//! Duplicate removal.
//!
//! Detection runs in two phases:
//! 1. **Size grouping**: files with a size no other file shares cannot have a
//!    duplicate and are never read.
//! 2. **Fingerprinting**: members of each remaining size group are hashed in
//!    full with BLAKE3 and regrouped by digest.
//!
//! Equal fingerprints are taken as proof of equal content. In every
//! [`ContentGroup`] the copy with the earliest modification time survives;
//! ties go to the lexicographically smaller name, then the smaller path, so
//! repeated runs keep the same file.

use crate::error::CleanResult;
use crate::output::OutputFormatter;
use crate::report::{DedupeReport, FileOutcome, RemovedDuplicate, Skipped};
use crate::scanner::{FileRecord, Scanner};
use indicatif::ProgressBar;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

/// BLAKE3 digest of a file's full content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint of an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        blake3::hash(data).into()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<blake3::Hash> for Fingerprint {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_string();
        write!(f, "Fingerprint({}…)", &hex[..12])
    }
}

/// Computes content fingerprints.
pub trait Fingerprinter {
    fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint>;
}

/// Streams the file through BLAKE3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Fingerprinter;

impl Fingerprinter for Blake3Fingerprinter {
    fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(hasher.finalize().into())
    }
}

impl<F: Fingerprinter + ?Sized> Fingerprinter for &F {
    fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint> {
        (**self).fingerprint(path)
    }
}

/// Orders records so that the one to keep comes first.
pub fn survivor_order(a: &FileRecord, b: &FileRecord) -> Ordering {
    a.modified
        .cmp(&b.modified)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.path.cmp(&b.path))
}

/// Files with identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGroup {
    pub fingerprint: Fingerprint,
    /// Members in survivor order; never empty.
    members: Vec<FileRecord>,
}

impl ContentGroup {
    /// Groups `members`, which must share `fingerprint`.
    ///
    /// Returns `None` for an empty member list.
    pub fn new(fingerprint: Fingerprint, mut members: Vec<FileRecord>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }
        members.sort_by(survivor_order);
        Some(Self {
            fingerprint,
            members,
        })
    }

    /// The copy that is kept.
    pub fn survivor(&self) -> &FileRecord {
        &self.members[0]
    }

    /// Every copy except the survivor.
    pub fn redundant(&self) -> &[FileRecord] {
        &self.members[1..]
    }

    pub fn members(&self) -> &[FileRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partitions records by size, keeping only sizes shared by two or more files.
pub fn group_by_size(records: Vec<FileRecord>) -> Vec<Vec<FileRecord>> {
    let mut by_size: BTreeMap<u64, Vec<FileRecord>> = BTreeMap::new();
    for record in records {
        by_size.entry(record.size).or_default().push(record);
    }

    by_size
        .into_values()
        .filter(|group| group.len() > 1)
        .collect()
}

/// Result of duplicate detection, before anything is deleted.
#[derive(Debug, Clone, Default)]
pub struct DuplicateScan {
    /// Groups with at least two members, ordered by survivor path.
    pub groups: Vec<ContentGroup>,
    /// Number of files that were fingerprinted.
    pub files_hashed: usize,
    /// Files that could not be read.
    pub skipped: Vec<Skipped>,
}

/// Finds groups of identical files among `records`.
///
/// Only files in a shared size group are fingerprinted. A file that cannot be
/// read is recorded as skipped and takes no further part.
pub fn find_duplicates<F: Fingerprinter + ?Sized>(
    records: Vec<FileRecord>,
    fingerprinter: &F,
    progress: &ProgressBar,
) -> DuplicateScan {
    let size_groups = group_by_size(records);
    let candidates: usize = size_groups.iter().map(Vec::len).sum();
    progress.set_length(candidates as u64);
    log::debug!(
        "{} size groups, {} candidate files",
        size_groups.len(),
        candidates
    );

    let mut scan = DuplicateScan::default();
    for group in size_groups {
        let mut by_fingerprint: BTreeMap<Fingerprint, Vec<FileRecord>> = BTreeMap::new();

        for record in group {
            progress.set_message(record.name.clone());
            match fingerprinter.fingerprint(&record.path) {
                Ok(fingerprint) => {
                    scan.files_hashed += 1;
                    log::trace!("{} {}", fingerprint, record.path.display());
                    by_fingerprint
                        .entry(fingerprint)
                        .or_default()
                        .push(record.with_fingerprint(fingerprint));
                }
                Err(e) => {
                    let skipped = Skipped::new(&record.path, format!("could not read: {}", e));
                    skipped.log();
                    scan.skipped.push(skipped);
                }
            }
            progress.inc(1);
        }

        scan.groups.extend(
            by_fingerprint
                .into_iter()
                .filter(|(_, members)| members.len() > 1)
                .filter_map(|(fingerprint, members)| ContentGroup::new(fingerprint, members)),
        );
    }

    scan.groups
        .sort_by(|a, b| a.survivor().path.cmp(&b.survivor().path));
    scan
}

/// Removes duplicate files from a directory.
#[derive(Debug, Clone)]
pub struct Deduplicator<F = Blake3Fingerprinter> {
    scanner: Scanner,
    fingerprinter: F,
    dry_run: bool,
    show_progress: bool,
}

impl Deduplicator<Blake3Fingerprinter> {
    /// A deduplicator hashing with BLAKE3.
    pub fn new(scanner: Scanner) -> Self {
        Self::with_fingerprinter(scanner, Blake3Fingerprinter)
    }
}

impl<F: Fingerprinter> Deduplicator<F> {
    pub fn with_fingerprinter(scanner: Scanner, fingerprinter: F) -> Self {
        Self {
            scanner,
            fingerprinter,
            dry_run: false,
            show_progress: false,
        }
    }

    /// Report what would be removed without deleting anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Draw a progress bar while hashing.
    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Scans `dir`, then deletes every copy except each group's survivor.
    ///
    /// # Errors
    ///
    /// Only the scan itself can fail; per-file problems land in the report.
    pub fn run(&self, dir: &Path) -> CleanResult<DedupeReport> {
        let records = self.scanner.scan(dir)?;
        Ok(self.run_on(records))
    }

    /// Deduplicates an already scanned file list.
    ///
    /// Used by dry runs, where the list reflects what earlier operations
    /// would have done rather than the directory as it is.
    pub fn run_on(&self, records: Vec<FileRecord>) -> DedupeReport {
        log::info!("Checking {} files for duplicates", records.len());

        let progress = if self.show_progress {
            OutputFormatter::create_progress_bar(0)
        } else {
            ProgressBar::hidden()
        };
        let scan = find_duplicates(records, &self.fingerprinter, &progress);
        progress.finish_and_clear();

        let mut report = DedupeReport {
            files_hashed: scan.files_hashed,
            duplicate_groups: scan.groups.len(),
            skipped: scan.skipped,
            ..Default::default()
        };

        for group in &scan.groups {
            self.remove_redundant(group, &mut report);
        }

        log::info!(
            "{} duplicate groups, {} copies {}",
            report.duplicate_groups,
            report.removed.len(),
            if self.dry_run { "to remove" } else { "removed" }
        );
        report
    }

    fn remove_redundant(&self, group: &ContentGroup, report: &mut DedupeReport) {
        let survivor = group.survivor();

        // Never delete the other copies once the kept one is gone.
        if !survivor.path.is_file() {
            for duplicate in group.redundant() {
                let skipped = Skipped::new(
                    &duplicate.path,
                    format!("kept copy {} disappeared", survivor.path.display()),
                );
                skipped.log();
                report.record(FileOutcome::Skipped(skipped));
            }
            return;
        }

        for duplicate in group.redundant() {
            log::debug!(
                "{} duplicates {}",
                duplicate.path.display(),
                survivor.path.display()
            );
            let result = if self.dry_run {
                Ok(())
            } else {
                fs::remove_file(&duplicate.path).map_err(|e| format!("could not delete: {}", e))
            };

            report.record(FileOutcome::from_result(
                &duplicate.path,
                result.map(|()| RemovedDuplicate {
                    path: duplicate.path.clone(),
                    survivor: survivor.path.clone(),
                    size: duplicate.size,
                }),
            ));
        }
    }
}
