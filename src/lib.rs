//! deskclean - tidy a cluttered directory in one pass
//!
//! This library scans a single directory (the user's Desktop by default) and
//! runs up to three operations on it, always in this order:
//!
//! 1. **Sort** files into category folders by extension ([`sorter`])
//! 2. **Dedupe** byte-identical files, keeping the oldest copy ([`dedupe`])
//! 3. **Remove old** files past a retention window ([`age`])
//!
//! Failures on individual files are recorded in the per-operation reports and
//! never abort a run. Only precondition failures (missing directory, invalid
//! arguments, bad configuration) surface as [`CleanError`].

pub mod age;
pub mod category;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod output;
pub mod report;
pub mod scanner;
pub mod sorter;

pub use age::{AgeRemover, RetentionDays};
pub use category::CategoryMap;
pub use cli::{Cli, RunOptions, run, run_cli};
pub use config::{CleanConfig, CompiledFilters, ConfigError};
pub use dedupe::{Blake3Fingerprinter, ContentGroup, Deduplicator, Fingerprint, Fingerprinter};
pub use error::{CleanError, CleanResult};
pub use report::{AgeReport, DedupeReport, FileOutcome, RunSummary, Skipped, SortReport};
pub use scanner::{FileRecord, Scanner};
pub use sorter::{MoveError, Sorter};
