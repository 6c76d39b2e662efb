//! Removal of files that have not been modified for a number of days.

use crate::error::{CleanError, CleanResult};
use crate::report::{AgeReport, FileOutcome};
use crate::scanner::{FileRecord, Scanner};
use chrono::{DateTime, Local, TimeDelta};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// A validated age threshold in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetentionDays(u32);

impl RetentionDays {
    /// Largest accepted threshold (roughly 2700 years).
    pub const MAX: u32 = 1_000_000;

    /// Validates a day count.
    ///
    /// # Errors
    ///
    /// [`CleanError::InvalidArgument`] if `days` is negative or above [`Self::MAX`].
    pub fn new(days: i64) -> CleanResult<Self> {
        if days < 0 {
            return Err(CleanError::InvalidArgument(format!(
                "age threshold must not be negative, got {}",
                days
            )));
        }
        if days > i64::from(Self::MAX) {
            return Err(CleanError::InvalidArgument(format!(
                "age threshold of {} days exceeds the maximum of {}",
                days,
                Self::MAX
            )));
        }
        Ok(Self(days as u32))
    }

    /// Parses the textual form given on the command line.
    ///
    /// ```
    /// use deskclean::age::RetentionDays;
    ///
    /// assert_eq!(RetentionDays::parse("30").unwrap().days(), 30);
    /// assert!(RetentionDays::parse("0").unwrap().is_disabled());
    /// assert!(RetentionDays::parse("-5").is_err());
    /// assert!(RetentionDays::parse("soon").is_err());
    /// ```
    pub fn parse(input: &str) -> CleanResult<Self> {
        let trimmed = input.trim();
        let days: i64 = trimmed.parse().map_err(|_| {
            CleanError::InvalidArgument(format!(
                "age threshold must be a whole number of days, got '{}'",
                input
            ))
        })?;
        Self::new(days)
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    /// A threshold of zero days turns age removal off.
    pub fn is_disabled(&self) -> bool {
        self.0 == 0
    }

    /// The instant `days` before `now`.
    pub fn cutoff(&self, now: DateTime<Local>) -> DateTime<Local> {
        // MAX keeps this far inside chrono's range.
        now - TimeDelta::days(i64::from(self.0))
    }
}

impl FromStr for RetentionDays {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RetentionDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.0,
            if self.0 == 1 { "day" } else { "days" }
        )
    }
}

/// True if `record` was last modified strictly before `cutoff`.
pub fn is_older_than(record: &FileRecord, cutoff: DateTime<Local>) -> bool {
    DateTime::<Local>::from(record.modified) < cutoff
}

/// Deletes files older than a retention threshold.
#[derive(Debug, Clone)]
pub struct AgeRemover {
    scanner: Scanner,
    retention: RetentionDays,
    dry_run: bool,
    now: Option<DateTime<Local>>,
}

impl AgeRemover {
    pub fn new(scanner: Scanner, retention: RetentionDays) -> Self {
        Self {
            scanner,
            retention,
            dry_run: false,
            now: None,
        }
    }

    /// Report what would be removed without deleting anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pins the reference instant instead of reading the clock at run time.
    pub fn at(mut self, now: DateTime<Local>) -> Self {
        self.now = Some(now);
        self
    }

    /// Scans `dir` and deletes every file modified before the cutoff.
    ///
    /// A disabled threshold removes nothing and does not scan.
    pub fn run(&self, dir: &Path) -> CleanResult<AgeReport> {
        if self.retention.is_disabled() {
            log::info!("Age threshold is 0 days, nothing to remove");
            return Ok(self.run_on(&[]));
        }
        let records = self.scanner.scan(dir)?;
        Ok(self.run_on(&records))
    }

    /// Removes stale files from an already scanned file list.
    pub fn run_on(&self, records: &[FileRecord]) -> AgeReport {
        let now = self.now.unwrap_or_else(Local::now);
        let cutoff = self.retention.cutoff(now);
        let mut report = AgeReport::new(cutoff);
        if self.retention.is_disabled() {
            return report;
        }
        log::info!(
            "Removing files last modified before {}",
            cutoff.format("%Y-%m-%d %H:%M:%S")
        );

        for record in records.iter().filter(|r| is_older_than(r, cutoff)) {
            log::debug!("{} is older than {}", record.path.display(), self.retention);
            let result = if self.dry_run {
                Ok(())
            } else {
                fs::remove_file(&record.path).map_err(|e| format!("could not delete: {}", e))
            };
            report.record(FileOutcome::from_result(
                &record.path,
                result.map(|()| record.path.clone()),
            ));
        }

        report
    }
}
