//! Output formatting and styling module.
//!
//! All console output of a run goes through [`OutputFormatter`], so the
//! library itself only logs and returns reports.

use crate::report::{AgeReport, DedupeReport, RunSummary, Skipped, SortReport};
use colored::*;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars and the end-of-run summary
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use deskclean::output::OutputFormatter;
    /// OutputFormatter::error("Directory not found: /home/me/Desktop");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Turns colored output off for the rest of the process.
    pub fn disable_colors() {
        colored::control::set_override(false);
    }

    /// Creates a progress bar for file operations.
    ///
    /// ```no_run
    /// use deskclean::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        match ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            Ok(style) => pb.set_style(style.progress_chars("█▓░")),
            Err(e) => log::debug!("Falling back to default progress style: {}", e),
        }
        pb
    }

    /// Prints everything a run did, followed by the totals.
    pub fn run_summary(summary: &RunSummary) {
        Self::info(&format!("Cleaning {}", summary.target.display()));
        if summary.dry_run {
            Self::dry_run_notice("No files were modified.");
        }

        if let Some(report) = &summary.sort {
            Self::sort_section(&summary.target, report, summary.dry_run);
        }
        if let Some(report) = &summary.dedupe {
            Self::dedupe_section(&summary.target, report, summary.dry_run);
        }
        if let Some(report) = &summary.age {
            Self::age_section(&summary.target, report, summary.dry_run);
        }

        Self::totals(summary);
    }

    fn sort_section(target: &Path, report: &SortReport, dry_run: bool) {
        Self::header("SORT");
        let verb = if dry_run { "Would move" } else { "Moved" };
        for moved in &report.moved {
            println!(
                "  {} {} → {}",
                verb,
                display_relative(target, &moved.from),
                display_relative(target, &moved.to)
            );
        }
        Self::skipped_lines(target, &report.skipped);

        if !report.moved.is_empty() {
            Self::category_table(&report.counts_by_category(), report.moved.len());
        }
    }

    fn dedupe_section(target: &Path, report: &DedupeReport, dry_run: bool) {
        Self::header("DEDUPE");
        let verb = if dry_run { "Would remove" } else { "Removed" };
        for removed in &report.removed {
            println!(
                "  {} {} {}",
                verb,
                display_relative(target, &removed.path),
                format!("(copy of {})", display_relative(target, &removed.survivor)).dimmed()
            );
        }
        Self::skipped_lines(target, &report.skipped);
        Self::plain(&format!(
            "  {} files hashed, {} duplicate groups",
            report.files_hashed, report.duplicate_groups
        ));
    }

    fn age_section(target: &Path, report: &AgeReport, dry_run: bool) {
        Self::header("REMOVE OLD");
        Self::plain(&format!(
            "  Cutoff: {}",
            report.cutoff.format("%Y-%m-%d %H:%M")
        ));
        let verb = if dry_run { "Would delete" } else { "Deleted" };
        for path in &report.removed {
            println!("  {} {}", verb, display_relative(target, path));
        }
        Self::skipped_lines(target, &report.skipped);
    }

    fn skipped_lines(target: &Path, skipped: &[Skipped]) {
        for entry in skipped {
            eprintln!(
                "  {} {}: {}",
                "⚠".yellow(),
                display_relative(target, &entry.path),
                entry.reason
            );
        }
    }

    /// Prints a table of moved files per category.
    fn category_table(category_counts: &[(String, usize)], total_files: usize) {
        let width = category_counts
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!();
        println!(
            "  {:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("  {}", "-".repeat(width + 10));
        for (category, count) in category_counts {
            println!(
                "  {:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count, "file", "files"),
                width = width
            );
        }
        println!("  {}", "-".repeat(width + 10));
        println!(
            "  {:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files, "file", "files"),
            width = width
        );
    }

    fn totals(summary: &RunSummary) {
        Self::header("SUMMARY");
        if let Some(report) = &summary.sort {
            Self::plain(&format!("  Sorted:             {}", report.moved.len()));
        }
        if let Some(report) = &summary.dedupe {
            Self::plain(&format!(
                "  Duplicates removed: {} ({})",
                report.removed.len(),
                HumanBytes(report.bytes_reclaimed())
            ));
        }
        if let Some(report) = &summary.age {
            Self::plain(&format!("  Old files removed:  {}", report.removed.len()));
        }

        let skipped = summary.total_skipped();
        if skipped == 0 {
            Self::success("Done.");
        } else {
            Self::warning(&format!(
                "Done, {} {} skipped. See above for details.",
                skipped,
                plural(skipped, "file", "files")
            ));
        }
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

/// `path` relative to `target` when it lies inside it.
fn display_relative(target: &Path, path: &Path) -> String {
    path.strip_prefix(target)
        .unwrap_or(path)
        .display()
        .to_string()
}
