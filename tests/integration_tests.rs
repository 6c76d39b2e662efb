/// Integration tests for deskclean
///
/// These tests drive the library the way the binary does: build
/// `RunOptions`, call `run`, then inspect the directory and the summary.
///
/// Test categories:
/// 1. End-to-end runs of each operation
/// 2. Deduplication determinism
/// 3. Sort collisions
/// 4. Argument validation and fatal errors
/// 5. Operation ordering
/// 6. Dry-run mode and configuration
use chrono::{Local, NaiveDate, TimeDelta, TimeZone};
use deskclean::age::RetentionDays;
use deskclean::cli::{Cli, RunOptions, run, run_cli};
use deskclean::error::CleanError;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary target directory plus a separate, empty config file so runs
/// never pick up a config from the machine running the tests.
struct TestFixture {
    temp_dir: TempDir,
    config_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_dir = TempDir::new().expect("Failed to create config directory");
        let fixture = TestFixture {
            temp_dir,
            config_dir,
        };
        fixture.write_config("");
        fixture
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.toml")
    }

    fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).expect("Failed to write config");
    }

    /// Create a file with content in the test directory.
    fn create_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
        file_path
    }

    /// Create a file and set its modification time to midnight local time on `date`.
    fn create_file_dated(&self, name: &str, content: &[u8], (y, m, d): (i32, u32, u32)) {
        let path = self.create_file(name, content);
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("Invalid date");
        let local = Local
            .from_local_datetime(&date)
            .earliest()
            .expect("Unrepresentable local time");
        set_mtime(&path, local.timestamp());
    }

    /// Create a file last modified `days` days ago.
    fn create_file_aged(&self, name: &str, content: &[u8], days: i64) {
        let path = self.create_file(name, content);
        let modified = Local::now() - TimeDelta::days(days);
        set_mtime(&path, modified.timestamp());
    }

    fn options(&self) -> RunOptions {
        let mut options = RunOptions::new(self.path());
        options.config_path = Some(self.config_path());
        options
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> Vec<u8> {
        fs::read(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// Relative paths of every file under the test directory, sorted.
    fn snapshot(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(self.path(), self.path(), &mut files);
        files.sort();
        files
    }
}

fn set_mtime(path: &Path, unix_seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0))
        .expect("Failed to set mtime");
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).expect("Failed to read directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else {
            let relative = path.strip_prefix(root).expect("Path outside root");
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_dedupe_keeps_oldest_copy() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("a.txt", b"identical content", (2021, 1, 1));
    fixture.create_file_dated("b.txt", b"identical content", (2021, 6, 1));

    let mut options = fixture.options();
    options.dedupe = true;
    let summary = run(&options).expect("Run failed");

    fixture.assert_file_exists("a.txt");
    fixture.assert_file_not_exists("b.txt");

    let report = summary.dedupe.expect("Dedupe did not run");
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].survivor, fixture.path().join("a.txt"));
    assert_eq!(report.bytes_reclaimed(), b"identical content".len() as u64);
}

#[test]
fn test_sort_moves_into_category_folders() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", b"jpeg bytes");
    fixture.create_file("report.pdf", b"pdf bytes");

    let mut options = fixture.options();
    options.sort = true;
    let summary = run(&options).expect("Run failed");

    assert_eq!(
        fixture.snapshot(),
        vec!["Documents/report.pdf", "Images/photo.jpg"]
    );
    assert_eq!(fixture.read("Images/photo.jpg"), b"jpeg bytes");

    let report = summary.sort.expect("Sort did not run");
    assert_eq!(report.moved.len(), 2);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_remove_old_deletes_only_stale_files() {
    let fixture = TestFixture::new();
    fixture.create_file_aged("old.txt", b"old", 90);
    fixture.create_file_aged("new.txt", b"new", 5);

    let mut options = fixture.options();
    options.remove_old = Some(RetentionDays::new(60).expect("Valid retention"));
    let summary = run(&options).expect("Run failed");

    fixture.assert_file_not_exists("old.txt");
    fixture.assert_file_exists("new.txt");

    let report = summary.age.expect("Age removal did not run");
    assert_eq!(report.removed, vec![fixture.path().join("old.txt")]);
}

#[test]
fn test_unknown_extension_goes_to_other() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.xyz123", b"whatever");

    let mut options = fixture.options();
    options.sort = true;
    run(&options).expect("Run failed");

    fixture.assert_file_exists("Other/notes.xyz123");
}

// ============================================================================
// Deduplication determinism
// ============================================================================

#[test]
fn test_dedupe_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("one.bin", b"payload", (2022, 3, 1));
    fixture.create_file_dated("two.bin", b"payload", (2022, 3, 2));
    fixture.create_file_dated("three.bin", b"payload", (2022, 3, 3));
    fixture.create_file("unique.bin", b"something else entirely");

    let mut options = fixture.options();
    options.dedupe = true;

    run(&options).expect("First run failed");
    let after_first = fixture.snapshot();
    assert_eq!(after_first, vec!["one.bin", "unique.bin"]);

    let second = run(&options).expect("Second run failed");
    assert_eq!(fixture.snapshot(), after_first);

    let report = second.dedupe.expect("Dedupe did not run");
    assert!(report.removed.is_empty());
    assert_eq!(report.duplicate_groups, 0);
}

#[test]
fn test_dedupe_equal_mtime_keeps_smaller_name() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("zeta.txt", b"same bytes", (2020, 5, 5));
    fixture.create_file_dated("alpha.txt", b"same bytes", (2020, 5, 5));

    let mut options = fixture.options();
    options.dedupe = true;
    run(&options).expect("Run failed");

    assert_eq!(fixture.snapshot(), vec!["alpha.txt"]);
}

#[test]
fn test_dedupe_same_size_different_content_survives() {
    let fixture = TestFixture::new();
    fixture.create_file("left.txt", b"aaaa");
    fixture.create_file("right.txt", b"bbbb");

    let mut options = fixture.options();
    options.dedupe = true;
    let summary = run(&options).expect("Run failed");

    assert_eq!(fixture.snapshot(), vec!["left.txt", "right.txt"]);
    let report = summary.dedupe.expect("Dedupe did not run");
    assert_eq!(report.files_hashed, 2);
    assert!(report.removed.is_empty());
}

#[test]
fn test_dedupe_recursive_reaches_subdirectories() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("top.txt", b"shared", (2021, 1, 1));
    fixture.create_file_dated("nested/deeper.txt", b"shared", (2021, 2, 1));

    let mut options = fixture.options();
    options.dedupe = true;

    run(&options).expect("Run failed");
    assert_eq!(fixture.snapshot(), vec!["nested/deeper.txt", "top.txt"]);

    options.recursive = true;
    run(&options).expect("Run failed");
    assert_eq!(fixture.snapshot(), vec!["top.txt"]);
}

// ============================================================================
// Sort collisions
// ============================================================================

#[test]
fn test_sort_collision_gets_suffix() {
    let fixture = TestFixture::new();
    fixture.create_file("Documents/report.pdf", b"already sorted");
    fixture.create_file("report.pdf", b"new arrival");

    let mut options = fixture.options();
    options.sort = true;
    let summary = run(&options).expect("Run failed");

    assert_eq!(fixture.read("Documents/report.pdf"), b"already sorted");
    assert_eq!(fixture.read("Documents/report (1).pdf"), b"new arrival");
    fixture.assert_file_not_exists("report.pdf");

    let report = summary.sort.expect("Sort did not run");
    assert_eq!(
        report.moved[0].to,
        fixture.path().join("Documents").join("report (1).pdf")
    );
}

#[test]
fn test_sort_leaves_subdirectories_alone() {
    let fixture = TestFixture::new();
    fixture.create_file("projects/main.rs", b"fn main() {}");
    fixture.create_file("song.mp3", b"audio");

    let mut options = fixture.options();
    options.sort = true;
    options.recursive = true;
    run(&options).expect("Run failed");

    assert_eq!(fixture.snapshot(), vec!["Audio/song.mp3", "projects/main.rs"]);
}

// ============================================================================
// Argument validation and fatal errors
// ============================================================================

#[test]
fn test_negative_remove_old_mutates_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file_aged("ancient.txt", b"old", 400);
    fixture.create_file("photo.jpg", b"jpeg");
    fixture.create_file("copy.jpg", b"jpeg");
    let before = fixture.snapshot();

    let path = fixture.path().to_string_lossy().into_owned();
    let config = fixture.config_path().to_string_lossy().into_owned();
    let cli = <Cli as clap::Parser>::try_parse_from([
        "deskclean",
        "--sort",
        "--dedupe",
        "--remove-old",
        "-5",
        "--path",
        &path,
        "--config",
        &config,
    ])
    .expect("Failed to parse arguments");

    let result = run_cli(&cli);
    assert!(matches!(result, Err(CleanError::InvalidArgument(_))));
    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_zero_remove_old_deletes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("just_written.txt", b"fresh");
    fixture.create_file_aged("ancient.txt", b"old", 4000);

    let path = fixture.path().to_string_lossy().into_owned();
    let config = fixture.config_path().to_string_lossy().into_owned();
    let cli = <Cli as clap::Parser>::try_parse_from([
        "deskclean",
        "--remove-old",
        "0",
        "--path",
        &path,
        "--config",
        &config,
    ])
    .expect("Failed to parse arguments");

    let summary = run_cli(&cli).expect("Run failed");
    assert!(summary.age.is_none());
    assert_eq!(fixture.snapshot(), vec!["ancient.txt", "just_written.txt"]);

    // Set directly, a zero threshold is still inert.
    let mut options = fixture.options();
    options.remove_old = Some(RetentionDays::new(0).expect("Valid retention"));
    let summary = run(&options).expect("Run failed");
    assert_eq!(summary.age.map(|r| r.removed.len()), Some(0));
    assert_eq!(fixture.snapshot(), vec!["ancient.txt", "just_written.txt"]);
}

#[test]
fn test_non_numeric_remove_old_is_rejected() {
    let fixture = TestFixture::new();
    let path = fixture.path().to_string_lossy().into_owned();
    let cli = <Cli as clap::Parser>::try_parse_from([
        "deskclean",
        "--remove-old",
        "soon",
        "--path",
        &path,
    ])
    .expect("Failed to parse arguments");

    assert!(matches!(
        run_cli(&cli),
        Err(CleanError::InvalidArgument(_))
    ));
}

#[test]
fn test_missing_directory_is_fatal() {
    let fixture = TestFixture::new();
    let mut options = RunOptions::new(fixture.path().join("does-not-exist"));
    options.sort = true;

    let result = run(&options);
    assert!(matches!(result, Err(CleanError::DirectoryNotFound(_))));
}

#[test]
fn test_file_as_target_is_fatal() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("plain.txt", b"not a directory");
    let mut options = RunOptions::new(file);
    options.dedupe = true;

    assert!(matches!(
        run(&options),
        Err(CleanError::DirectoryNotFound(_))
    ));
}

#[test]
fn test_invalid_config_aborts_before_mutation() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", b"jpeg");
    fixture.write_config("[filters.exclude]\nregex = [\"(unclosed\"]\n");

    let mut options = fixture.options();
    options.sort = true;

    assert!(matches!(run(&options), Err(CleanError::Config(_))));
    assert_eq!(fixture.snapshot(), vec!["photo.jpg"]);
}

// ============================================================================
// Operation ordering
// ============================================================================

#[test]
fn test_operations_run_sort_then_dedupe_then_remove_old() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("a.txt", b"duplicate", (2021, 1, 1));
    fixture.create_file_dated("b.txt", b"duplicate", (2021, 6, 1));
    fixture.create_file("photo.jpg", b"fresh");

    let mut options = fixture.options();
    options.sort = true;
    options.dedupe = true;
    options.recursive = true;
    options.remove_old = Some(RetentionDays::new(60).expect("Valid retention"));
    let summary = run(&options).expect("Run failed");

    assert_eq!(fixture.snapshot(), vec!["Images/photo.jpg"]);

    // Dedupe and age removal both saw the post-sort layout.
    let dedupe = summary.dedupe.expect("Dedupe did not run");
    assert_eq!(
        dedupe.removed[0].path,
        fixture.path().join("Documents").join("b.txt")
    );
    let age = summary.age.expect("Age removal did not run");
    assert_eq!(age.removed, vec![fixture.path().join("Documents").join("a.txt")]);
    assert_eq!(summary.sort.map(|r| r.moved.len()), Some(3));
}

// ============================================================================
// Dry-run mode and configuration
// ============================================================================

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("a.txt", b"twin", (2021, 1, 1));
    fixture.create_file_dated("b.txt", b"twin", (2021, 6, 1));
    fixture.create_file("photo.jpg", b"jpeg");
    let before = fixture.snapshot();

    let mut options = fixture.options();
    options.sort = true;
    options.dedupe = true;
    options.remove_old = Some(RetentionDays::new(30).expect("Valid retention"));
    options.dry_run = true;
    let summary = run(&options).expect("Run failed");

    assert_eq!(fixture.snapshot(), before);
    assert!(summary.dry_run);

    // Sorting empties the top level, so nothing is left for the rest.
    let sort = summary.sort.expect("Sort did not run");
    assert_eq!(sort.moved.len(), 3);
    let dedupe = summary.dedupe.expect("Dedupe did not run");
    assert!(dedupe.removed.is_empty());
    let age = summary.age.expect("Age removal did not run");
    assert!(age.removed.is_empty());
}

#[test]
fn test_dry_run_predicts_the_real_run() {
    let fixture = TestFixture::new();
    fixture.create_file_dated("a.txt", b"twin", (2021, 1, 1));
    fixture.create_file_dated("b.txt", b"twin", (2021, 6, 1));
    fixture.create_file_dated("old.log", b"stale", (2020, 2, 2));
    fixture.create_file("Documents/a.txt", b"already here");
    fixture.create_file("photo.jpg", b"jpeg");

    let mut options = fixture.options();
    options.sort = true;
    options.dedupe = true;
    options.recursive = true;
    options.remove_old = Some(RetentionDays::new(60).expect("Valid retention"));

    options.dry_run = true;
    let preview = run(&options).expect("Dry run failed");
    options.dry_run = false;
    let real = run(&options).expect("Run failed");

    let moved = |summary: &deskclean::RunSummary| -> Vec<PathBuf> {
        summary.sort.as_ref().expect("Sort did not run").moved.iter().map(|m| m.to.clone()).collect()
    };
    let deduped = |summary: &deskclean::RunSummary| -> Vec<PathBuf> {
        summary.dedupe.as_ref().expect("Dedupe did not run").removed.iter().map(|r| r.path.clone()).collect()
    };
    let aged = |summary: &deskclean::RunSummary| -> Vec<PathBuf> {
        summary.age.as_ref().expect("Age removal did not run").removed.clone()
    };

    assert_eq!(moved(&preview), moved(&real));
    assert_eq!(deduped(&preview), deduped(&real));
    assert_eq!(aged(&preview), aged(&real));
    assert_eq!(
        deduped(&real),
        vec![fixture.path().join("Documents").join("b.txt")]
    );
}

#[test]
fn test_config_category_override() {
    let fixture = TestFixture::new();
    fixture.write_config(
        r#"
[categories]
fallback = "Misc"

[categories.map]
Notes = ["txt", "md"]
"#,
    );
    fixture.create_file("todo.txt", b"buy milk");
    fixture.create_file("readme.md", b"# hi");
    fixture.create_file("mystery.qqq", b"?");

    let mut options = fixture.options();
    options.sort = true;
    run(&options).expect("Run failed");

    assert_eq!(
        fixture.snapshot(),
        vec!["Misc/mystery.qqq", "Notes/readme.md", "Notes/todo.txt"]
    );
}

#[test]
fn test_config_excluded_files_are_untouched() {
    let fixture = TestFixture::new();
    fixture.write_config(
        r#"
[filters.exclude]
filenames = ["keep.pdf"]
extensions = ["tmp"]
"#,
    );
    fixture.create_file("keep.pdf", b"pinned");
    fixture.create_file("scratch.tmp", b"temp");
    fixture.create_file("other.pdf", b"sorted");

    let mut options = fixture.options();
    options.sort = true;
    run(&options).expect("Run failed");

    assert_eq!(
        fixture.snapshot(),
        vec!["Documents/other.pdf", "keep.pdf", "scratch.tmp"]
    );
}

#[test]
fn test_hidden_files_take_part_by_default() {
    let fixture = TestFixture::new();
    fixture.create_file_dated(".a", b"dotfile twin", (2021, 1, 1));
    fixture.create_file_dated(".b", b"dotfile twin", (2021, 6, 1));

    let mut options = fixture.options();
    options.dedupe = true;
    let summary = run(&options).expect("Run failed");

    assert_eq!(fixture.snapshot(), vec![".a"]);
    assert_eq!(summary.dedupe.map(|r| r.files_hashed), Some(2));
}

#[test]
fn test_hidden_files_can_be_excluded() {
    let fixture = TestFixture::new();
    fixture.write_config("[filters]\nenable_hidden_files = false\n");
    fixture.create_file_aged(".profile", b"dotfile", 400);

    let mut options = fixture.options();
    options.remove_old = Some(RetentionDays::new(1).expect("Valid retention"));
    run(&options).expect("Run failed");

    fixture.assert_file_exists(".profile");
}

#[test]
fn test_failed_move_is_skipped_and_run_continues() {
    let fixture = TestFixture::new();
    fixture.write_config("[filters.exclude]\nfilenames = [\"Images\"]\n");
    fixture.create_file("Images", b"a file squatting on the folder name");
    fixture.create_file("photo.jpg", b"jpeg");
    fixture.create_file("report.pdf", b"pdf");

    let mut options = fixture.options();
    options.sort = true;
    let summary = run(&options).expect("Run failed");

    fixture.assert_file_exists("photo.jpg");
    fixture.assert_file_exists("Documents/report.pdf");
    assert_eq!(summary.total_skipped(), 1);
    let report = summary.sort.expect("Sort did not run");
    assert_eq!(report.skipped[0].path, fixture.path().join("photo.jpg"));
    assert_eq!(report.moved.len(), 1);
}

#[test]
fn test_empty_directory_is_a_clean_run() {
    let fixture = TestFixture::new();

    let mut options = fixture.options();
    options.sort = true;
    options.dedupe = true;
    options.remove_old = Some(RetentionDays::new(1).expect("Valid retention"));
    let summary = run(&options).expect("Run failed");

    assert!(!summary.is_empty());
    assert_eq!(summary.total_skipped(), 0);
    assert!(fixture.snapshot().is_empty());
}
