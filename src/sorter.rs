//! Sorting files into category subdirectories.
//!
//! Each file directly inside the target directory is moved into
//! `<target>/<category>/`, where the category comes from its extension. An
//! existing file at the destination is never overwritten: the moved file gets
//! a ` (1)`, ` (2)`, ... suffix instead.

use crate::category::CategoryMap;
use crate::error::CleanResult;
use crate::report::{FileOutcome, MovedFile, SortReport};
use crate::scanner::{FileRecord, Scanner};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How many numbered names are tried before giving up on a file.
const MAX_SUFFIX: u32 = 9_999;

/// Errors moving a single file. These are per-file and never abort a run.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A non-directory already sits where the category directory should be.
    #[error("{} exists and is not a directory", .0.display())]
    CategoryPathOccupied(PathBuf),
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Every candidate name in the destination is taken.
    #[error("No free name for {name} in {}", dir.display())]
    NoFreeName { dir: PathBuf, name: String },
}

/// Moves files into category folders.
#[derive(Debug, Clone)]
pub struct Sorter {
    scanner: Scanner,
    categories: CategoryMap,
    dry_run: bool,
}

impl Sorter {
    /// A sorter using `categories`. Sorting always looks at the top level only.
    pub fn new(scanner: &Scanner, categories: CategoryMap) -> Self {
        Self {
            scanner: scanner.top_level(),
            categories,
            dry_run: false,
        }
    }

    /// Plan the moves without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The category folder for `record`.
    ///
    /// Files without an extension are sniffed with `infer`; a recognized
    /// type's canonical extension is looked up in the same table.
    pub fn categorize(&self, record: &FileRecord) -> String {
        if record.extension.is_some() {
            return self
                .categories
                .category_for(record.extension.as_deref())
                .to_string();
        }

        match infer::get_from_path(&record.path) {
            Ok(Some(kind)) => {
                log::debug!(
                    "{} sniffed as {} ({})",
                    record.name,
                    kind.mime_type(),
                    kind.extension()
                );
                self.categories
                    .category_for(Some(kind.extension()))
                    .to_string()
            }
            Ok(None) => self.categories.fallback().to_string(),
            Err(e) => {
                log::debug!("Could not sniff {}: {}", record.path.display(), e);
                self.categories.fallback().to_string()
            }
        }
    }

    /// Scans `dir` and moves every file into its category folder.
    pub fn run(&self, dir: &Path) -> CleanResult<SortReport> {
        let records = self.scanner.scan(dir)?;
        log::info!("Sorting {} files in {}", records.len(), dir.display());

        let mut report = SortReport::default();
        // Destinations planned in a dry run, so two files don't claim one name.
        let mut planned: HashSet<PathBuf> = HashSet::new();

        for record in &records {
            let category = self.categorize(record);
            let result = if self.dry_run {
                plan_move(dir, record, &category, &mut planned)
            } else {
                move_into_category(dir, &record.path, &category)
            };

            report.record(FileOutcome::from_result(
                &record.path,
                result.map(|to| {
                    log::debug!("{} -> {}", record.path.display(), to.display());
                    MovedFile {
                        from: record.path.clone(),
                        to,
                        category,
                    }
                }),
            ));
        }

        Ok(report)
    }
}

fn plan_move(
    base_path: &Path,
    record: &FileRecord,
    category: &str,
    planned: &mut HashSet<PathBuf>,
) -> Result<PathBuf, MoveError> {
    let category_path = base_path.join(category);
    if let Ok(metadata) = fs::symlink_metadata(&category_path)
        && !metadata.is_dir()
    {
        return Err(MoveError::CategoryPathOccupied(category_path));
    }
    let destination = free_destination(&category_path, &record.name, |candidate| {
        planned.contains(candidate) || path_is_taken(candidate)
    })?;
    planned.insert(destination.clone());
    Ok(destination)
}

/// Moves `file_path` into `base_path/category`, creating the folder if needed.
///
/// Returns the path the file ended up at.
///
/// # Examples
///
/// ```no_run
/// use deskclean::sorter::move_into_category;
/// use std::path::Path;
///
/// let moved = move_into_category(
///     Path::new("/home/me/Desktop"),
///     Path::new("/home/me/Desktop/photo.jpg"),
///     "Images",
/// );
/// match moved {
///     Ok(to) => println!("Moved to {}", to.display()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn move_into_category(
    base_path: &Path,
    file_path: &Path,
    category: &str,
) -> Result<PathBuf, MoveError> {
    let category_path = base_path.join(category);
    ensure_category_dir(&category_path)?;

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MoveError::FileMoveFailure {
            from: file_path.to_path_buf(),
            to: category_path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
        })?;

    let destination = free_destination(&category_path, &file_name, path_is_taken)?;

    fs::rename(file_path, &destination).map_err(|e| MoveError::FileMoveFailure {
        from: file_path.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    Ok(destination)
}

fn ensure_category_dir(category_path: &Path) -> Result<(), MoveError> {
    match fs::symlink_metadata(category_path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(MoveError::CategoryPathOccupied(category_path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir(category_path).map_err(|e| MoveError::DirectoryCreationFailed {
                path: category_path.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(MoveError::DirectoryCreationFailed {
            path: category_path.to_path_buf(),
            source: e,
        }),
    }
}

/// True if anything, including a dangling symlink, occupies `path`.
fn path_is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// First name in `dir` not rejected by `is_taken`: `name`, then `stem (1).ext`, ...
///
/// ```
/// use deskclean::sorter::free_destination;
/// use std::path::Path;
///
/// let taken = [Path::new("/d/a.txt"), Path::new("/d/a (1).txt")];
/// let free = free_destination(Path::new("/d"), "a.txt", |p| taken.contains(&p)).unwrap();
/// assert_eq!(free, Path::new("/d/a (2).txt"));
/// ```
pub fn free_destination(
    dir: &Path,
    name: &str,
    mut is_taken: impl FnMut(&Path) -> bool,
) -> Result<PathBuf, MoveError> {
    let candidate = dir.join(name);
    if !is_taken(&candidate) {
        return Ok(candidate);
    }

    let (stem, extension) = split_name(name);
    for counter in 1..=MAX_SUFFIX {
        let numbered = match extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = dir.join(numbered);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(MoveError::NoFreeName {
        dir: dir.to_path_buf(),
        name: name.to_string(),
    })
}

/// Splits at the last dot, treating a leading dot as part of the stem.
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}
