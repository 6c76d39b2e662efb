//! Directory scanning.
//!
//! A scan turns the regular files of the target directory into
//! [`FileRecord`]s. Records are snapshots: each operation scans again rather
//! than trusting a list taken before an earlier operation moved or deleted
//! files.

use crate::category::normalize_extension;
use crate::config::CompiledFilters;
use crate::dedupe::Fingerprint;
use crate::error::{CleanError, CleanResult};
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// One regular file as seen at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Full path to the file.
    pub path: PathBuf,
    /// Base name of the file.
    pub name: String,
    /// Lowercased extension without the dot, if the name has one.
    pub extension: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Content fingerprint, only present once deduplication computed it.
    pub fingerprint: Option<Fingerprint>,
}

impl FileRecord {
    /// Builds a record from a path and its already-fetched metadata.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let extension = path
            .extension()
            .map(|ext| normalize_extension(&ext.to_string_lossy()))
            .filter(|ext| !ext.is_empty());

        Ok(Self {
            name,
            extension,
            size: metadata.len(),
            modified: metadata.modified()?,
            fingerprint: None,
            path,
        })
    }

    /// Stats `path` and builds a record for it.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Self::from_metadata(path.to_path_buf(), &metadata)
    }

    /// Returns the same record carrying `fingerprint`.
    pub fn with_fingerprint(self, fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint: Some(fingerprint),
            ..self
        }
    }

    /// Returns the same file as it would look after a move to `path`.
    pub fn relocated(self, path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        Self { path, name, ..self }
    }
}

/// Enumerates files of a directory.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    filters: CompiledFilters,
    recursive: bool,
}

impl Scanner {
    /// A non-recursive scanner applying `filters`.
    pub fn new(filters: CompiledFilters) -> Self {
        Self {
            filters,
            recursive: false,
        }
    }

    /// Whether to descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Returns a non-recursive scanner with the same filters.
    pub fn top_level(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            recursive: false,
        }
    }

    /// Whether a scan of `dir` would report a regular file at `path`.
    ///
    /// Only the path is considered; nothing is read from disk.
    pub fn admits(&self, dir: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(dir) else {
            return false;
        };
        if !self.recursive {
            return relative.components().count() == 1 && self.filters.should_include(relative);
        }

        let in_hidden_dir = relative.parent().is_some_and(|parent| {
            parent
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        });
        (self.filters.includes_hidden() || !in_hidden_dir) && self.filters.should_include(relative)
    }

    /// Lists the regular files in `dir`, sorted by path.
    ///
    /// Symlinks are not followed and are never reported. Entries whose
    /// metadata cannot be read are logged and left out.
    ///
    /// # Errors
    ///
    /// * [`CleanError::DirectoryNotFound`] if `dir` is missing or not a directory
    /// * [`CleanError::ScanFailed`] if the directory cannot be listed
    pub fn scan(&self, dir: &Path) -> CleanResult<Vec<FileRecord>> {
        ensure_directory(dir)?;

        let mut records = if self.recursive {
            self.scan_recursive(dir)?
        } else {
            self.scan_flat(dir)?
        };
        records.sort_by(|a, b| a.path.cmp(&b.path));

        log::debug!("Scanned {}: {} files", dir.display(), records.len());
        Ok(records)
    }

    fn scan_flat(&self, dir: &Path) -> CleanResult<Vec<FileRecord>> {
        let entries = fs::read_dir(dir).map_err(|e| CleanError::ScanFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Could not read an entry of {}: {}", dir.display(), e);
                    continue;
                }
            };

            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            if !self.filters.should_include(Path::new(&entry.file_name())) {
                log::trace!("Filtered out {}", path.display());
                continue;
            }

            match entry
                .metadata()
                .and_then(|metadata| FileRecord::from_metadata(path.clone(), &metadata))
            {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Could not stat {}: {}", path.display(), e),
            }
        }

        Ok(records)
    }

    fn scan_recursive(&self, dir: &Path) -> CleanResult<Vec<FileRecord>> {
        // Surface an unreadable root as fatal, like the flat scan does.
        fs::read_dir(dir).map_err(|e| CleanError::ScanFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let include_hidden = self.filters.includes_hidden();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                include_hidden
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_string_lossy().starts_with('.')
            });

        let mut records = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Could not read entry under {}: {}", dir.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            if !self.filters.should_include(relative) {
                log::trace!("Filtered out {}", entry.path().display());
                continue;
            }

            let path = entry.path().to_path_buf();
            match entry
                .metadata()
                .map_err(io::Error::from)
                .and_then(|metadata| FileRecord::from_metadata(path.clone(), &metadata))
            {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Could not stat {}: {}", path.display(), e),
            }
        }

        Ok(records)
    }
}

/// Lists the regular files directly inside `dir` with default filters.
pub fn scan_directory(dir: &Path) -> CleanResult<Vec<FileRecord>> {
    Scanner::default().scan(dir)
}

/// Fails with [`CleanError::DirectoryNotFound`] unless `dir` is an existing directory.
pub fn ensure_directory(dir: &Path) -> CleanResult<()> {
    match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(CleanError::DirectoryNotFound(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CleanError::DirectoryNotFound(dir.to_path_buf()))
        }
        Err(e) => Err(CleanError::ScanFailed {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}
