//! Extension → category lookup table used by the sorter.
//!
//! The table is plain data: it can be built from the defaults, extended from
//! configuration, or replaced by a small fixture in tests.
//!
//! # Examples
//!
//! ```
//! use deskclean::category::CategoryMap;
//!
//! let map = CategoryMap::builtin();
//! assert_eq!(map.category_for(Some("jpg")), "Images");
//! assert_eq!(map.category_for(Some("PDF")), "Documents");
//! assert_eq!(map.category_for(None), "Other");
//! ```

use std::collections::HashMap;

/// Built-in categories and the extensions routed into each one.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Images",
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "svg", "ico", "heic",
            "heif",
        ],
    ),
    (
        "Documents",
        &[
            "pdf", "doc", "docx", "txt", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp",
            "rtf", "md", "csv",
        ],
    ),
    (
        "Videos",
        &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm", "m4v", "3gp"],
    ),
    (
        "Audio",
        &["mp3", "wav", "aac", "flac", "ogg", "m4a", "wma", "opus"],
    ),
    (
        "Archives",
        &["zip", "rar", "tar", "gz", "7z", "bz2", "xz", "tgz"],
    ),
    (
        "Executables",
        &["exe", "msi", "bat", "sh", "cmd", "dmg", "pkg", "deb", "rpm", "appimage"],
    ),
    (
        "Scripts",
        &["py", "js", "ts", "rb", "php", "pl", "ps1", "lua"],
    ),
];

/// Maps normalized file extensions to category folder names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    extensions: HashMap<String, String>,
    fallback: String,
}

impl CategoryMap {
    /// Folder used for files whose extension matches nothing.
    pub const DEFAULT_FALLBACK: &'static str = "Other";

    /// Creates a table with the built-in categories.
    pub fn builtin() -> Self {
        let mut map = Self::empty(Self::DEFAULT_FALLBACK);
        for (category, extensions) in BUILTIN_CATEGORIES {
            for ext in *extensions {
                map.insert(ext, category);
            }
        }
        map
    }

    /// Creates a table with no entries; everything lands in `fallback`.
    pub fn empty(fallback: &str) -> Self {
        Self {
            extensions: HashMap::new(),
            fallback: fallback.to_string(),
        }
    }

    /// Routes `ext` into `category`, replacing any earlier entry for it.
    ///
    /// The extension is normalized: a leading dot is dropped and case is folded.
    pub fn insert(&mut self, ext: &str, category: &str) {
        self.extensions
            .insert(normalize_extension(ext), category.to_string());
    }

    /// Renames the fallback folder.
    pub fn set_fallback(&mut self, fallback: &str) {
        self.fallback = fallback.to_string();
    }

    /// The folder for unrecognized extensions.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Looks up an extension, `None` if it is not in the table.
    ///
    /// ```
    /// use deskclean::category::CategoryMap;
    ///
    /// let map = CategoryMap::builtin();
    /// assert_eq!(map.lookup("Mp3"), Some("Audio"));
    /// assert_eq!(map.lookup("xyz"), None);
    /// ```
    pub fn lookup(&self, ext: &str) -> Option<&str> {
        self.extensions
            .get(&normalize_extension(ext))
            .map(String::as_str)
    }

    /// The category for a file with the given extension, falling back when unknown.
    pub fn category_for(&self, ext: Option<&str>) -> &str {
        ext.and_then(|e| self.lookup(e)).unwrap_or(self.fallback.as_str())
    }

    /// Number of extensions in the table.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// True if no extension is mapped.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lowercases an extension and strips a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
