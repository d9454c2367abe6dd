//! Finds suite files below a directory.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::SeaQaError;

/// File extensions recognised as suite documents.
pub const SUITE_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Returns true when `path` looks like a suite document.
pub fn is_suite_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUITE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Discovers all YAML suite files recursively under `root`, in sorted path order.
///
/// Unreadable entries are logged and skipped; a missing root is an error.
pub fn discover_suite_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, SeaQaError> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(SeaQaError::not_found(root));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_suite_file(entry.path()) => {
                files.push(entry.path().to_path_buf());
            }
            Ok(_) => {}
            Err(e) => warn!(root = %root.display(), error = %e, "skipping unreadable entry"),
        }
    }
    Ok(files)
}
