//! Filesystem Probe for the File-Exists Wait
//!
//! Downloads and exports land on disk asynchronously, so "the file is
//! there" is a condition to poll like any other. This module is the
//! sampler: a non-recursive directory listing filtered by a glob pattern.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::result::{EsperarError, EsperarResult};

/// List files in `dir` whose name matches the glob `pattern`.
///
/// Matches files only (subdirectories are skipped) and does not recurse.
/// Results are sorted by name so repeated samples compare deterministically.
pub fn list_files(dir: impl AsRef<Path>, pattern: &str) -> EsperarResult<Vec<PathBuf>> {
    let matcher = Pattern::new(pattern).map_err(|e| EsperarError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut matches = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if matcher.matches(&name.to_string_lossy()) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}
