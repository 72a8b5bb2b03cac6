//! Input file discovery
//!
//! Inputs are the files directly inside the corpus directory whose name
//! matches a glob pattern (`*.rdl`, `test_csv_*.csv`). Subdirectories are not
//! searched. The result is sorted by file name so reports are reproducible.

use crate::error::ParityError;
use crate::result::Result;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Discover corpus files in `dir` whose file name matches `pattern`
///
/// Fails with [`ParityError::TestDirMissing`] when `dir` is absent and with
/// [`ParityError::NoInputFiles`] when nothing matches.
pub fn discover_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ParityError::TestDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let matcher = Pattern::new(pattern).map_err(|e| {
        ParityError::config_error(format!("Invalid input pattern '{pattern}': {e}"))
    })?;

    // Dot-files stay out of the corpus unless the pattern itself starts with a dot
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let entries = fs::read_dir(dir).map_err(|e| ParityError::io_error(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| matcher.matches_with(name, options))
        })
        .collect();

    if files.is_empty() {
        return Err(ParityError::NoInputFiles {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Discovered {} inputs in {}", files.len(), dir.display());
    Ok(files)
}

/// File name of an input, for narration and reports
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
