//! Expected-failure detection
//!
//! Two conventions flip the meaning of "success" for an input:
//! - RDL inputs carry the [`EXPECT_FAILURE_MARKER`] token within their first
//!   [`MARKER_SCAN_LINES`] lines.
//! - CSV converter inputs have a file stem ending in [`FAILURE_STEM_SUFFIX`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Case-sensitive token marking an input that must fail elaboration
pub const EXPECT_FAILURE_MARKER: &str = "EXPECT_ELABORATION_FAILURE";

/// Only this many leading lines are inspected for the marker
pub const MARKER_SCAN_LINES: usize = 10;

/// Stem suffix marking a converter input that must be rejected
pub const FAILURE_STEM_SUFFIX: &str = "_fail";

/// Whether an RDL input is marked as expected to fail elaboration
///
/// Unreadable files, and files that stop decoding part way through the
/// prefix, report `false` for anything not already seen.
pub fn detect(path: &Path) -> bool {
    match File::open(path) {
        Ok(file) => scan_prefix(BufReader::new(file)),
        Err(e) => {
            tracing::debug!("Cannot read {} for marker scan: {}", path.display(), e);
            false
        }
    }
}

fn scan_prefix<R: BufRead>(reader: R) -> bool {
    reader
        .lines()
        .take(MARKER_SCAN_LINES)
        .map_while(|line| line.ok())
        .any(|line| line.contains(EXPECT_FAILURE_MARKER))
}

/// Whether a converter input is named as an expected-failure case
pub fn is_failure_case_name(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with(FAILURE_STEM_SUFFIX))
}
