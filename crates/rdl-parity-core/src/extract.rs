//! Diagnostic extraction from free-form tool output
//!
//! The two elaborators phrase the same problem with different prefixes:
//!
//! ```text
//! Line 5:3 - Field overlap detected
//! top.rdl:5:3: field X overlaps with field Y
//! ```
//!
//! Extraction keeps lines that look like diagnostics and strips those
//! location prefixes so only the message remains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase substrings that mark a line as a diagnostic
const DIAGNOSTIC_MARKERS: &[&str] = &[
    "error:",
    "fatal:",
    "field overlap detected",
    "field exceeds",
    "overlaps with",
];

/// A diagnostic message with its location prefix removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorRecord(String);

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ErrorRecord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pull normalized diagnostics out of combined stdout/stderr text, in source order
pub fn extract(combined_output: &str) -> Vec<ErrorRecord> {
    combined_output
        .lines()
        .filter(|line| is_diagnostic_line(line))
        .map(|line| ErrorRecord(normalize(line)))
        .collect()
}

fn is_diagnostic_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    DIAGNOSTIC_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Strip a `Line X:Y - ` prefix, or else a `file:line:col:` prefix
fn normalize(line: &str) -> String {
    let trimmed = line.trim();

    if trimmed.contains("Line ")
        && let Some((_, message)) = trimmed.split_once(" - ")
    {
        return message.to_string();
    }

    if trimmed.contains(':') {
        let parts: Vec<&str> = trimmed.splitn(4, ':').collect();
        if parts.len() >= 4 {
            return parts[3].trim().to_string();
        }
    }

    trimmed.to_string()
}
