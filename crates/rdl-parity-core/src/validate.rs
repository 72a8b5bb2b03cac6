//! CSV-to-RDL converter validation
//!
//! Every `test_csv_*.csv` input is pushed through the converter. Inputs whose
//! stem ends in `_fail` must be rejected with a recognisable error; all other
//! inputs must convert, the produced RDL must pass the parser, and it must
//! contain every required content pattern.
//!
//! Patterns for a file come from, in order: a configured per-file override,
//! the built-in table of targeted cases, or the generic defaults.

use crate::config::{CasePatterns, CsvConfig};
use crate::discovery::display_name;
use crate::error::ParityError;
use crate::expectation::is_failure_case_name;
use crate::result::Result;
use crate::runner::{RunResult, Tool};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info};

pub const JSON_REPORT_FILE: &str = "validation_report.json";
pub const MARKDOWN_REPORT_FILE: &str = "validation_report.md";

/// Generic content patterns every converted file must contain
pub const DEFAULT_SUCCESS_PATTERNS: &[&str] = &[r"addrmap \w+ \{", r#"name = "[^"]+""#, r"\};\s*$"];

/// Generic error patterns; a rejected file must match at least one
pub const DEFAULT_FAILURE_PATTERNS: &[&str] = &[r"error|Error|ERROR", r"Line \d+"];

const MULTILINE_PATTERNS: &[&str] = &[
    r"addrmap [A-Z_]+ \{",
    r#"name = "[^"\n]+""#,
    r#"desc = "[^"]*""#,
];

const QUOTE_PATTERNS: &[&str] = &[r"addrmap \w+ \{", r#"name = "[^"]+""#, r"field \{"];

/// Inputs with hand-written expectations
const TARGETED_CASES: &[(&str, &[&str])] = &[
    (
        "test_csv_basic_example.csv",
        &[
            r"addrmap DEMO \{",
            r#"name = "DEMO""#,
            r#"reg \{[^}]*name = "CTRL""#,
            r#"field \{[^}]*name = "ENABLE""#,
            r#"field \{[^}]*name = "MODE""#,
            r#"desc = "Operation mode selection[^"]*- 0x0: Mode0[^"]*- 0x1: Mode1[^"]*""#,
            r"sw = rw",
            r"hw = rw",
        ],
    ),
    (
        "test_csv_mixed_types_fail.csv",
        &[
            r"mixed information types",
            r"Line 2 contains mixed information types",
        ],
    ),
    (
        "test_csv_field_before_reg_fail.csv",
        &[
            r"field.*but no register",
            r"Line 3 defines a field but no register was defined",
        ],
    ),
    ("test_csv_basic_multiline.csv", MULTILINE_PATTERNS),
    ("test_csv_advanced_multiline.csv", MULTILINE_PATTERNS),
    ("test_csv_complex_multiline.csv", MULTILINE_PATTERNS),
    ("test_csv_realistic_multiline.csv", MULTILINE_PATTERNS),
    ("test_csv_extreme_multiline.csv", MULTILINE_PATTERNS),
    (
        "test_csv_semicolon_delimiter.csv",
        &[r"addrmap \w+ \{", r#"name = "[^"]+""#],
    ),
    (
        "test_csv_fuzzy_header_matching.csv",
        &[
            r"addrmap \w+ \{",
            r"field \{[^}]*sw = \w+",
            r"field \{[^}]*hw = \w+",
        ],
    ),
    ("test_csv_quotes_mixed.csv", QUOTE_PATTERNS),
    ("test_csv_quotes_single_only.csv", QUOTE_PATTERNS),
    ("test_csv_quotes_boundaries.csv", QUOTE_PATTERNS),
];

/// How a pattern list is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternMode {
    /// Every pattern must match the converted RDL (multi-line, dot-all)
    RequireAll,
    /// At least one pattern must match the diagnostics (multi-line, case-insensitive)
    RequireAny,
}

impl PatternMode {
    fn for_case(expect_failure: bool) -> Self {
        if expect_failure {
            PatternMode::RequireAny
        } else {
            PatternMode::RequireAll
        }
    }

    fn compile(self, pattern: &str) -> Result<Regex> {
        let mut builder = RegexBuilder::new(pattern);
        builder.multi_line(true);
        match self {
            PatternMode::RequireAll => builder.dot_matches_new_line(true),
            PatternMode::RequireAny => builder.case_insensitive(true),
        };
        builder
            .build()
            .map_err(|e| ParityError::invalid_pattern(pattern, e))
    }
}

/// Patterns that apply to one input
pub fn patterns_for(path: &Path, overrides: &[CasePatterns]) -> Vec<String> {
    let name = display_name(path);

    if let Some(case) = overrides.iter().find(|c| c.file == name) {
        return case.patterns.clone();
    }
    if let Some((_, patterns)) = TARGETED_CASES.iter().find(|(file, _)| *file == name) {
        return patterns.iter().map(|p| p.to_string()).collect();
    }

    let defaults = if is_failure_case_name(path) {
        DEFAULT_FAILURE_PATTERNS
    } else {
        DEFAULT_SUCCESS_PATTERNS
    };
    defaults.iter().map(|p| p.to_string()).collect()
}

/// Why a validation case failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    ConversionFailed { stderr: String },
    OutputMissing { path: PathBuf },
    SyntaxCheckFailed { stderr: String },
    OutputUnreadable { message: String },
    MissingContentPatterns { patterns: Vec<String> },
    UnexpectedSuccess,
    NoErrorPatternMatched { patterns: Vec<String> },
    InvalidPattern { message: String },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::ConversionFailed { stderr } => {
                write!(f, "CSV2RDL conversion failed - {stderr}")
            }
            ValidationFailure::OutputMissing { path } => {
                write!(f, "Output file not created: {}", path.display())
            }
            ValidationFailure::SyntaxCheckFailed { stderr } => {
                write!(f, "RDL syntax validation failed - {stderr}")
            }
            ValidationFailure::OutputUnreadable { message } => {
                write!(f, "Error reading output: {message}")
            }
            ValidationFailure::MissingContentPatterns { patterns } => {
                write!(
                    f,
                    "Content validation failed - missing patterns: {patterns:?}"
                )
            }
            ValidationFailure::UnexpectedSuccess => {
                f.write_str("Expected failure but conversion succeeded")
            }
            ValidationFailure::NoErrorPatternMatched { patterns } => {
                write!(f, "Missing expected error pattern, tried: {patterns:?}")
            }
            ValidationFailure::InvalidPattern { message } => f.write_str(message),
        }
    }
}

/// Result of validating one converter input
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub name: String,
    pub path: PathBuf,
    pub expect_failure: bool,
    pub passed: bool,
    pub failures: Vec<ValidationFailure>,
    /// Patterns that matched (content patterns or error patterns)
    pub matched_patterns: Vec<String>,
    /// Converter diagnostics shown to the user for rejected inputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converter_message: Option<String>,
}

impl ValidationOutcome {
    fn new(path: &Path, expect_failure: bool) -> Self {
        Self {
            name: display_name(path),
            path: path.to_path_buf(),
            expect_failure,
            passed: false,
            failures: Vec::new(),
            matched_patterns: Vec::new(),
            converter_message: None,
        }
    }

    fn fail(mut self, failure: ValidationFailure) -> Self {
        self.failures.push(failure);
        self.passed = false;
        self
    }

    fn pass(mut self) -> Self {
        self.passed = self.failures.is_empty();
        self
    }
}

/// Aggregated converter validation results
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub timestamp: String,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub success_rate: f64,
    pub cases: Vec<ValidationOutcome>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            success_rate: 0.0,
            cases: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ValidationOutcome) {
        self.total_tests += 1;
        if outcome.passed {
            self.passed_tests += 1;
        } else {
            self.failed_tests += 1;
        }
        self.cases.push(outcome);
        self.success_rate = (self.passed_tests as f64 / self.total_tests as f64) * 100.0;
    }

    pub fn all_passed(&self) -> bool {
        self.total_tests > 0 && self.failed_tests == 0
    }

    /// One `name: reason` line per failure, in corpus order
    pub fn error_details(&self) -> Vec<String> {
        self.cases
            .iter()
            .flat_map(|case| {
                case.failures
                    .iter()
                    .map(move |failure| format!("{}: {}", case.name, failure))
            })
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# CSV2RDL Validation Report\n\n");
        md.push_str(&format!("**Generated**: {}\n\n", self.timestamp));
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Total Tests**: {}\n", self.total_tests));
        md.push_str(&format!("- **Passed**: {}\n", self.passed_tests));
        md.push_str(&format!("- **Failed**: {}\n", self.failed_tests));
        md.push_str(&format!("- **Success Rate**: {:.1}%\n\n", self.success_rate));

        md.push_str("| Test | Expected | Status |\n");
        md.push_str("|------|----------|--------|\n");
        for case in &self.cases {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                case.name,
                if case.expect_failure { "failure" } else { "success" },
                if case.passed { "PASS" } else { "FAIL" }
            ));
        }

        let details = self.error_details();
        if !details.is_empty() {
            md.push_str("\n## Error Details\n\n");
            for (i, detail) in details.iter().enumerate() {
                md.push_str(&format!("{}. {}\n", i + 1, detail));
            }
        }
        md
    }

    pub fn save(&self, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir).map_err(|e| ParityError::io_error(output_dir, e))?;

        let json_path = output_dir.join(JSON_REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&json_path, json).map_err(|e| ParityError::io_error(&json_path, e))?;

        let md_path = output_dir.join(MARKDOWN_REPORT_FILE);
        std::fs::write(&md_path, self.to_markdown())
            .map_err(|e| ParityError::io_error(&md_path, e))?;
        Ok(())
    }
}

/// Progress callback invoked after each validated input: `(index, total, outcome)`
pub type ValidationProgressCallback = Arc<dyn Fn(usize, usize, &ValidationOutcome) + Send + Sync>;

/// Drives the converter and parser over a CSV corpus
pub struct ConversionValidator {
    converter: Tool,
    parser: Tool,
    overrides: Vec<CasePatterns>,
    work_dir: TempDir,
    progress: Option<ValidationProgressCallback>,
}

impl ConversionValidator {
    pub fn new(converter: Tool, parser: Tool, overrides: Vec<CasePatterns>) -> Result<Self> {
        for case in &overrides {
            let mode = PatternMode::for_case(is_failure_case_name(Path::new(&case.file)));
            for pattern in &case.patterns {
                mode.compile(pattern)?;
            }
        }

        let work_dir = tempfile::Builder::new()
            .prefix("csv2rdl_test_")
            .tempdir()
            .map_err(|e| ParityError::io_error(std::env::temp_dir(), e))?;
        debug!("Using temporary directory: {}", work_dir.path().display());

        Ok(Self {
            converter,
            parser,
            overrides,
            work_dir,
            progress: None,
        })
    }

    /// Resolve converter and parser from configuration
    pub fn from_config(config: &CsvConfig) -> Result<Self> {
        let converter = Tool::resolve(&config.converter)?;
        let parser = Tool::resolve(&config.parser)?;
        Self::new(converter, parser, config.cases.clone())
    }

    pub fn with_progress(mut self, callback: ValidationProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn converter(&self) -> &Tool {
        &self.converter
    }

    pub fn parser(&self) -> &Tool {
        &self.parser
    }

    /// Directory receiving converted RDL files; removed when the validator drops
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Validate one converter input
    pub async fn validate_file(&self, path: &Path) -> ValidationOutcome {
        let expect_failure = is_failure_case_name(path);
        let mode = PatternMode::for_case(expect_failure);
        let outcome = ValidationOutcome::new(path, expect_failure);

        let patterns = match compile_all(mode, &patterns_for(path, &self.overrides)) {
            Ok(patterns) => patterns,
            Err(e) => {
                return outcome.fail(ValidationFailure::InvalidPattern {
                    message: e.to_string(),
                });
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let output_file = self.work_dir.path().join(format!("{stem}.rdl"));
        let extra = [OsString::from("-o"), output_file.clone().into_os_string()];
        let conversion = self.converter.run(path, &extra).await;

        let outcome = if expect_failure {
            check_rejection(outcome, &conversion, &patterns)
        } else {
            self.check_conversion(outcome, &conversion, &output_file, &patterns)
                .await
        };

        info!(
            "{}: {}",
            outcome.name,
            if outcome.passed { "passed" } else { "failed" }
        );
        outcome
    }

    async fn check_conversion(
        &self,
        outcome: ValidationOutcome,
        conversion: &RunResult,
        output_file: &Path,
        patterns: &[(String, Regex)],
    ) -> ValidationOutcome {
        if !conversion.succeeded() {
            let mut outcome = outcome.fail(ValidationFailure::ConversionFailed {
                stderr: conversion.stderr().trim().to_string(),
            });
            outcome.converter_message = Some(conversion.combined_output().trim().to_string());
            return outcome;
        }

        if !output_file.exists() {
            return outcome.fail(ValidationFailure::OutputMissing {
                path: output_file.to_path_buf(),
            });
        }

        let parse = self.parser.run(output_file, &[]).await;
        if !parse.succeeded() {
            return outcome.fail(ValidationFailure::SyntaxCheckFailed {
                stderr: parse.stderr().trim().to_string(),
            });
        }

        let content = match std::fs::read_to_string(output_file) {
            Ok(content) => content,
            Err(e) => {
                return outcome.fail(ValidationFailure::OutputUnreadable {
                    message: e.to_string(),
                });
            }
        };

        let (matched, missing): (Vec<_>, Vec<_>) = patterns
            .iter()
            .partition(|(_, regex)| regex.is_match(&content));

        let mut outcome = outcome;
        outcome.matched_patterns = matched.into_iter().map(|(p, _)| p.clone()).collect();
        if !missing.is_empty() {
            return outcome.fail(ValidationFailure::MissingContentPatterns {
                patterns: missing.into_iter().map(|(p, _)| p.clone()).collect(),
            });
        }
        outcome.pass()
    }

    /// Validate every input in order
    pub async fn run(&self, inputs: &[PathBuf]) -> ValidationReport {
        let mut report = ValidationReport::new();
        let total = inputs.len();

        for (i, path) in inputs.iter().enumerate() {
            let outcome = self.validate_file(path).await;
            if let Some(progress) = &self.progress {
                progress(i + 1, total, &outcome);
            }
            report.record(outcome);
        }

        report
    }
}

fn compile_all(mode: PatternMode, patterns: &[String]) -> Result<Vec<(String, Regex)>> {
    patterns
        .iter()
        .map(|p| mode.compile(p).map(|regex| (p.clone(), regex)))
        .collect()
}

/// An expected-failure input must be rejected and explain why
fn check_rejection(
    mut outcome: ValidationOutcome,
    conversion: &RunResult,
    patterns: &[(String, Regex)],
) -> ValidationOutcome {
    if conversion.succeeded() {
        return outcome.fail(ValidationFailure::UnexpectedSuccess);
    }

    let message = if conversion.stderr().trim().is_empty() {
        conversion.stdout().trim()
    } else {
        conversion.stderr().trim()
    };
    outcome.converter_message = Some(message.to_string());

    let error_output = format!("{}{}", conversion.stderr(), conversion.stdout());
    outcome.matched_patterns = patterns
        .iter()
        .filter(|(_, regex)| regex.is_match(&error_output))
        .map(|(p, _)| p.clone())
        .collect();

    if !patterns.is_empty() && outcome.matched_patterns.is_empty() {
        return outcome.fail(ValidationFailure::NoErrorPatternMatched {
            patterns: patterns.iter().map(|(p, _)| p.clone()).collect(),
        });
    }
    outcome.pass()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn compiled(mode: PatternMode, patterns: &[&str]) -> Vec<(String, Regex)> {
        let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        compile_all(mode, &owned).unwrap()
    }

    #[test]
    fn test_pattern_lookup_order() {
        let overrides = vec![CasePatterns {
            file: "test_csv_basic_example.csv".to_string(),
            patterns: vec!["custom".to_string()],
        }];
        assert_eq!(
            patterns_for(Path::new("t/test_csv_basic_example.csv"), &overrides),
            vec!["custom"]
        );
        assert_eq!(
            patterns_for(Path::new("t/test_csv_basic_example.csv"), &[]).len(),
            8
        );
        assert_eq!(
            patterns_for(Path::new("t/test_csv_other.csv"), &[]),
            DEFAULT_SUCCESS_PATTERNS
        );
        assert_eq!(
            patterns_for(Path::new("t/test_csv_other_fail.csv"), &[]),
            DEFAULT_FAILURE_PATTERNS
        );
    }

    #[test]
    fn test_builtin_patterns_compile() {
        for (file, patterns) in TARGETED_CASES {
            let mode = PatternMode::for_case(is_failure_case_name(Path::new(file)));
            for pattern in *patterns {
                assert!(mode.compile(pattern).is_ok(), "{file}: {pattern}");
            }
        }
        for pattern in DEFAULT_SUCCESS_PATTERNS {
            assert!(PatternMode::RequireAll.compile(pattern).is_ok());
        }
        for pattern in DEFAULT_FAILURE_PATTERNS {
            assert!(PatternMode::RequireAny.compile(pattern).is_ok());
        }
    }

    #[test]
    fn test_default_success_patterns_match_converted_rdl() {
        let rdl = "addrmap DEMO {\n    name = \"DEMO\";\n    reg {\n        name = \"CTRL\";\n    } CTRL @ 0x0;\n};\n";
        let patterns = compiled(PatternMode::RequireAll, DEFAULT_SUCCESS_PATTERNS);
        assert!(patterns.iter().all(|(_, r)| r.is_match(rdl)));
    }

    #[test]
    fn test_content_patterns_span_lines() {
        let rdl = "field {\n  name = \"ENABLE\";\n  sw = rw;\n} ENABLE[0:0];";
        let patterns = compiled(PatternMode::RequireAll, &[r#"field \{[^}]*name = "ENABLE""#]);
        assert!(patterns[0].1.is_match(rdl));
    }

    #[test]
    fn test_rejection_requires_any_pattern() {
        let run = RunResult::completed(
            Some(1),
            "",
            "Error: Line 2 contains mixed information types\n",
            Duration::ZERO,
        );
        let patterns = compiled(
            PatternMode::RequireAny,
            &[r"mixed information types", r"no such phrase"],
        );
        let outcome = check_rejection(
            ValidationOutcome::new(Path::new("test_csv_mixed_types_fail.csv"), true),
            &run,
            &patterns,
        );
        assert!(outcome.passed);
        assert_eq!(outcome.matched_patterns, vec!["mixed information types"]);
        assert_eq!(
            outcome.converter_message.as_deref(),
            Some("Error: Line 2 contains mixed information types")
        );
    }

    #[test]
    fn test_rejection_with_no_matching_pattern_fails() {
        let run = RunResult::completed(Some(1), "something odd", "", Duration::ZERO);
        let patterns = compiled(PatternMode::RequireAny, DEFAULT_FAILURE_PATTERNS);
        let outcome = check_rejection(
            ValidationOutcome::new(Path::new("x_fail.csv"), true),
            &run,
            &patterns,
        );
        assert!(!outcome.passed);
        assert!(matches!(
            outcome.failures[0],
            ValidationFailure::NoErrorPatternMatched { .. }
        ));
    }

    #[test]
    fn test_error_patterns_are_case_insensitive() {
        let run = RunResult::completed(Some(1), "", "FAILED at LINE 4", Duration::ZERO);
        let patterns = compiled(PatternMode::RequireAny, &[r"line \d+"]);
        let outcome = check_rejection(
            ValidationOutcome::new(Path::new("x_fail.csv"), true),
            &run,
            &patterns,
        );
        assert!(outcome.passed);
    }

    #[test]
    fn test_unexpected_success() {
        let run = RunResult::completed(Some(0), "", "", Duration::ZERO);
        let outcome = check_rejection(
            ValidationOutcome::new(Path::new("x_fail.csv"), true),
            &run,
            &[],
        );
        assert_eq!(outcome.failures, vec![ValidationFailure::UnexpectedSuccess]);
    }

    #[test]
    fn test_report_statistics_and_details() {
        let mut report = ValidationReport::new();
        assert_eq!(report.success_rate, 0.0);
        assert!(!report.all_passed());

        report.record(ValidationOutcome::new(Path::new("a.csv"), false).pass());
        report.record(
            ValidationOutcome::new(Path::new("b_fail.csv"), true)
                .fail(ValidationFailure::UnexpectedSuccess),
        );

        assert_eq!(report.total_tests, 2);
        assert_eq!(report.passed_tests, 1);
        assert_eq!(report.success_rate, 50.0);
        assert!(!report.all_passed());
        assert_eq!(
            report.error_details(),
            vec!["b_fail.csv: Expected failure but conversion succeeded"]
        );
        assert!(report.to_markdown().contains("1. b_fail.csv"));
    }

    #[test]
    fn test_invalid_override_is_rejected_up_front() {
        let overrides = vec![CasePatterns {
            file: "test_csv_x.csv".to_string(),
            patterns: vec!["(".to_string()],
        }];
        let tool = Tool::from_spec(&crate::config::ToolSpec::new("t", "t"));
        let err = ConversionValidator::new(tool.clone(), tool, overrides)
            .err()
            .unwrap();
        assert!(matches!(err, ParityError::InvalidPattern { .. }));
    }
}
