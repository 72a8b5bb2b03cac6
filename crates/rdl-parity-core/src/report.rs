//! Comparison report
//!
//! Accumulates classified cases into one ordered list per [`Outcome`] and
//! keeps the running compatibility statistics. The report is owned by the
//! caller of [`Comparator::run`](crate::compare::Comparator::run) and is
//! read-only once the corpus loop has finished.

use crate::compare::CaseOutcome;
use crate::error::ParityError;
use crate::outcome::Outcome;
use crate::result::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const JSON_REPORT_FILE: &str = "comparison_report.json";
pub const MARKDOWN_REPORT_FILE: &str = "comparison_report.md";

/// Observations drawn from the outcome distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    /// Some inputs pass only under tool A
    ToolAMorePermissive,
    /// Some inputs pass only under tool B
    ToolBMorePermissive,
    /// Some inputs fail under both tools for unrelated reasons
    ErrorMessageDifferences,
}

/// Outcome-bucketed results of one comparison session
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub tool_a: String,
    pub tool_b: String,
    pub timestamp: String,
    pub total_tests: usize,
    /// `both_pass` plus `both_fail_similar`
    pub compatible_tests: usize,
    pub compatibility_percent: f64,
    categories: BTreeMap<Outcome, Vec<CaseOutcome>>,
}

impl ComparisonReport {
    pub fn new(tool_a: impl Into<String>, tool_b: impl Into<String>) -> Self {
        Self {
            tool_a: tool_a.into(),
            tool_b: tool_b.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_tests: 0,
            compatible_tests: 0,
            compatibility_percent: 0.0,
            categories: Outcome::ALL.into_iter().map(|o| (o, Vec::new())).collect(),
        }
    }

    /// Append a case to its outcome's list
    pub fn record(&mut self, case: CaseOutcome) {
        self.total_tests += 1;
        if case.outcome.is_compatible() {
            self.compatible_tests += 1;
        }
        self.categories.entry(case.outcome).or_default().push(case);
        self.update_compatibility();
    }

    fn update_compatibility(&mut self) {
        self.compatibility_percent = if self.total_tests > 0 {
            (self.compatible_tests as f64 / self.total_tests as f64) * 100.0
        } else {
            0.0
        };
    }

    /// Cases with this outcome, in corpus order
    pub fn cases(&self, outcome: Outcome) -> &[CaseOutcome] {
        self.categories
            .get(&outcome)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.cases(outcome).len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_tests == 0
    }

    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        if self.count(Outcome::ToolAOnlyPass) > 0 {
            findings.push(Finding::ToolAMorePermissive);
        }
        if self.count(Outcome::ToolBOnlyPass) > 0 {
            findings.push(Finding::ToolBMorePermissive);
        }
        if self.count(Outcome::BothFailDifferent) > 0 {
            findings.push(Finding::ErrorMessageDifferences);
        }
        findings
    }

    pub fn describe_finding(&self, finding: Finding) -> String {
        match finding {
            Finding::ToolAMorePermissive => {
                format!("{} implementation may be more permissive", self.tool_a)
            }
            Finding::ToolBMorePermissive => {
                format!("{} implementation may be more permissive", self.tool_b)
            }
            Finding::ErrorMessageDifferences => "Error message differences detected".to_string(),
        }
    }

    /// Generate markdown report
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Implementation Comparison Report\n\n");
        md.push_str(&format!("**Generated**: {}\n\n", self.timestamp));
        md.push_str(&format!("**Tool A**: {}\n", self.tool_a));
        md.push_str(&format!("**Tool B**: {}\n\n", self.tool_b));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Total files tested**: {}\n", self.total_tests));
        for outcome in Outcome::ALL {
            md.push_str(&format!("- **{}**: {}\n", outcome, self.count(outcome)));
        }
        md.push_str(&format!(
            "- **Compatibility**: {}/{} ({:.1}%)\n\n",
            self.compatible_tests, self.total_tests, self.compatibility_percent
        ));

        for outcome in Outcome::ALL {
            let cases = self.cases(outcome);
            if cases.is_empty() {
                continue;
            }
            md.push_str(&format!("## {} ({})\n\n", outcome, cases.len()));
            for case in cases {
                md.push_str(&format!("- {}\n", case.name));
                match outcome {
                    Outcome::ToolAOnlyPass => {
                        if let Some(error) = case.tool_b.first_error() {
                            md.push_str(&format!("  - {} error: {}\n", self.tool_b, error));
                        }
                    }
                    Outcome::ToolBOnlyPass => {
                        if let Some(error) = case.tool_a.first_error() {
                            md.push_str(&format!("  - {} error: {}\n", self.tool_a, error));
                        }
                    }
                    Outcome::BothFailDifferent => {
                        md.push_str(&format!(
                            "  - {} {}: {}\n",
                            self.tool_a,
                            case.tool_a.concepts,
                            join_errors(case.tool_a.errors.iter())
                        ));
                        md.push_str(&format!(
                            "  - {} {}: {}\n",
                            self.tool_b,
                            case.tool_b.concepts,
                            join_errors(case.tool_b.errors.iter())
                        ));
                    }
                    Outcome::BothPass | Outcome::BothFailSimilar => {}
                }
            }
            md.push('\n');
        }

        let findings = self.findings();
        if !findings.is_empty() {
            md.push_str("## Analysis\n\n");
            for finding in findings {
                md.push_str(&format!("- {}\n", self.describe_finding(finding)));
            }
        }

        md
    }

    /// Save JSON and markdown reports into `output_dir`
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

/// Render a list of diagnostics as `[a; b]`
pub fn join_errors<'a, I, T>(errors: I) -> String
where
    I: IntoIterator<Item = &'a T>,
    T: std::fmt::Display + 'a,
{
    let parts: Vec<String> = errors.into_iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join("; "))
}
