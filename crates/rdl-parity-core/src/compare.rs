//! Dual-implementation comparison
//!
//! For each input: detect the expectation, run tool A then tool B, invert both
//! verdicts if the input is expected to fail, extract and classify
//! diagnostics, and assign an [`Outcome`]. Results are accumulated into a
//! caller-visible [`ComparisonReport`] in input order.

use crate::concepts::{ConceptRegistry, ConceptSet};
use crate::config::CompareConfig;
use crate::discovery::display_name;
use crate::expectation;
use crate::extract::ErrorRecord;
use crate::outcome::{self, Outcome, SideEvidence};
use crate::report::ComparisonReport;
use crate::result::Result;
use crate::runner::{RunResult, Tool};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One tool's side of a compared input
#[derive(Debug, Clone, Serialize)]
pub struct ToolVerdict {
    /// Exit status was zero
    pub raw_success: bool,
    /// Success after expectation inversion
    pub verdict: bool,
    pub errors: Vec<ErrorRecord>,
    pub concepts: ConceptSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub duration_ms: u64,
}

impl ToolVerdict {
    fn from_run(run: &RunResult, expect_failure: bool, registry: &ConceptRegistry) -> Self {
        let errors = run.diagnostic_messages();
        let concepts = registry.classify(&errors);
        Self {
            raw_success: run.succeeded(),
            verdict: outcome::effective_verdict(run.succeeded(), expect_failure),
            errors,
            concepts,
            failure: run.failure().map(ToString::to_string),
            duration_ms: run.duration().as_millis() as u64,
        }
    }

    fn evidence(&self) -> SideEvidence<'_> {
        SideEvidence::new(self.verdict, self.errors.len(), &self.concepts)
    }

    /// First extracted diagnostic, if any
    pub fn first_error(&self) -> Option<&ErrorRecord> {
        self.errors.first()
    }
}

/// The classified result of comparing both tools on one input
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    pub path: PathBuf,
    pub expect_failure: bool,
    pub outcome: Outcome,
    pub tool_a: ToolVerdict,
    pub tool_b: ToolVerdict,
}

/// Classify one input from both tools' raw runs
pub fn compare_runs(
    path: &Path,
    expect_failure: bool,
    run_a: &RunResult,
    run_b: &RunResult,
    registry: &ConceptRegistry,
) -> CaseOutcome {
    let tool_a = ToolVerdict::from_run(run_a, expect_failure, registry);
    let tool_b = ToolVerdict::from_run(run_b, expect_failure, registry);
    let outcome = outcome::classify(tool_a.evidence(), tool_b.evidence());

    CaseOutcome {
        name: display_name(path),
        path: path.to_path_buf(),
        expect_failure,
        outcome,
        tool_a,
        tool_b,
    }
}

/// Progress information handed to a [`ProgressCallback`]
#[derive(Debug, Clone, Copy)]
pub struct CaseProgress<'a> {
    /// 1-based position in the corpus
    pub index: usize,
    pub total: usize,
    pub case: &'a CaseOutcome,
}

/// Progress callback, invoked once per case in corpus order
pub type ProgressCallback = Arc<dyn Fn(CaseProgress<'_>) + Send + Sync>;

/// Runs both tools over a corpus and aggregates the outcomes
pub struct Comparator {
    tool_a: Tool,
    tool_b: Tool,
    registry: ConceptRegistry,
    jobs: usize,
    progress: Option<ProgressCallback>,
}

impl Comparator {
    pub fn new(tool_a: Tool, tool_b: Tool, registry: ConceptRegistry) -> Self {
        Self {
            tool_a,
            tool_b,
            registry,
            jobs: 1,
            progress: None,
        }
    }

    /// Resolve both tools and build the concept registry from configuration
    pub fn from_config(config: &CompareConfig) -> Result<Self> {
        let tool_a = Tool::resolve(&config.tool_a)?;
        let tool_b = Tool::resolve(&config.tool_b)?;
        let registry = ConceptRegistry::from_config(&config.concepts)?;
        Ok(Self::new(tool_a, tool_b, registry).with_jobs(config.jobs))
    }

    /// Number of inputs processed concurrently; results keep input order
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn tool_a(&self) -> &Tool {
        &self.tool_a
    }

    pub fn tool_b(&self) -> &Tool {
        &self.tool_b
    }

    /// Compare both tools on one input; tool A always runs before tool B
    pub async fn compare_file(&self, path: &Path) -> CaseOutcome {
        let expect_failure = expectation::detect(path);
        debug!(
            "{}: expecting {}",
            path.display(),
            if expect_failure { "failure" } else { "success" }
        );

        let run_a = self.tool_a.run(path, &[]).await;
        let run_b = self.tool_b.run(path, &[]).await;
        let case = compare_runs(path, expect_failure, &run_a, &run_b, &self.registry);
        debug!(
            "{}: extracted {} diagnostics from {}, {} from {}",
            case.name,
            case.tool_a.errors.len(),
            self.tool_a.name(),
            case.tool_b.errors.len(),
            self.tool_b.name()
        );

        info!("{}: {}", case.name, case.outcome);
        case
    }

    /// Compare every input and aggregate the outcomes in input order
    pub async fn run(&self, inputs: &[PathBuf]) -> ComparisonReport {
        let mut report = ComparisonReport::new(self.tool_a.name(), self.tool_b.name());
        let total = inputs.len();

        let mut cases = std::pin::pin!(
            stream::iter(inputs)
                .map(|path| self.compare_file(path))
                .buffered(self.jobs)
        );

        let mut index = 0;
        while let Some(case) = cases.next().await {
            index += 1;
            if let Some(progress) = &self.progress {
                progress(CaseProgress {
                    index,
                    total,
                    case: &case,
                });
            }
            report.record(case);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::ConceptTag;
    use std::time::Duration;

    fn run(code: i32, output: &str) -> RunResult {
        RunResult::completed(Some(code), output, "", Duration::ZERO)
    }

    fn compare(expect_failure: bool, a: &RunResult, b: &RunResult) -> CaseOutcome {
        compare_runs(
            Path::new("test/case.rdl"),
            expect_failure,
            a,
            b,
            &ConceptRegistry::builtin(),
        )
    }

    #[test]
    fn test_both_exit_zero_is_both_pass() {
        let case = compare(false, &run(0, ""), &run(0, ""));
        assert_eq!(case.outcome, Outcome::BothPass);
        assert_eq!(case.name, "case.rdl");
    }

    #[test]
    fn test_differently_worded_overlaps_are_similar() {
        let case = compare(
            false,
            &run(1, "Line 5 - Field overlap detected\n"),
            &run(1, "file.rdl:5:3: field X overlaps with field Y\n"),
        );

        assert_eq!(
            case.tool_a.errors,
            vec![ErrorRecord::new("Field overlap detected")]
        );
        assert_eq!(
            case.tool_b.errors,
            vec![ErrorRecord::new("field X overlaps with field Y")]
        );
        assert!(case.tool_a.concepts.contains(&ConceptTag::OVERLAP));
        assert!(case.tool_b.concepts.contains(&ConceptTag::OVERLAP));
        assert_eq!(case.outcome, Outcome::BothFailSimilar);
    }

    #[test]
    fn test_only_tool_b_failing_is_tool_a_only_pass() {
        let case = compare(false, &run(0, ""), &run(1, "error: field exceeds width"));
        assert_eq!(case.outcome, Outcome::ToolAOnlyPass);
        assert_eq!(
            case.tool_b.first_error(),
            Some(&ErrorRecord::new("error: field exceeds width"))
        );
    }

    #[test]
    fn test_only_tool_a_failing_is_tool_b_only_pass() {
        let case = compare(false, &run(1, "error: something"), &run(0, ""));
        assert_eq!(case.outcome, Outcome::ToolBOnlyPass);
    }

    #[test]
    fn test_expected_failure_inverts_both_verdicts() {
        let case = compare(true, &run(1, "error: a"), &run(1, "error: b"));
        assert!(!case.tool_a.raw_success);
        assert!(case.tool_a.verdict);
        assert!(case.tool_b.verdict);
        assert_eq!(case.outcome, Outcome::BothPass);

        let case = compare(true, &run(0, ""), &run(0, ""));
        assert_eq!(case.outcome, Outcome::BothFailSimilar);

        let case = compare(true, &run(1, "error: a"), &run(0, ""));
        assert_eq!(case.outcome, Outcome::ToolAOnlyPass);
    }

    #[test]
    fn test_silent_failure_against_tagged_failure_is_different() {
        let case = compare(
            false,
            &run(2, ""),
            &run(
                1,
                "a.rdl:1:1: error: fields overlap\na.rdl:2:1: error: field exceeds width\n",
            ),
        );
        assert!(case.tool_a.errors.is_empty());
        assert_eq!(case.tool_b.errors.len(), 2);
        assert_eq!(case.outcome, Outcome::BothFailDifferent);
    }

    #[test]
    fn test_silent_failure_against_untagged_failure_is_different() {
        let case = compare(
            false,
            &run(2, ""),
            &run(1, "x.rdl:3:1: error: unexpected token\nerror: bad\n"),
        );
        assert!(case.tool_a.errors.is_empty());
        assert_eq!(case.tool_b.errors.len(), 2);
        assert!(case.tool_b.concepts.is_empty());
        assert_eq!(case.outcome, Outcome::BothFailDifferent);
        assert!(!case.outcome.is_compatible());
    }

    #[test]
    fn test_untagged_failures_on_both_sides_are_similar() {
        let case = compare(
            false,
            &run(1, "error: syntax error near '}'"),
            &run(1, "x.rdl:3:1: error: unexpected token"),
        );
        assert_eq!(case.outcome, Outcome::BothFailSimilar);
    }

    #[test]
    fn test_failure_reason_is_recorded() {
        let case = compare(false, &run(3, ""), &run(0, ""));
        assert_eq!(case.tool_a.failure.as_deref(), Some("exited with status 3"));
        assert!(case.tool_b.failure.is_none());
    }
}
