//! Outcome taxonomy and the decision table that assigns it

use crate::concepts::ConceptSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exactly one of these is assigned to every compared input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    BothPass,
    BothFailSimilar,
    BothFailDifferent,
    ToolAOnlyPass,
    ToolBOnlyPass,
}

impl Outcome {
    /// Every outcome, in report order
    pub const ALL: [Outcome; 5] = [
        Outcome::BothPass,
        Outcome::BothFailSimilar,
        Outcome::BothFailDifferent,
        Outcome::ToolAOnlyPass,
        Outcome::ToolBOnlyPass,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::BothPass => "both_pass",
            Outcome::BothFailSimilar => "both_fail_similar",
            Outcome::BothFailDifferent => "both_fail_different",
            Outcome::ToolAOnlyPass => "tool_a_only_pass",
            Outcome::ToolBOnlyPass => "tool_b_only_pass",
        }
    }

    /// Outcomes where the two tools agree
    pub fn is_compatible(self) -> bool {
        matches!(self, Outcome::BothPass | Outcome::BothFailSimilar)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply expectation inversion to a raw verdict
///
/// Callers must apply the same `expect_failure` to both tools.
pub fn effective_verdict(raw_success: bool, expect_failure: bool) -> bool {
    raw_success != expect_failure
}

/// What one tool contributed to an input, after expectation inversion
#[derive(Debug, Clone, Copy)]
pub struct SideEvidence<'a> {
    pub verdict: bool,
    /// Number of extracted diagnostics
    pub diagnostics: usize,
    pub concepts: &'a ConceptSet,
}

impl<'a> SideEvidence<'a> {
    pub fn new(verdict: bool, diagnostics: usize, concepts: &'a ConceptSet) -> Self {
        Self {
            verdict,
            diagnostics,
            concepts,
        }
    }
}

/// Whether two failing sides failed for the same reason
///
/// A side with no diagnostics never matches a side that has some, whatever
/// their concept sets.
pub fn failures_similar(a: &SideEvidence<'_>, b: &SideEvidence<'_>) -> bool {
    if (a.diagnostics == 0) != (b.diagnostics == 0) {
        return false;
    }
    a.concepts.is_similar_to(b.concepts)
}

/// Decision table over already-inverted verdicts; first matching row wins
pub fn classify(a: SideEvidence<'_>, b: SideEvidence<'_>) -> Outcome {
    match (a.verdict, b.verdict) {
        (true, true) => Outcome::BothPass,
        (false, false) if failures_similar(&a, &b) => Outcome::BothFailSimilar,
        (false, false) => Outcome::BothFailDifferent,
        (true, false) => Outcome::ToolAOnlyPass,
        (false, true) => Outcome::ToolBOnlyPass,
    }
}
