//! Console narration and summaries
//!
//! Everything here goes to stdout; tracing output stays on stderr.

use colored::*;
use rdl_parity_core::compare::ToolVerdict;
use rdl_parity_core::report::join_errors;
use rdl_parity_core::{
    CaseProgress, ComparisonReport, CsvConfig, Outcome, ValidationFailure, ValidationOutcome,
    ValidationReport,
};
use std::path::Path;

const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 60;

pub fn print_fatal(err: &anyhow::Error) {
    println!("{} {}", "❌".red(), err.to_string().red());
}

pub fn print_compare_header(file_count: usize) {
    println!("🎯 Found {} RDL files for comparison", file_count);
    println!("{}", "=".repeat(WIDE_RULE));
}

fn pass_fail(passed: bool) -> ColoredString {
    if passed {
        "✅ PASS".green()
    } else {
        "❌ FAIL".red()
    }
}

/// Narrate one compared input
pub fn print_case(progress: &CaseProgress<'_>, tool_a: &str, tool_b: &str, verbose_errors: bool) {
    let case = progress.case;

    println!(
        "\n📁 Testing: {} {}",
        case.name.bold(),
        format!("[{}/{}]", progress.index, progress.total).dimmed()
    );
    if case.expect_failure {
        println!("   🎯 Expected: FAILURE (validation test)");
    } else {
        println!("   🎯 Expected: SUCCESS");
    }

    println!("   🔧 {} Result: {}", tool_a, pass_fail(case.tool_a.raw_success));
    println!("   🔧 {} Result: {}", tool_b, pass_fail(case.tool_b.raw_success));
    if case.expect_failure {
        println!("   🎯 {} Validation: {}", tool_a, pass_fail(case.tool_a.verdict));
        println!("   🎯 {} Validation: {}", tool_b, pass_fail(case.tool_b.verdict));
    }

    match case.outcome {
        Outcome::BothPass => println!("   📊 Status: {}", "BOTH PASS ✅".green()),
        Outcome::BothFailSimilar => {
            println!("   📊 Status: {}", "BOTH FAIL (similar errors) ⚠️".yellow());
        }
        Outcome::BothFailDifferent => {
            println!("   📊 Status: {}", "BOTH FAIL (different errors) ⚠️".yellow());
            println!("      {} errors: {}", tool_a, join_errors(&case.tool_a.errors));
            println!("      {} errors: {}", tool_b, join_errors(&case.tool_b.errors));
        }
        Outcome::ToolAOnlyPass => {
            println!(
                "   📊 Status: {}",
                format!("{tool_a} PASS, {tool_b} FAIL ⚠️").yellow()
            );
            println!("      {} error: {}", tool_b, join_errors(&case.tool_b.errors));
        }
        Outcome::ToolBOnlyPass => {
            println!(
                "   📊 Status: {}",
                format!("{tool_b} PASS, {tool_a} FAIL ⚠️").yellow()
            );
            println!("      {} error: {}", tool_a, join_errors(&case.tool_a.errors));
        }
    }

    if verbose_errors {
        print_verdict_details(tool_a, &case.tool_a);
        print_verdict_details(tool_b, &case.tool_b);
    }
}

fn print_verdict_details(tool: &str, verdict: &ToolVerdict) {
    let reason = verdict.failure.as_deref().unwrap_or("exited with status 0");
    println!(
        "      {} {} in {}ms, concepts {}",
        tool.dimmed(),
        reason.dimmed(),
        verdict.duration_ms,
        verdict.concepts
    );
    for error in &verdict.errors {
        println!("        - {}", error);
    }
}

pub fn print_comparison_summary(report: &ComparisonReport) {
    println!("\n{}", "=".repeat(WIDE_RULE));
    println!("{}", "📊 COMPARISON SUMMARY".bold());
    println!("{}", "=".repeat(WIDE_RULE));

    println!("📁 Total files tested: {}", report.total_tests);
    println!(
        "✅ Both implementations pass: {}",
        report.count(Outcome::BothPass)
    );
    println!(
        "⚠️  Both implementations fail (similar): {}",
        report.count(Outcome::BothFailSimilar)
    );
    println!(
        "⚠️  Both implementations fail (different): {}",
        report.count(Outcome::BothFailDifferent)
    );
    println!(
        "🔧 {} only passes: {}",
        report.tool_a,
        report.count(Outcome::ToolAOnlyPass)
    );
    println!(
        "🔧 {} only passes: {}",
        report.tool_b,
        report.count(Outcome::ToolBOnlyPass)
    );

    let both_pass = report.cases(Outcome::BothPass);
    if !both_pass.is_empty() {
        println!("\n{}", format!("✅ BOTH PASS ({}):", both_pass.len()).green());
        for case in both_pass {
            println!("   - {}", case.name);
        }
    }

    let a_only = report.cases(Outcome::ToolAOnlyPass);
    if !a_only.is_empty() {
        let heading = format!("🔧 {} ONLY PASS ({}):", report.tool_a.to_uppercase(), a_only.len());
        println!("\n{}", heading.yellow());
        for case in a_only {
            println!("   - {}", case.name);
            if let Some(error) = case.tool_b.first_error() {
                println!("     {} error: {}", report.tool_b, error);
            }
        }
    }

    let b_only = report.cases(Outcome::ToolBOnlyPass);
    if !b_only.is_empty() {
        let heading = format!("🔧 {} ONLY PASS ({}):", report.tool_b.to_uppercase(), b_only.len());
        println!("\n{}", heading.yellow());
        for case in b_only {
            println!("   - {}", case.name);
            if let Some(error) = case.tool_a.first_error() {
                println!("     {} error: {}", report.tool_a, error);
            }
        }
    }

    let different = report.cases(Outcome::BothFailDifferent);
    if !different.is_empty() {
        println!(
            "\n{}",
            format!("⚠️  DIFFERENT ERROR TYPES ({}):", different.len()).yellow()
        );
        for case in different {
            println!("   - {}", case.name);
            println!("     {}: {}", report.tool_a, join_errors(&case.tool_a.errors));
            println!("     {}: {}", report.tool_b, join_errors(&case.tool_b.errors));
        }
    }

    println!("\n{}", "🔍 ANALYSIS:".bold());
    println!(
        "   📈 Compatibility: {}/{} ({:.1}%)",
        report.compatible_tests, report.total_tests, report.compatibility_percent
    );
    for finding in report.findings() {
        println!("   ⚠️  {}", report.describe_finding(finding));
    }
}

pub fn print_report_saved(dir: &Path) {
    println!("\n📝 Reports written to {}", dir.display());
}

pub fn print_csv_header(config: &CsvConfig) {
    println!("{}", "🚀 Starting CSV2RDL Validation Suite".bold());
    println!("{}", "=".repeat(NARROW_RULE));
    println!("📂 Test directory: {}", config.test_dir.display());
    println!(
        "🔧 {} binary: {}",
        config.converter.name,
        config.converter.program.display()
    );
    println!(
        "🔧 {} binary: {}",
        config.parser.name,
        config.parser.program.display()
    );
}

pub fn print_csv_inventory(total: usize, expected_failures: usize) {
    println!("🔍 Found {} CSV test files", total);
    println!("   📗 Success test files: {}", total - expected_failures);
    println!("   📕 Failure test files: {}", expected_failures);
}

pub fn print_work_dir(dir: &Path) {
    println!("📁 Using temporary directory: {}", dir.display());
}

/// Narrate one converter input
pub fn print_validation_case(outcome: &ValidationOutcome) {
    if outcome.expect_failure {
        println!(
            "\n🧪 Testing: {} (Expected: ❌ FAILURE)",
            outcome.name.bold()
        );
        print_rejection_steps(outcome);
    } else {
        println!(
            "\n🧪 Testing: {} (Expected: ✅ SUCCESS)",
            outcome.name.bold()
        );
        print_conversion_steps(outcome);
    }

    if outcome.passed {
        let suffix = if outcome.expect_failure {
            " (failed as expected)"
        } else {
            ""
        };
        println!("   🎉 {}", format!("{} PASSED{}", outcome.name, suffix).green());
    }
}

fn print_conversion_steps(outcome: &ValidationOutcome) {
    let Some(failure) = outcome.failures.first() else {
        println!("   ✅ CSV2RDL conversion successful");
        println!("   ✅ RDL syntax validation passed");
        println!(
            "   ✅ Content validation passed ({} patterns)",
            outcome.matched_patterns.len()
        );
        return;
    };

    match failure {
        ValidationFailure::ConversionFailed { .. } => {
            println!("   {}", "❌ CSV2RDL conversion failed (unexpected)".red());
            if let Some(message) = &outcome.converter_message {
                println!("      {}", message);
            }
        }
        ValidationFailure::OutputMissing { .. } => {
            println!("   ❌ {}", failure.to_string().red());
        }
        ValidationFailure::SyntaxCheckFailed { stderr } => {
            println!("   ✅ CSV2RDL conversion successful");
            println!("   {}", "❌ RDL syntax validation failed".red());
            println!("      stderr: {}", stderr);
        }
        ValidationFailure::MissingContentPatterns { patterns } => {
            println!("   ✅ CSV2RDL conversion successful");
            println!("   ✅ RDL syntax validation passed");
            println!("   {}", "❌ Content validation failed".red());
            println!("      Missing patterns: {:?}", patterns);
        }
        other => println!("   ❌ {}", other.to_string().red()),
    }
}

fn print_rejection_steps(outcome: &ValidationOutcome) {
    if outcome.failures.contains(&ValidationFailure::UnexpectedSuccess) {
        println!("   {}", "❌ CSV2RDL conversion succeeded (unexpected)".red());
        println!("      Expected failure but got success");
        return;
    }

    println!("   ✅ CSV2RDL conversion failed as expected");
    if let Some(message) = &outcome.converter_message {
        println!("   Error: {}", message);
    }
    for pattern in &outcome.matched_patterns {
        println!("   ✅ Found expected error pattern: {}", pattern);
    }
    for failure in &outcome.failures {
        println!("   ❌ {}", failure.to_string().red());
    }
}

pub fn print_validation_summary(report: &ValidationReport) {
    println!("\n{}", "=".repeat(NARROW_RULE));
    println!("{}", "📊 VALIDATION SUMMARY".bold());
    println!("{}", "=".repeat(NARROW_RULE));
    println!("Total Tests: {}", report.total_tests);
    println!("✅ Passed: {}", report.passed_tests);
    println!("❌ Failed: {}", report.failed_tests);

    let details = report.error_details();
    if !details.is_empty() {
        println!("\n🔍 Error Details:");
        for (i, detail) in details.iter().enumerate() {
            println!("  {}. {}", i + 1, detail);
        }
    }

    println!("\n📈 Success Rate: {:.1}%", report.success_rate);
    if report.all_passed() {
        println!("{}", "🎉 All tests passed!".green());
    } else {
        println!(
            "{}",
            "🚨 Some tests failed - please review the errors above".red()
        );
    }
}

pub fn print_exit_status(success: bool) {
    println!("\n🏁 Exiting with code {}", if success { 0 } else { 1 });
}
