//! Command implementations for the RDL parity CLI

use crate::output;
use crate::{CompareArgs, CsvArgs};
use anyhow::{Context, Result};
use rdl_parity_core::expectation::is_failure_case_name;
use rdl_parity_core::{
    CaseProgress, Comparator, CompareConfig, ConfigLoader, ConversionValidator, CsvConfig,
    ValidationOutcome, discover_inputs,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

/// Run both elaborators over the corpus and print the comparison
///
/// The exit status reflects session health only: disagreement between the
/// tools is reported, never turned into a failure.
pub async fn compare_command(args: CompareArgs, config_path: Option<PathBuf>) -> Result<ExitCode> {
    let mut config = ConfigLoader::load(config_path.as_deref(), None)?.compare;
    apply_compare_overrides(&mut config, &args);
    debug!("Comparison config: {:?}", config);

    let inputs = discover_inputs(&config.test_dir, &config.input_pattern)?;
    output::print_compare_header(inputs.len());

    let tool_a = config.tool_a.name.clone();
    let tool_b = config.tool_b.name.clone();
    let verbose_errors = args.verbose_errors;
    let comparator = Comparator::from_config(&config)?.with_progress(Arc::new(
        move |progress: CaseProgress<'_>| {
            output::print_case(&progress, &tool_a, &tool_b, verbose_errors);
        },
    ));

    let report = comparator.run(&inputs).await;
    info!(
        "Compared {} files, {:.1}% compatible",
        report.total_tests, report.compatibility_percent
    );
    output::print_comparison_summary(&report);

    if let Some(dir) = &args.report_dir {
        report
            .save(dir)
            .with_context(|| format!("Failed to save comparison report to {}", dir.display()))?;
        output::print_report_saved(dir);
    }

    Ok(ExitCode::SUCCESS)
}

/// Validate the CSV-to-RDL converter; any failing case fails the session
pub async fn csv_command(args: CsvArgs, config_path: Option<PathBuf>) -> Result<ExitCode> {
    let mut config = ConfigLoader::load(config_path.as_deref(), None)?.csv;
    apply_csv_overrides(&mut config, &args);
    debug!("Converter validation config: {:?}", config);

    output::print_csv_header(&config);

    let inputs = discover_inputs(&config.test_dir, &config.input_pattern)?;
    let expected_failures = inputs.iter().filter(|p| is_failure_case_name(p)).count();
    output::print_csv_inventory(inputs.len(), expected_failures);

    let validator = ConversionValidator::from_config(&config)?.with_progress(Arc::new(
        |_index: usize, _total: usize, outcome: &ValidationOutcome| {
            output::print_validation_case(outcome);
        },
    ));
    output::print_work_dir(validator.work_dir());

    let report = validator.run(&inputs).await;
    output::print_validation_summary(&report);

    if let Some(dir) = &args.report_dir {
        report
            .save(dir)
            .with_context(|| format!("Failed to save validation report to {}", dir.display()))?;
        output::print_report_saved(dir);
    }

    let status = if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };
    output::print_exit_status(report.all_passed());
    Ok(status)
}

fn apply_compare_overrides(config: &mut CompareConfig, args: &CompareArgs) {
    if let Some(dir) = &args.test_dir {
        config.test_dir = dir.clone();
    }
    if let Some(program) = &args.tool_a {
        config.tool_a.program = program.clone();
        config.tool_a.script = None;
    }
    if let Some(program) = &args.tool_b {
        config.tool_b.program = program.clone();
        config.tool_b.script = None;
    }
    if let Some(secs) = args.timeout {
        config.tool_a.timeout_secs = secs;
        config.tool_b.timeout_secs = secs;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = usize::try_from(jobs).unwrap_or(usize::MAX);
    }
}

fn apply_csv_overrides(config: &mut CsvConfig, args: &CsvArgs) {
    if let Some(dir) = &args.test_dir {
        config.test_dir = dir.clone();
    }
    if let Some(program) = &args.converter {
        config.converter.program = program.clone();
        config.converter.script = None;
    }
    if let Some(program) = &args.parser {
        config.parser.program = program.clone();
        config.parser.script = None;
    }
    if let Some(secs) = args.timeout {
        config.converter.timeout_secs = secs;
        config.parser.timeout_secs = secs;
    }
}
