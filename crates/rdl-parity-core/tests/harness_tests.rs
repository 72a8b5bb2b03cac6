//! End-to-end harness tests against scripted stand-in tools
//!
//! Each fake elaborator reads directives from the input file itself:
//! `// A-EXIT: n`, `// A-MSG: text`, `// A-SLEEP: secs` (and the same with
//! `B-`), so every case documents what both tools will do with it.

#![cfg(unix)]

use rdl_parity_core::{
    CaseProgress, CompareConfig, Comparator, ConceptRuleConfig, ConceptTag, ConversionValidator,
    CsvConfig, Outcome, ParityError, ToolSpec, ValidationFailure, discover_inputs,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A directive-driven elaborator; tool B writes its diagnostics to stderr
fn fake_elaborator(dir: &Path, side: &str) -> PathBuf {
    let redirect = if side == "B" { " >&2" } else { "" };
    let body = format!(
        r#"secs=$(sed -n 's|^// {side}-SLEEP: ||p' "$1")
[ -n "$secs" ] && sleep "$secs"
sed -n 's|^// {side}-MSG: ||p' "$1"{redirect}
code=$(sed -n 's|^// {side}-EXIT: ||p' "$1")
exit ${{code:-0}}
"#
    );
    write_script(dir, &format!("elab_{}.sh", side.to_lowercase()), &body)
}

struct Corpus {
    _temp: TempDir,
    test_dir: PathBuf,
    config: CompareConfig,
}

fn corpus(cases: &[(&str, &str)]) -> Corpus {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin");
    let test_dir = temp.path().join("test");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&test_dir).unwrap();

    for (name, content) in cases {
        fs::write(test_dir.join(name), content).unwrap();
    }

    let config = CompareConfig {
        tool_a: ToolSpec::new("C++", fake_elaborator(&bin, "A")).with_timeout_secs(5),
        tool_b: ToolSpec::new("Python", fake_elaborator(&bin, "B")).with_timeout_secs(5),
        test_dir: test_dir.clone(),
        ..CompareConfig::default()
    };

    Corpus {
        _temp: temp,
        test_dir,
        config,
    }
}

#[tokio::test]
async fn test_every_outcome_is_reachable() {
    let corpus = corpus(&[
        ("a_pass.rdl", "addrmap a {};\n"),
        (
            "b_overlap.rdl",
            "// A-EXIT: 1\n// A-MSG: Line 5 - Field overlap detected\n\
             // B-EXIT: 1\n// B-MSG: b_overlap.rdl:5:3: field X overlaps with field Y\n",
        ),
        (
            "c_different.rdl",
            "// A-EXIT: 1\n// A-MSG: error: field exceeds register width\n\
             // B-EXIT: 1\n// B-MSG: error: fields overlap\n",
        ),
        (
            "d_a_only.rdl",
            "// B-EXIT: 1\n// B-MSG: error: value is not a power of 2\n",
        ),
        ("e_b_only.rdl", "// A-EXIT: 2\n// A-MSG: fatal: crashed\n"),
    ]);

    let inputs = discover_inputs(&corpus.test_dir, "*.rdl").unwrap();
    let comparator = Comparator::from_config(&corpus.config).unwrap();
    let report = comparator.run(&inputs).await;

    assert_eq!(report.total_tests, 5);
    for outcome in Outcome::ALL {
        assert_eq!(report.count(outcome), 1, "{outcome}");
    }
    assert_eq!(report.compatibility_percent, 40.0);

    let similar = &report.cases(Outcome::BothFailSimilar)[0];
    assert_eq!(similar.name, "b_overlap.rdl");
    assert!(similar.tool_b.concepts.contains(&ConceptTag::OVERLAP));

    let a_only = &report.cases(Outcome::ToolAOnlyPass)[0];
    assert_eq!(
        a_only.tool_b.first_error().map(|e| e.as_str()),
        Some("error: value is not a power of 2")
    );
}

#[tokio::test]
async fn test_expected_failure_marker_inverts_verdicts() {
    let corpus = corpus(&[
        (
            "rejected.rdl",
            "// EXPECT_ELABORATION_FAILURE\n// A-EXIT: 1\n// A-MSG: error: overlap\n\
             // B-EXIT: 1\n// B-MSG: error: overlaps with CTRL\n",
        ),
        ("accepted.rdl", "// EXPECT_ELABORATION_FAILURE\naddrmap top {};\n"),
    ]);

    let inputs = discover_inputs(&corpus.test_dir, "*.rdl").unwrap();
    let report = Comparator::from_config(&corpus.config)
        .unwrap()
        .run(&inputs)
        .await;

    let pass = report.cases(Outcome::BothPass);
    assert_eq!(pass.len(), 1);
    assert_eq!(pass[0].name, "rejected.rdl");
    assert!(pass[0].expect_failure);

    let fail = report.cases(Outcome::BothFailSimilar);
    assert_eq!(fail.len(), 1);
    assert_eq!(fail[0].name, "accepted.rdl");
}

#[tokio::test]
async fn test_timeout_only_affects_one_side() {
    let mut corpus = corpus(&[("slow.rdl", "// A-SLEEP: 5\n")]);
    corpus.config.tool_a = corpus.config.tool_a.clone().with_timeout_secs(1);

    let inputs = discover_inputs(&corpus.test_dir, "*.rdl").unwrap();
    let report = Comparator::from_config(&corpus.config)
        .unwrap()
        .run(&inputs)
        .await;

    let case = &report.cases(Outcome::ToolBOnlyPass)[0];
    assert_eq!(case.tool_a.failure.as_deref(), Some("timed out after 1s"));
    assert_eq!(
        case.tool_a.first_error().map(|e| e.as_str()),
        Some("fatal: C++ timed out after 1s")
    );
}

#[tokio::test]
async fn test_parallel_jobs_keep_corpus_order() {
    let corpus = corpus(&[
        ("01.rdl", "// A-SLEEP: 1\n"),
        ("02.rdl", ""),
        ("03.rdl", "// B-SLEEP: 1\n"),
        ("04.rdl", ""),
    ]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let comparator = Comparator::from_config(&corpus.config)
        .unwrap()
        .with_jobs(4)
        .with_progress(Arc::new(move |progress: CaseProgress<'_>| {
            sink.lock()
                .unwrap()
                .push((progress.index, progress.case.name.clone()));
        }));

    let inputs = discover_inputs(&corpus.test_dir, "*.rdl").unwrap();
    let report = comparator.run(&inputs).await;

    let names: Vec<_> = report
        .cases(Outcome::BothPass)
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["01.rdl", "02.rdl", "03.rdl", "04.rdl"]);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], (1, "01.rdl".to_string()));
    assert_eq!(seen[3], (4, "04.rdl".to_string()));
}

#[tokio::test]
async fn test_configured_concept_rule_joins_registry() {
    let mut corpus = corpus(&[(
        "align.rdl",
        "// A-EXIT: 1\n// A-MSG: error: address 0x3 is not aligned\n\
         // B-EXIT: 1\n// B-MSG: error: misaligned register offset\n",
    )]);
    corpus.config.concepts.push(ConceptRuleConfig {
        tag: "alignment".to_string(),
        substrings: vec!["aligned".to_string()],
        pattern: None,
    });

    let inputs = discover_inputs(&corpus.test_dir, "*.rdl").unwrap();
    let report = Comparator::from_config(&corpus.config)
        .unwrap()
        .run(&inputs)
        .await;

    let case = &report.cases(Outcome::BothFailSimilar)[0];
    assert!(case.tool_a.concepts.contains(&ConceptTag::new("alignment")));
    assert!(case.tool_b.concepts.contains(&ConceptTag::new("alignment")));
}

#[test]
fn test_missing_tool_is_reported_before_any_case() {
    let corpus = corpus(&[("a.rdl", "")]);
    let mut config = corpus.config.clone();
    config.tool_a = ToolSpec::new("C++", corpus.test_dir.join("missing_elaborator"));

    let err = Comparator::from_config(&config).err().unwrap();
    assert!(matches!(err, ParityError::ExecutableNotFound { .. }));
    assert!(err.is_environment_error());
}

#[test]
fn test_missing_and_empty_corpus() {
    let temp = TempDir::new().unwrap();
    let err = discover_inputs(&temp.path().join("nope"), "*.rdl").unwrap_err();
    assert!(matches!(err, ParityError::TestDirMissing { .. }));

    let err = discover_inputs(temp.path(), "*.rdl").unwrap_err();
    assert!(matches!(err, ParityError::NoInputFiles { .. }));
}

fn csv_fixture(temp: &TempDir) -> CsvConfig {
    let bin = temp.path().join("bin");
    let test_dir = temp.path().join("test");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&test_dir).unwrap();

    let converter = write_script(
        &bin,
        "csv2rdl.sh",
        r#"in="$1"
out="$3"
if grep -q ACCEPT "$in"; then
    echo 'addrmap X { name = "X"; };' > "$out"
    exit 0
fi
case "$in" in
    *_fail.csv)
        echo "Error: Line 2 contains mixed information types" >&2
        exit 1
        ;;
esac
if grep -q NOOUT "$in"; then
    exit 0
fi
if grep -q EMPTY "$in"; then
    echo "// nothing converted" > "$out"
    exit 0
fi
cat > "$out" <<'EOF'
addrmap DEMO {
    name = "DEMO";
    reg {
        name = "CTRL";
    } CTRL @ 0x0;
};
EOF
"#,
    );
    let parser = write_script(&bin, "parser.sh", "grep -q BROKEN \"$1\" && exit 1\nexit 0\n");

    for (name, content) in [
        ("test_csv_good.csv", "addrmap,DEMO\n"),
        ("test_csv_mixed_types_fail.csv", "reg,field\n"),
        ("test_csv_empty.csv", "EMPTY\n"),
        ("test_csv_accepted_fail.csv", "ACCEPT\n"),
        ("test_csv_no_output.csv", "NOOUT\n"),
    ] {
        fs::write(test_dir.join(name), content).unwrap();
    }

    CsvConfig {
        converter: ToolSpec::new("CSV2RDL", converter),
        parser: ToolSpec::new("Parser", parser),
        test_dir,
        ..CsvConfig::default()
    }
}

#[tokio::test]
async fn test_converter_validation_end_to_end() {
    let temp = TempDir::new().unwrap();
    let config = csv_fixture(&temp);

    let inputs = discover_inputs(&config.test_dir, &config.input_pattern).unwrap();
    assert_eq!(inputs.len(), 5);

    let validator = ConversionValidator::from_config(&config).unwrap();
    let report = validator.run(&inputs).await;

    let by_name = |name: &str| {
        report
            .cases
            .iter()
            .find(|c| c.name == name)
            .unwrap()
            .clone()
    };

    assert!(by_name("test_csv_good.csv").passed);

    let rejected = by_name("test_csv_mixed_types_fail.csv");
    assert!(rejected.passed);
    assert!(rejected.expect_failure);
    assert_eq!(rejected.matched_patterns.len(), 2);

    assert!(matches!(
        by_name("test_csv_empty.csv").failures[0],
        ValidationFailure::MissingContentPatterns { .. }
    ));
    assert_eq!(
        by_name("test_csv_accepted_fail.csv").failures,
        vec![ValidationFailure::UnexpectedSuccess]
    );
    assert!(matches!(
        by_name("test_csv_no_output.csv").failures[0],
        ValidationFailure::OutputMissing { .. }
    ));

    assert_eq!(report.total_tests, 5);
    assert_eq!(report.passed_tests, 2);
    assert_eq!(report.failed_tests, 3);
    assert!(!report.all_passed());
    assert_eq!(report.error_details().len(), 3);
}

#[tokio::test]
async fn test_converter_output_must_parse() {
    let temp = TempDir::new().unwrap();
    let mut config = csv_fixture(&temp);
    config.parser = ToolSpec::new(
        "Parser",
        write_script(&temp.path().join("bin"), "strict.sh", "echo 'syntax error' >&2\nexit 1\n"),
    );

    let validator = ConversionValidator::from_config(&config).unwrap();
    let outcome = validator
        .validate_file(&config.test_dir.join("test_csv_good.csv"))
        .await;

    assert!(!outcome.passed);
    assert_eq!(
        outcome.failures,
        vec![ValidationFailure::SyntaxCheckFailed {
            stderr: "syntax error".to_string()
        }]
    );
}
