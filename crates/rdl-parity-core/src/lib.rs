//! RDL Parity Core
//!
//! Differential testing engine for SystemRDL tool implementations.
//! Runs two elaborators over a corpus of `.rdl` inputs and classifies
//! where they agree, and validates a CSV-to-RDL converter against a corpus
//! of CSV inputs.

pub mod compare;
pub mod concepts;
pub mod config;
pub mod discovery;
pub mod error;
pub mod expectation;
pub mod extract;
pub mod outcome;
pub mod report;
pub mod result;
pub mod runner;
pub mod validate;

// Re-export commonly used types
pub use compare::{CaseOutcome, CaseProgress, Comparator, ProgressCallback, ToolVerdict};
pub use concepts::{ConceptRegistry, ConceptRule, ConceptSet, ConceptTag, Matcher};
pub use config::{
    CasePatterns, CompareConfig, ConceptRuleConfig, ConfigLoader, CsvConfig, HarnessConfig,
    ToolSpec,
};
pub use discovery::{discover_inputs, display_name};
pub use error::{ErrorKind, ParityError};
pub use extract::{ErrorRecord, extract};
pub use outcome::{Outcome, SideEvidence};
pub use report::{ComparisonReport, Finding};
pub use result::Result;
pub use runner::{RunFailure, RunResult, Tool};
pub use validate::{
    ConversionValidator, PatternMode, ValidationFailure, ValidationOutcome,
    ValidationProgressCallback, ValidationReport,
};

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` wins over `default_directive` when set. Logs go to stderr so
/// they never interleave with the narration on stdout. `ansi` controls
/// colour escapes in the log lines.
pub fn init_tracing(default_directive: &str, ansi: bool) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(ansi)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
