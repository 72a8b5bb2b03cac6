//! RDL Parity CLI
//!
//! Command-line interface for differential testing of SystemRDL tools

mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rdl_parity_core::init_tracing;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "rdl-parity")]
#[command(about = "Differential testing harness for SystemRDL tool implementations")]
#[command(version = rdl_parity_core::VERSION)]
#[command(
    long_about = "rdl-parity runs two SystemRDL elaborators over the same corpus and reports where\n\
their verdicts and error semantics agree. It can also validate a CSV-to-RDL converter.\n\
\n\
Examples:\n  \
rdl-parity                       # Compare both tools over ./test\n  \
rdl-parity compare --jobs 4 corpus/  # Compare with four cases in flight\n  \
rdl-parity csv                   # Validate the CSV converter over ./test"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    compare: CompareArgs,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.rdlparity.toml/rdl-parity.yaml/...)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CompareArgs {
    /// Directory containing the RDL corpus
    #[arg(help = "Directory containing .rdl inputs (default: test)")]
    pub test_dir: Option<PathBuf>,

    /// Tool A executable
    #[arg(long, env = "RDL_PARITY_TOOL_A", value_name = "PATH")]
    pub tool_a: Option<PathBuf>,

    /// Tool B executable; replaces the configured interpreter and script
    #[arg(long, env = "RDL_PARITY_TOOL_B", value_name = "PATH")]
    pub tool_b: Option<PathBuf>,

    /// Per-invocation timeout for both tools
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Number of cases run concurrently
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: Option<u64>,

    /// Write comparison_report.json and comparison_report.md into this directory
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Print every extracted diagnostic and failure reason per case
    #[arg(long)]
    pub verbose_errors: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CsvArgs {
    /// Directory containing the CSV corpus
    #[arg(help = "Directory containing test_csv_*.csv inputs (default: test)")]
    pub test_dir: Option<PathBuf>,

    /// Converter executable
    #[arg(long, env = "RDL_PARITY_CONVERTER", value_name = "PATH")]
    pub converter: Option<PathBuf>,

    /// Parser executable used to check converted output
    #[arg(long, env = "RDL_PARITY_PARSER", value_name = "PATH")]
    pub parser: Option<PathBuf>,

    /// Per-invocation timeout for converter and parser
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Write validation_report.json and validation_report.md into this directory
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two elaborators over an RDL corpus
    Compare(CompareArgs),

    /// Validate the CSV-to-RDL converter over a CSV corpus
    Csv(CsvArgs),

    /// Show version information
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed build information")]
        detailed: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let color = !(cli.no_color || std::env::var_os("NO_COLOR").is_some());
    if !color {
        colored::control::set_override(false);
    }

    let log_level = match cli.verbose {
        0 => "rdl_parity=error",
        1 => "rdl_parity=warn",
        2 => "rdl_parity=info",
        3 => "rdl_parity=debug",
        _ => "rdl_parity=trace",
    };
    init_tracing(log_level, color);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(cli)) {
        Ok(status) => status,
        Err(e) => {
            error!("rdl-parity failed: {:#}", e);
            output::print_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: Cli) -> Result<ExitCode> {
    match cli.command.unwrap_or(Commands::Compare(cli.compare)) {
        Commands::Compare(args) => commands::compare_command(args, cli.config).await,
        Commands::Csv(args) => commands::csv_command(args, cli.config).await,
        Commands::Version { detailed } => {
            if detailed {
                println!("rdl-parity {}", rdl_parity_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
            } else {
                println!("{}", rdl_parity_core::VERSION);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
