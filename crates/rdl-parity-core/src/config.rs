//! Harness configuration
//!
//! Configuration is organised into two sections, one per harness mode:
//! - `compare`: the two elaborators under differential test
//! - `csv`: the CSV-to-RDL converter and the parser used to check its output
//!
//! ## Example Configuration (.rdlparity.toml)
//!
//! ```toml
//! [compare]
//! testDir = "test"
//!
//! [compare.toolA]
//! name = "C++"
//! program = "build/systemrdl_elaborator"
//! timeoutSecs = 10
//!
//! [compare.toolB]
//! name = "Python"
//! program = "python3"
//! script = "script/rdl_semantic_validator.py"
//!
//! [[compare.concepts]]
//! tag = "alignment"
//! substrings = ["not aligned", "alignment"]
//!
//! [[csv.cases]]
//! file = "test_csv_basic_example.csv"
//! patterns = ['addrmap DEMO \{']
//! ```

use crate::error::ParityError;
use crate::result::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file names searched during auto-discovery, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".rdlparity.toml",
    ".rdlparity.json",
    "rdl-parity.yaml",
    "rdl-parity.yml",
    "rdl-parity.json",
];

/// How to invoke one external tool
///
/// The command line is `program [script] [args..] <input> [extra flags]`.
///
/// An omitted `timeoutSecs` falls back to the default of the section the tool
/// sits in: 10 s for compared elaborators, 30 s for the converter and parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "ToolSpecFile")]
pub struct ToolSpec {
    /// Display name used in narration and reports
    pub name: String,

    /// Executable path or bare program name looked up on `PATH`
    pub program: PathBuf,

    /// Optional script handed to an interpreter `program`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,

    /// Fixed arguments placed before the input file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,
}

/// A tool table as written in a config file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolSpecFile {
    name: String,
    program: PathBuf,
    #[serde(default)]
    script: Option<PathBuf>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl ToolSpecFile {
    fn into_spec(self, default_timeout_secs: u64) -> ToolSpec {
        ToolSpec {
            name: self.name,
            program: self.program,
            script: self.script,
            args: self.args,
            timeout_secs: self.timeout_secs.unwrap_or(default_timeout_secs),
        }
    }
}

impl From<ToolSpecFile> for ToolSpec {
    fn from(file: ToolSpecFile) -> Self {
        file.into_spec(default_compare_timeout())
    }
}

fn deserialize_converter_tool<'de, D>(
    deserializer: D,
) -> std::result::Result<ToolSpec, D::Error>
where
    D: Deserializer<'de>,
{
    ToolSpecFile::deserialize(deserializer).map(|file| file.into_spec(default_converter_timeout()))
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            script: None,
            args: Vec::new(),
            timeout_secs: default_compare_timeout(),
        }
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ParityError::config_error(format!(
                "timeout for tool '{}' must be greater than zero",
                self.name
            )));
        }
        if self.program.as_os_str().is_empty() {
            return Err(ParityError::config_error(format!(
                "tool '{}' has an empty program path",
                self.name
            )));
        }
        Ok(())
    }
}

/// Extra concept rule appended to the built-in registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRuleConfig {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substrings: Vec<String>,
    /// Regular expression tested against the lowercased message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Dual-compiler comparison settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompareConfig {
    #[serde(default = "default_tool_a")]
    pub tool_a: ToolSpec,
    #[serde(default = "default_tool_b")]
    pub tool_b: ToolSpec,
    #[serde(default = "default_test_dir")]
    pub test_dir: PathBuf,
    #[serde(default = "default_rdl_pattern")]
    pub input_pattern: String,
    /// Number of cases in flight at once; 1 keeps the run fully sequential
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<ConceptRuleConfig>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            tool_a: default_tool_a(),
            tool_b: default_tool_b(),
            test_dir: default_test_dir(),
            input_pattern: default_rdl_pattern(),
            jobs: default_jobs(),
            concepts: Vec::new(),
        }
    }
}

/// Required patterns for one named converter input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CasePatterns {
    /// File name (not path) of the CSV input
    pub file: String,
    pub patterns: Vec<String>,
}

/// Converter validation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CsvConfig {
    #[serde(
        default = "default_converter",
        deserialize_with = "deserialize_converter_tool"
    )]
    pub converter: ToolSpec,
    #[serde(default = "default_parser", deserialize_with = "deserialize_converter_tool")]
    pub parser: ToolSpec,
    #[serde(default = "default_test_dir")]
    pub test_dir: PathBuf,
    #[serde(default = "default_csv_pattern")]
    pub input_pattern: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cases: Vec<CasePatterns>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            converter: default_converter(),
            parser: default_parser(),
            test_dir: default_test_dir(),
            input_pattern: default_csv_pattern(),
            cases: Vec::new(),
        }
    }
}

/// Top-level harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub csv: CsvConfig,
}

impl HarnessConfig {
    /// Load configuration from file
    ///
    /// The format is chosen by extension: `.toml`, `.json`, `.yaml` or `.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ParityError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| parse_error(path, e))?,
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(path, e))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(path, e))?
            }
            _ => {
                return Err(ParityError::config_error(format!(
                    "Unsupported config file '{}' (expected .toml, .json, .yaml or .yml)",
                    path.display()
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.compare.tool_a.validate()?;
        self.compare.tool_b.validate()?;
        self.csv.converter.validate()?;
        self.csv.parser.validate()?;

        if self.compare.jobs == 0 {
            return Err(ParityError::config_error("jobs must be at least 1"));
        }
        for rule in &self.compare.concepts {
            if rule.substrings.is_empty() && rule.pattern.is_none() {
                return Err(ParityError::config_error(format!(
                    "concept rule '{}' needs substrings or a pattern",
                    rule.tag
                )));
            }
        }
        Ok(())
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> ParityError {
    ParityError::config_error(format!(
        "Failed to parse config from '{}': {}",
        path.display(),
        err
    ))
}

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| ParityError::io_error(start_path, e))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load config from an explicit path, or auto-discover, or fall back to defaults
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<HarnessConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(ParityError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return HarnessConfig::load(path);
        }

        let start = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(start)? {
            Some(path) => HarnessConfig::load(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(HarnessConfig::default())
            }
        }
    }
}

fn default_compare_timeout() -> u64 {
    10
}

fn default_converter_timeout() -> u64 {
    30
}

fn default_jobs() -> usize {
    1
}

fn default_test_dir() -> PathBuf {
    PathBuf::from("test")
}

fn default_rdl_pattern() -> String {
    "*.rdl".to_string()
}

fn default_csv_pattern() -> String {
    "test_csv_*.csv".to_string()
}

fn default_tool_a() -> ToolSpec {
    ToolSpec::new("C++", "build/systemrdl_elaborator")
}

fn default_tool_b() -> ToolSpec {
    ToolSpec::new("Python", "python3").with_script("script/rdl_semantic_validator.py")
}

fn default_converter() -> ToolSpec {
    ToolSpec::new("CSV2RDL", "build/systemrdl_csv2rdl")
        .with_timeout_secs(default_converter_timeout())
}

fn default_parser() -> ToolSpec {
    ToolSpec::new("Parser", "build/systemrdl_parser").with_timeout_secs(default_converter_timeout())
}
