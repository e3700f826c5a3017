use crate::error::{BenchError, Result};
use crate::measure::SizeUnit;
use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments of the `encoding_sizes` tool.
///
/// `path`, `schema` and `object` are declared optional so that a missing or
/// empty value surfaces as [`BenchError::MissingArgument`] instead of a
/// parser usage error.
#[derive(Parser, Debug)]
#[command(name = "encoding_sizes")]
#[command(about = "Compare the size of a JSON sample as JSON, gzip and ASN.1 DER/PER/UPER")]
pub struct Args {
    /// Path to the JSON sample file
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Path to the ASN.1 schema
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Name of the top-level ASN.1 type the sample encodes
    #[arg(short, long)]
    pub object: Option<String>,

    /// How the plain `json` row is measured
    #[arg(long, value_enum, default_value_t = SizeUnit::Bytes)]
    pub json_size: SizeUnit,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Keep measuring after a failed row and mark it in the report
    #[arg(long)]
    pub isolate: bool,

    /// Run the DER, PER and UPER conversions concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Kill any external tool still running after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// ASN.1 transcoder executable
    #[arg(long, default_value = "asn1tools")]
    pub asn1tools: String,

    /// gzip executable
    #[arg(long, default_value = "gzip")]
    pub gzip: String,

    /// Compress in process instead of running the gzip executable
    #[arg(long)]
    pub builtin_gzip: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated inputs of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    pub path: PathBuf,
    pub schema: PathBuf,
    pub object: String,
    pub json_size: SizeUnit,
    pub isolate: bool,
    pub parallel: bool,
}

impl BenchmarkConfig {
    pub fn new(path: impl Into<PathBuf>, schema: impl Into<PathBuf>, object: impl Into<String>) -> Self {
        BenchmarkConfig {
            path: path.into(),
            schema: schema.into(),
            object: object.into(),
            json_size: SizeUnit::Bytes,
            isolate: false,
            parallel: false,
        }
    }
}

/// External executables and how they are driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub asn1tools: String,
    pub gzip: String,
    pub builtin_gzip: bool,
    pub timeout: Option<Duration>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            asn1tools: "asn1tools".to_string(),
            gzip: "gzip".to_string(),
            builtin_gzip: false,
            timeout: None,
        }
    }
}

impl Args {
    /// Checks the required inputs without touching the filesystem.
    pub fn to_configs(&self) -> Result<(BenchmarkConfig, ToolConfig)> {
        let path = required_path(&self.path, "path")?;
        let schema = required_path(&self.schema, "schema")?;
        let object = match self.object.as_deref().map(str::trim) {
            Some(object) if !object.is_empty() => object.to_string(),
            _ => return Err(BenchError::MissingArgument("object")),
        };

        let benchmark = BenchmarkConfig {
            path,
            schema,
            object,
            json_size: self.json_size,
            isolate: self.isolate,
            parallel: self.parallel,
        };
        let tools = ToolConfig {
            asn1tools: self.asn1tools.clone(),
            gzip: self.gzip.clone(),
            builtin_gzip: self.builtin_gzip,
            timeout: self.timeout_secs.map(Duration::from_secs),
        };

        Ok((benchmark, tools))
    }
}

fn required_path(value: &Option<PathBuf>, name: &'static str) -> Result<PathBuf> {
    match value {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
        _ => Err(BenchError::MissingArgument(name)),
    }
}
