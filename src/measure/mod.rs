//! Size measurement of a JSON sample under every benchmarked encoding

use crate::codec::{hex_byte_len, invalid_output, to_hex, CodecProvider};
use crate::config::BenchmarkConfig;
use crate::encoding::{Encoding, EncodingRule, ASN1_TARGETS};
use crate::error::{BenchError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::thread;
use tracing::{info, warn};

/// Unit of the plain `json` row.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    /// Byte length of the file
    Bytes,
    /// Number of lines in the file
    Lines,
}

/// Size of the sample under one encoding.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EncodingResult {
    pub encoding: Encoding,
    pub size: usize,
}

/// One line of the report.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReportRow {
    Measured(EncodingResult),
    /// Only produced when rows are isolated from each other's failures.
    Failed { encoding: Encoding, error: String },
}

impl ReportRow {
    pub fn encoding(&self) -> Encoding {
        match self {
            ReportRow::Measured(result) => result.encoding,
            ReportRow::Failed { encoding, .. } => *encoding,
        }
    }

    pub fn size(&self) -> Option<usize> {
        match self {
            ReportRow::Measured(result) => Some(result.size),
            ReportRow::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ReportRow::Failed { .. })
    }
}

/// The sample as read from disk together with its compact JSON hex form.
#[derive(Debug)]
pub struct Sample {
    pub text: String,
    pub compact_hex: String,
}

impl Sample {
    /// Reads and validates the sample. Fails before any tool is invoked if
    /// the content is not JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| BenchError::InvalidInputFormat(e.to_string()))?;
        Self::from_text(text)
    }

    /// Numbers keep their exact digits and members their order, so the
    /// compact text carries the same value as the sample.
    pub fn from_text(text: String) -> Result<Self> {
        let invalid = |e: serde_json::Error| BenchError::InvalidInputFormat(e.to_string());
        let value: serde_json::Value = serde_json::from_str(&text).map_err(invalid)?;
        let compact = serde_json::to_string(&value).map_err(invalid)?;
        Ok(Sample {
            compact_hex: to_hex(compact.as_bytes()),
            text,
        })
    }
}

/// Size of the untransformed sample text.
pub fn plain_size(text: &str, unit: SizeUnit) -> usize {
    match unit {
        SizeUnit::Bytes => text.len(),
        SizeUnit::Lines => text.lines().count(),
    }
}

/// Byte length of the gzip artifact for `path`.
pub fn gzip_size(codec: &dyn CodecProvider, path: &Path) -> Result<usize> {
    Ok(codec.compress(path)?.len())
}

/// Byte length of the sample converted from JER into `rule`.
pub fn asn1_size(
    codec: &dyn CodecProvider,
    schema: &Path,
    object: &str,
    rule: EncodingRule,
    compact_hex: &str,
) -> Result<usize> {
    let converted = codec.transcode(EncodingRule::Jer, rule, schema, object, compact_hex)?;
    hex_byte_len(&converted).map_err(|e| invalid_output(codec.name(), e))
}

/// Measures the sample under all five encodings, in report order.
///
/// Any failure aborts the run unless `config.isolate` is set, in which case
/// the failed row is recorded and the remaining rows are still measured.
/// Reading or parsing the sample is always fatal.
pub fn run_benchmark(config: &BenchmarkConfig, codec: &dyn CodecProvider) -> Result<Vec<ReportRow>> {
    let sample = Sample::load(&config.path)?;
    let mut rows = Vec::with_capacity(Encoding::all().len());

    rows.push(settle(Encoding::Json, Ok(plain_size(&sample.text, config.json_size)), config.isolate)?);
    rows.push(settle(Encoding::JsonGzip, gzip_size(codec, &config.path), config.isolate)?);

    let measure = |rule: EncodingRule| asn1_size(codec, &config.schema, &config.object, rule, &sample.compact_hex);

    if config.parallel {
        let results: Vec<Result<usize>> = thread::scope(|scope| {
            let handles: Vec<_> = ASN1_TARGETS
                .iter()
                .map(|&rule| scope.spawn(move || measure(rule)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(BenchError::external_tool(codec.name(), "conversion worker panicked")))
                })
                .collect()
        });
        for (&rule, result) in ASN1_TARGETS.iter().zip(results) {
            rows.push(settle(Encoding::Asn1(rule), result, config.isolate)?);
        }
    } else {
        for &rule in ASN1_TARGETS.iter() {
            rows.push(settle(Encoding::Asn1(rule), measure(rule), config.isolate)?);
        }
    }

    Ok(rows)
}

fn settle(encoding: Encoding, result: Result<usize>, isolate: bool) -> Result<ReportRow> {
    match result {
        Ok(size) => {
            info!(encoding = %encoding, size, "measured");
            Ok(ReportRow::Measured(EncodingResult { encoding, size }))
        }
        Err(e) if isolate => {
            warn!(encoding = %encoding, error = %e, "measurement failed");
            Ok(ReportRow::Failed {
                encoding,
                error: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}
