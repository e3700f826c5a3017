//! Codec provider backed by the `asn1tools` and `gzip` executables

use super::gzip::{gz_path, gzip_file, MAX_LEVEL};
use super::process::run_tool;
use super::{hex_byte_len, invalid_output, CodecProvider};
use crate::config::ToolConfig;
use crate::encoding::EncodingRule;
use crate::error::{BenchError, Result};
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tracing::debug;

const BUILTIN_GZIP: &str = "builtin gzip";

pub struct ExternalCodec {
    tools: ToolConfig,
}

impl ExternalCodec {
    pub fn new(tools: ToolConfig) -> Self {
        ExternalCodec { tools }
    }

    fn compress_with_tool(&self, path: &Path) -> Result<Vec<u8>> {
        let program = self.tools.gzip.as_str();
        // -n: no name/timestamp, -9: max level, -k: keep input, -f: overwrite
        let args: Vec<OsString> = vec!["-n9".into(), "-k".into(), "-f".into(), path.as_os_str().to_owned()];
        let output = run_tool(program, &args, None, self.tools.timeout)?;
        if !output.status.success() {
            return Err(BenchError::external_tool(program, output.diagnostic()));
        }

        let artifact = gz_path(path);
        fs::read(&artifact).map_err(|e| {
            BenchError::external_tool(program, format!("no readable artifact at {}: {}", artifact.display(), e))
        })
    }
}

/// Hex longer than this goes through stdin instead of the argument list,
/// which Linux caps at 128 KiB per argument.
const MAX_HEX_ARG: usize = 64 * 1024;

/// Arguments for `asn1tools convert` and, for large samples, the stdin payload.
///
/// The hex is passed as the last positional argument; `-` makes the tool read
/// one hex string per line from stdin instead.
fn convert_invocation(
    rule_in: EncodingRule,
    rule_out: EncodingRule,
    schema: &Path,
    object: &str,
    hex: &str,
) -> (Vec<OsString>, Option<String>) {
    let mut args: Vec<OsString> = vec![
        "convert".into(),
        "-i".into(),
        rule_in.as_str().into(),
        "-o".into(),
        rule_out.as_str().into(),
        schema.as_os_str().to_owned(),
        object.into(),
    ];

    if hex.len() <= MAX_HEX_ARG {
        args.push(hex.into());
        (args, None)
    } else {
        args.push("-".into());
        (args, Some(format!("{}\n", hex)))
    }
}

/// Extracts the converted hex from a successful run.
///
/// In stdin mode the tool reports a failed line by echoing it followed by
/// the error text, still exiting 0. Anything but a single hex line is
/// therefore a rejected value and its text is kept as the diagnostic.
fn parse_converted(program: &str, stdout: &str) -> Result<String> {
    let lines: Vec<&str> = stdout.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

    match lines.as_slice() {
        [] => Err(BenchError::external_tool(program, "produced no output")),
        [converted] => match hex_byte_len(converted) {
            Ok(_) => Ok(converted.to_string()),
            Err(e) if looks_like_hex(converted) => Err(invalid_output(program, e)),
            Err(_) => Err(BenchError::SchemaViolation(converted.to_string())),
        },
        [_echoed, diagnostic @ ..] => Err(BenchError::SchemaViolation(diagnostic.join("\n"))),
    }
}

fn looks_like_hex(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_hexdigit())
}

impl CodecProvider for ExternalCodec {
    fn compress(&self, path: &Path) -> Result<Vec<u8>> {
        if self.tools.builtin_gzip {
            debug!(path = %path.display(), "compressing in process");
            gzip_file(path, MAX_LEVEL).map_err(|e| BenchError::external_tool(BUILTIN_GZIP, e.to_string()))
        } else {
            self.compress_with_tool(path)
        }
    }

    fn transcode(
        &self,
        rule_in: EncodingRule,
        rule_out: EncodingRule,
        schema: &Path,
        object: &str,
        hex: &str,
    ) -> Result<String> {
        let program = self.tools.asn1tools.as_str();
        let (args, input) = convert_invocation(rule_in, rule_out, schema, object, hex);
        let output = run_tool(program, &args, input.as_ref().map(|i| i.as_bytes()), self.tools.timeout)?;

        // The tool started and rejected the value, the object name or the schema.
        if !output.status.success() {
            return Err(BenchError::SchemaViolation(output.diagnostic()));
        }

        parse_converted(program, &String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &str {
        "external"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    /// Behaves like `asn1tools convert` rejecting a value: echoes the input
    /// line, prints the error text after it and still exits 0.
    const REJECTING_TRANSCODER: &str = r#"#!/bin/sh
if [ "$8" = "-" ]; then read -r line; else line="$8"; fi
echo "$line"
echo "Record.a: Expected integer"
"#;

    /// Converts anything into a fixed three-byte DER value.
    const ACCEPTING_TRANSCODER: &str = r#"#!/bin/sh
if [ "$8" = "-" ]; then read -r line; fi
echo "300180"
"#;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A freshly written script can briefly be reported busy while another
    /// test thread forks; retry those spawns.
    fn transcode(codec: &ExternalCodec, hex: &str) -> Result<String> {
        for _ in 0..20 {
            match codec.transcode(EncodingRule::Jer, EncodingRule::Der, Path::new("s.asn"), "Record", hex) {
                Err(BenchError::ExternalTool { message, .. }) if message.contains("os error 26") => {
                    thread::sleep(Duration::from_millis(50));
                }
                result => return result,
            }
        }
        panic!("transcoder script stayed busy");
    }

    fn tools(asn1tools: &str, gzip: &str, builtin_gzip: bool) -> ToolConfig {
        ToolConfig {
            asn1tools: asn1tools.to_string(),
            gzip: gzip.to_string(),
            builtin_gzip,
            timeout: Some(Duration::from_secs(10)),
        }
    }

    #[test]
    fn missing_transcoder_is_external_tool_error() {
        let codec = ExternalCodec::new(tools("no-such-asn1tools", "gzip", true));
        let err = codec
            .transcode(EncodingRule::Jer, EncodingRule::Der, Path::new("s.asn"), "T", "7B7D")
            .unwrap_err();
        assert!(matches!(err, BenchError::ExternalTool { .. }), "{:?}", err);
    }

    #[test]
    fn missing_gzip_is_external_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, "{}").unwrap();

        let codec = ExternalCodec::new(tools("asn1tools", "no-such-gzip", false));
        let err = codec.compress(&path).unwrap_err();
        assert!(matches!(err, BenchError::ExternalTool { .. }), "{:?}", err);
    }

    #[test]
    fn failing_transcoder_reports_its_diagnostic() {
        // `false` accepts any arguments and exits non-zero without output.
        let codec = ExternalCodec::new(tools("false", "gzip", true));
        let err = codec
            .transcode(EncodingRule::Jer, EncodingRule::Uper, Path::new("s.asn"), "T", "7B7D")
            .unwrap_err();
        assert!(matches!(err, BenchError::SchemaViolation(_)), "{:?}", err);
    }

    #[test]
    fn builtin_gzip_missing_input_is_external_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let codec = ExternalCodec::new(tools("asn1tools", "gzip", true));
        let err = codec.compress(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BenchError::ExternalTool { .. }), "{:?}", err);
    }

    #[test]
    fn builtin_gzip_leaves_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, r#"{"a":1}"#).unwrap();

        let codec = ExternalCodec::new(tools("asn1tools", "gzip", true));
        let compressed = codec.compress(&path).unwrap();
        assert_eq!(fs::read(gz_path(&path)).unwrap().len(), compressed.len());
    }

    #[test]
    fn small_samples_pass_hex_as_argument() {
        let (args, input) = convert_invocation(EncodingRule::Jer, EncodingRule::Per, Path::new("s.asn"), "Record", "7B7D");
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, vec!["convert", "-i", "jer", "-o", "per", "s.asn", "Record", "7B7D"]);
        assert!(input.is_none());
    }

    #[test]
    fn large_samples_go_through_stdin() {
        let hex = "AB".repeat(MAX_HEX_ARG);
        let (args, input) = convert_invocation(EncodingRule::Jer, EncodingRule::Uper, Path::new("s.asn"), "Record", &hex);
        assert_eq!(args.last().unwrap(), "-");
        assert_eq!(input.unwrap(), format!("{}\n", hex));
    }

    #[test]
    fn converted_output_is_trimmed() {
        assert_eq!(parse_converted("asn1tools", "3003800101\n").unwrap(), "3003800101");
    }

    #[test]
    fn error_text_after_echoed_line_is_a_schema_violation() {
        let err = parse_converted("asn1tools", "7B7D\nRecord.a: Expected integer\n").unwrap_err();
        match err {
            BenchError::SchemaViolation(text) => assert_eq!(text, "Record.a: Expected integer"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn lone_error_line_is_a_schema_violation() {
        let err = parse_converted("asn1tools", "error: Type 'Missing' not found\n").unwrap_err();
        assert!(matches!(err, BenchError::SchemaViolation(ref text) if text.contains("not found")), "{:?}", err);
    }

    #[test]
    fn truncated_hex_is_an_external_tool_error() {
        let err = parse_converted("asn1tools", "30038\n").unwrap_err();
        assert!(matches!(err, BenchError::ExternalTool { .. }), "{:?}", err);
    }

    #[test]
    fn rejected_value_keeps_transcoder_message() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "asn1tools", REJECTING_TRANSCODER);
        let codec = ExternalCodec::new(tools(script.to_str().unwrap(), "gzip", true));

        for hex in ["7B2261223A2278227D".to_string(), "20".repeat(MAX_HEX_ARG)] {
            match transcode(&codec, &hex) {
                Err(BenchError::SchemaViolation(text)) => assert_eq!(text, "Record.a: Expected integer"),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn accepted_value_returns_converted_hex() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "asn1tools", ACCEPTING_TRANSCODER);
        let codec = ExternalCodec::new(tools(script.to_str().unwrap(), "gzip", true));

        assert_eq!(transcode(&codec, "7B7D").unwrap(), "300180");
        assert_eq!(transcode(&codec, &"20".repeat(MAX_HEX_ARG)).unwrap(), "300180");
    }
}
