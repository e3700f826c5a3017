pub mod external;
pub mod gzip;
pub mod process;

use crate::encoding::EncodingRule;
use crate::error::{BenchError, Result};
use std::path::Path;

/// Provider of the compression and ASN.1 transcoding steps.
///
/// The benchmark never encodes anything itself; every transformed size comes
/// from one of these two operations.
pub trait CodecProvider: Sync {
    /// Compresses the file at `path` with maximum gzip effort and returns the
    /// compressed bytes. Leaves a `<path>.gz` artifact next to the input.
    fn compress(&self, path: &Path) -> Result<Vec<u8>>;

    /// Converts `hex` (bytes in `rule_in`) into `rule_out` against the
    /// `object` type of `schema` and returns the result as hex.
    fn transcode(
        &self,
        rule_in: EncodingRule,
        rule_out: EncodingRule,
        schema: &Path,
        object: &str,
        hex: &str,
    ) -> Result<String>;

    /// Returns the name of the provider.
    fn name(&self) -> &str;
}

/// Uppercase hex with two characters per byte and no separators.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Number of bytes represented by a hex string produced by a transcoder.
///
/// Surrounding whitespace is ignored and either case is accepted.
pub fn hex_byte_len(hex: &str) -> std::result::Result<usize, hex::FromHexError> {
    hex::decode(hex.trim()).map(|bytes| bytes.len())
}

pub(crate) fn invalid_output(program: &str, err: hex::FromHexError) -> BenchError {
    BenchError::external_tool(program, format!("produced malformed hex output: {}", err))
}
