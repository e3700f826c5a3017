//! Encodings measured by the benchmark
//!
//! The report always lists the same five encodings in the same order: the
//! plain JSON text, the gzip-compressed text and the three ASN.1 binary
//! encoding rules produced from the JSON Encoding Rules representation.

use serde::Serialize;
use std::fmt;

/// ASN.1 encoding rules understood by the transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingRule {
    /// JSON Encoding Rules, the input side of every conversion.
    Jer,
    /// Distinguished Encoding Rules.
    Der,
    /// Aligned Packed Encoding Rules.
    Per,
    /// Unaligned Packed Encoding Rules.
    Uper,
}

/// Target rules measured for every sample, in report order.
pub const ASN1_TARGETS: [EncodingRule; 3] = [EncodingRule::Der, EncodingRule::Per, EncodingRule::Uper];

impl EncodingRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingRule::Jer => "jer",
            EncodingRule::Der => "der",
            EncodingRule::Per => "per",
            EncodingRule::Uper => "uper",
        }
    }
}

impl fmt::Display for EncodingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the size report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    JsonGzip,
    Asn1(EncodingRule),
}

impl Encoding {
    /// All measured encodings in report order.
    pub fn all() -> [Encoding; 5] {
        [
            Encoding::Json,
            Encoding::JsonGzip,
            Encoding::Asn1(EncodingRule::Der),
            Encoding::Asn1(EncodingRule::Per),
            Encoding::Asn1(EncodingRule::Uper),
        ]
    }

    /// Label printed in the `Encoding` column.
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::JsonGzip => "json + gzip -n9",
            Encoding::Asn1(rule) => rule.as_str(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Encoding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
