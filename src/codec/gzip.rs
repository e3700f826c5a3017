//! In-process gzip backend
//!
//! Produces the same stream layout as `gzip -n9`: maximum deflate level, no
//! stored file name and a zero modification time in the member header.

use crate::error::Result;
use flate2::{Compression, GzBuilder};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAX_LEVEL: u32 = 9;

/// Location of the compressed artifact for `path` (`<path>.gz`).
pub fn gz_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Compresses the file at `path`, overwrites `<path>.gz` and returns the
/// compressed bytes.
pub fn gzip_file(path: &Path, level: u32) -> Result<Vec<u8>> {
    let data = fs::read(path)?;

    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(data.len() / 2 + 64), Compression::new(level));
    encoder.write_all(&data)?;
    let compressed = encoder.finish()?;

    fs::write(gz_path(path), &compressed)?;
    Ok(compressed)
}
