//! SHA-256 content fingerprints.
use std::fmt::Write as _;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::operations::FileSystemOps;

/// Lowercase hex SHA-256 of `content`.
#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// SHA-256 of the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_sha256(fs: &dyn FileSystemOps, path: &Path) -> io::Result<String> {
    fs.read_to_string(path).map(|s| sha256_hex(s.as_bytes()))
}
