// src/watch/hash.rs

use std::io;
use std::path::Path;

use blake3::Hasher;
use tracing::trace;

use crate::fs::FileSystem;

/// Hex-encoded blake3 digest of `bytes`.
pub fn compute_digest(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Read `path` through `fs` and return its contents together with their digest.
pub fn compute_file_digest(fs: &dyn FileSystem, path: &Path) -> io::Result<(Vec<u8>, String)> {
    let bytes = fs.read(path)?;
    let digest = compute_digest(&bytes);
    trace!(path = ?path, digest = %digest, "hashed file");
    Ok((bytes, digest))
}
