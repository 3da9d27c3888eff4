// src/fs/mod.rs

//! Filesystem access used by the orchestrator.
//!
//! The destination file is only ever replaced through
//! [`FileSystem::write_atomic`], so a concurrent reader (the target server)
//! sees either the previous or the new content in full.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Read the whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace `path` with `contents` so readers never observe a partial file.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    /// Write to a temp file next to `path`, fsync it, then rename it over
    /// `path`. The temp file lives in the same directory so the rename never
    /// crosses a filesystem boundary.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;

        // Temp files are created 0600; keep the previous file's mode, or
        // fall back to world-readable so the target server can read it.
        match fs::metadata(path) {
            Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
            Err(_) => set_default_permissions(tmp.as_file())?,
        }

        tmp.persist(path).map_err(|e| e.error)?;
        debug!(path = ?path, bytes = contents.len(), "atomically replaced file");
        Ok(())
    }
}

/// Run a filesystem call on Tokio's blocking pool so a slow disk never
/// stalls the runtime's worker threads.
pub async fn run_blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| io::Error::other(format!("blocking filesystem task failed: {e}")))?
}

#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");
        let fs = RealFileSystem;

        fs.write_atomic(&path, b"first").unwrap();
        assert_eq!(fs.read(&path).unwrap(), b"first");

        fs.write_atomic(&path, b"second, longer content").unwrap();
        assert_eq!(fs.read(&path).unwrap(), b"second, longer content");

        // Only the destination remains; no temp files leak.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn run_blocking_passes_results_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");

        let target = path.clone();
        run_blocking(move || RealFileSystem.write_atomic(&target, b"x"))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"x");

        let missing = dir.path().join("nope");
        let err = run_blocking(move || RealFileSystem.read(&missing)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn write_atomic_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.yaml");

        assert!(RealFileSystem.write_atomic(&path, b"x").is_err());
        assert!(!path.exists());
    }
}
