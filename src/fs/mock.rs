// src/fs/mock.rs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::FileSystem;

/// In-memory filesystem for orchestrator tests.
///
/// Clones share the same storage, so a test can keep a handle and inspect or
/// mutate files while the orchestrator owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    fail_writes: Arc<Mutex<bool>>,
    writes: Arc<Mutex<usize>>,
    read_delay: Arc<Mutex<Duration>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.lock().unwrap();
        files.insert(path.as_ref().to_path_buf(), content.into());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().remove(path.as_ref());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Make every subsequent `write_atomic` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Block every subsequent `read` for `delay`, like a hung network mount.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = delay;
    }

    /// Number of successful `write_atomic` calls.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let delay = *self.read_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let files = self.files.lock().unwrap();
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("file not found: {:?}", path))
        })
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected write failure: {:?}", path),
            ));
        }
        self.add_file(path, contents);
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}
