// src/watch/detector.rs

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{ReloaderError, Result};
use crate::fs::{run_blocking, FileSystem};
use crate::watch::hash::compute_file_digest;

/// Source bytes read during a poll, with their digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContent {
    pub bytes: Vec<u8>,
    pub digest: String,
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Source digest equals the last processed one and the rendered file is
    /// intact.
    Unchanged,
    /// Source content differs from the last processed content (always the
    /// case before anything has been processed).
    Source(SourceContent),
    /// Source is unchanged but the rendered file no longer matches what was
    /// last written to it.
    RenderedDrift(SourceContent),
}

/// Poll-based content change detector.
///
/// Keeps the digest of the last successfully processed source content; the
/// orchestrator reports success through [`ChangeDetector::mark_processed`].
#[derive(Debug)]
pub struct ChangeDetector {
    fs: Arc<dyn FileSystem>,
    source_path: PathBuf,
    rendered_path: Option<PathBuf>,
    last_processed: Option<String>,
}

impl ChangeDetector {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        source_path: impl Into<PathBuf>,
        rendered_path: Option<PathBuf>,
    ) -> Self {
        Self {
            fs,
            source_path: source_path.into(),
            rendered_path,
            last_processed: None,
        }
    }

    /// Record `digest` as processed; polls report `Unchanged` until the source
    /// content differs from it.
    pub fn mark_processed(&mut self, digest: &str) {
        self.last_processed = Some(digest.to_string());
    }

    /// Read and hash the source, and compare against the last processed
    /// digest.
    ///
    /// `expected_rendered` is the digest of what was last written to the
    /// rendered path; when given, a rendered file that is missing or differs
    /// is reported as [`Change::RenderedDrift`].
    pub async fn poll(&self, expected_rendered: Option<&str>) -> Result<Change> {
        let (bytes, digest) = self
            .read_digest(&self.source_path)
            .await
            .map_err(|source| ReloaderError::SourceUnavailable {
                path: self.source_path.clone(),
                source,
            })?;

        if self.last_processed.as_deref() != Some(digest.as_str()) {
            debug!(
                path = ?self.source_path,
                previous = ?self.last_processed,
                digest = %digest,
                "source content changed"
            );
            return Ok(Change::Source(SourceContent { bytes, digest }));
        }

        if let (Some(rendered_path), Some(expected)) = (&self.rendered_path, expected_rendered) {
            let actual = self
                .read_digest(rendered_path)
                .await
                .ok()
                .map(|(_, d)| d);
            if actual.as_deref() != Some(expected) {
                info!(
                    path = ?rendered_path,
                    expected = %expected,
                    actual = ?actual,
                    "rendered config drifted from last render"
                );
                return Ok(Change::RenderedDrift(SourceContent { bytes, digest }));
            }
        }

        Ok(Change::Unchanged)
    }

    async fn read_digest(&self, path: &Path) -> io::Result<(Vec<u8>, String)> {
        let fs = Arc::clone(&self.fs);
        let path = path.to_path_buf();
        run_blocking(move || compute_file_digest(fs.as_ref(), &path)).await
    }
}
