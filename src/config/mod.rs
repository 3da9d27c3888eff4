// src/config/mod.rs

//! Runtime configuration of the reloader.
//!
//! [`WatchSpec`] is built once from the CLI arguments (see [`validate`]) and
//! never changes afterwards.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::reload::RetryConfig;

pub mod validate;

/// What to watch, where to render it and whom to notify.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSpec {
    /// Source-of-truth config file.
    pub source_path: PathBuf,
    /// Substituted output; `None` means the source is only watched.
    pub rendered_path: Option<PathBuf>,
    pub reload_url: Url,
    pub poll_interval: Duration,
    /// Per-request timeout for the reload call.
    pub reload_timeout: Duration,
    pub retry: RetryConfig,
    /// How long the source may stay unreadable before the first successful
    /// cycle. `None` waits forever.
    pub startup_grace_period: Option<Duration>,
}

impl WatchSpec {
    /// Minimal spec with default tuning; mostly useful for tests and
    /// embedding.
    pub fn new(source_path: impl Into<PathBuf>, reload_url: Url) -> Self {
        Self {
            source_path: source_path.into(),
            rendered_path: None,
            reload_url,
            poll_interval: Duration::from_secs(180),
            reload_timeout: Duration::from_secs(5),
            retry: RetryConfig::DEFAULT,
            startup_grace_period: None,
        }
    }

    pub fn with_rendered_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rendered_path = Some(path.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_startup_grace_period(mut self, grace: Duration) -> Self {
        self.startup_grace_period = Some(grace);
        self
    }
}
