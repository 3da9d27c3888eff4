// src/engine/core.rs

//! Pure decision logic for the orchestrator.
//!
//! Nothing here performs IO or touches Tokio's runtime; time is passed in.

use std::time::Duration;

use tokio::time::Instant;

use crate::errors::ReloaderError;

/// How the run loop treats a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient; try the same content again on the next tick.
    RetryNextTick,
    /// This content cannot succeed as-is; wait for the source to change.
    WaitForChange,
    /// Cancellation observed; leave the loop cleanly.
    Shutdown,
    /// Leave the loop with an error.
    Fatal,
}

pub fn disposition(err: &ReloaderError) -> Disposition {
    match err {
        ReloaderError::SourceUnavailable { .. }
        | ReloaderError::WriteFailure { .. }
        | ReloaderError::Io(_)
        | ReloaderError::Other(_) => Disposition::RetryNextTick,
        ReloaderError::MissingVariable { .. } | ReloaderError::ReloadFailed { .. } => {
            Disposition::WaitForChange
        }
        ReloaderError::Cancelled => Disposition::Shutdown,
        ReloaderError::ConfigurationError(_) => Disposition::Fatal,
    }
}

/// Tracks whether the source has become readable within the startup grace
/// period.
///
/// Once any poll reads the source, the grace period is over for good; later
/// read failures are always transient.
#[derive(Debug, Clone)]
pub struct StartupGrace {
    deadline: Option<Instant>,
    source_seen: bool,
}

impl StartupGrace {
    pub fn new(started_at: Instant, grace: Option<Duration>) -> Self {
        Self {
            deadline: grace.map(|g| started_at + g),
            source_seen: false,
        }
    }

    /// Feed the result of a poll. Returns a fatal configuration error when
    /// the source is still unreadable after the deadline.
    pub fn observe(&mut self, result: Result<(), &ReloaderError>, now: Instant) -> Option<ReloaderError> {
        match result {
            Err(ReloaderError::SourceUnavailable { path, source }) if !self.source_seen => {
                let deadline = self.deadline?;
                (now >= deadline).then(|| {
                    ReloaderError::ConfigurationError(format!(
                        "source config {:?} still unreadable after startup grace period: {}",
                        path, source
                    ))
                })
            }
            Err(ReloaderError::SourceUnavailable { .. }) => None,
            _ => {
                self.source_seen = true;
                None
            }
        }
    }

    pub fn source_seen(&self) -> bool {
        self.source_seen
    }
}
