// src/engine/mod.rs

//! The watch-render-reload loop.
//!
//! The pure decision logic (what an error means for the loop, the startup
//! grace period) lives in [`core`] and is tested without Tokio or a
//! filesystem. The async IO shell that polls, renders, writes and triggers is
//! [`orchestrator`].

use chrono::{DateTime, Utc};

pub mod core;
pub mod orchestrator;

pub use self::core::{disposition, Disposition, StartupGrace};
pub use orchestrator::Orchestrator;

/// Stage of a render cycle. A cycle walks
/// `Idle -> Rendering -> Writing -> Triggering -> Idle`; any failure returns
/// straight to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    Rendering,
    Writing,
    Triggering,
}

/// What the last cycle wrote. Never persisted; a restarted process always
/// runs a full cycle first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSnapshot {
    pub source_digest: String,
    /// Digest of the bytes written to the rendered path (equal to
    /// `source_digest` when nothing is rendered).
    pub rendered_digest: String,
    pub last_rendered_at: DateTime<Utc>,
    /// The target server acknowledged a reload of `rendered_digest`.
    pub reloaded: bool,
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Source and rendered file unchanged; nothing to do.
    Unchanged,
    /// Source changed but renders to the same output; no write, no reload.
    RenderUnchanged,
    /// Output written and reload triggered.
    Reloaded { rendered_digest: String },
}
