// src/engine/orchestrator.rs

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::WatchSpec;
use crate::errors::{ReloaderError, Result};
use crate::fs::{run_blocking, FileSystem};
use crate::reload::ReloadTrigger;
use crate::render::{render, Environment};
use crate::watch::{compute_digest, Change, ChangeDetector, SourceContent};

use super::core::{disposition, Disposition, StartupGrace};
use super::{CycleOutcome, CycleStage, RenderedSnapshot};

/// Drives render cycles: poll the source, render it, write it atomically,
/// then ask the target server to reload.
///
/// Cycles never overlap. The loop is a single task and a poll that takes
/// longer than the interval simply causes the missed ticks to be skipped.
pub struct Orchestrator<T: ReloadTrigger> {
    spec: WatchSpec,
    env: Environment,
    fs: Arc<dyn FileSystem>,
    detector: ChangeDetector,
    trigger: T,
    snapshot: Option<RenderedSnapshot>,
    stage: CycleStage,
}

impl<T: ReloadTrigger> fmt::Debug for Orchestrator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("spec", &self.spec)
            .field("snapshot", &self.snapshot)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl<T: ReloadTrigger> Orchestrator<T> {
    pub fn new(spec: WatchSpec, env: Environment, fs: Arc<dyn FileSystem>, trigger: T) -> Self {
        let detector = ChangeDetector::new(
            Arc::clone(&fs),
            spec.source_path.clone(),
            spec.rendered_path.clone(),
        );
        Self {
            spec,
            env,
            fs,
            detector,
            trigger,
            snapshot: None,
            stage: CycleStage::Idle,
        }
    }

    pub fn snapshot(&self) -> Option<&RenderedSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn stage(&self) -> CycleStage {
        self.stage
    }

    /// Main loop.
    ///
    /// The first tick fires immediately, so a full cycle always runs at
    /// startup. Returns `Ok(())` once `cancel` fires and an error only for
    /// fatal conditions (startup grace period exceeded).
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            source = ?self.spec.source_path,
            rendered = ?self.spec.rendered_path,
            reload_url = %self.spec.reload_url,
            interval = ?self.spec.poll_interval,
            "orchestrator started"
        );

        let mut ticker = tokio::time::interval(self.spec.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut grace = StartupGrace::new(Instant::now(), self.spec.startup_grace_period);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = self.poll_once(&cancel).await;

            if let Some(fatal) = grace.observe(result.as_ref().map(|_| ()), Instant::now()) {
                error!(error = %fatal, "giving up on source config");
                return Err(fatal);
            }

            match result {
                Ok(outcome) => debug!(?outcome, "poll finished"),
                Err(err) => match disposition(&err) {
                    Disposition::Shutdown => break,
                    Disposition::Fatal => return Err(err),
                    Disposition::RetryNextTick | Disposition::WaitForChange => {}
                },
            }
        }

        info!("cancellation observed; orchestrator stopped");
        Ok(())
    }

    /// Check for changes once and run a cycle if needed.
    ///
    /// Per-cycle errors are logged here and returned so the caller can decide
    /// what they mean (the loop carries on; `--once` exits non-zero).
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<CycleOutcome> {
        let expected_rendered = self.snapshot.as_ref().map(|s| s.rendered_digest.clone());

        // Reads run on the blocking pool; a stuck filesystem must not hold
        // up shutdown.
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReloaderError::Cancelled),
            polled = self.detector.poll(expected_rendered.as_deref()) => polled,
        };
        let change = match polled {
            Ok(change) => change,
            Err(err) => {
                warn!(error = %err, "source config unavailable; retrying next tick");
                return Err(err);
            }
        };

        let (content, drifted) = match change {
            Change::Unchanged => return Ok(CycleOutcome::Unchanged),
            Change::Source(content) => (content, false),
            Change::RenderedDrift(content) => (content, true),
        };

        let digest = content.digest.clone();
        let result = self.run_cycle(content, drifted, cancel).await;

        if let Err(err) = &result {
            let failed_stage = self.stage;
            self.stage = CycleStage::Idle;

            match disposition(err) {
                Disposition::Shutdown => {
                    info!(stage = ?failed_stage, "render cycle interrupted by shutdown");
                }
                Disposition::WaitForChange => {
                    // Retrying identical content cannot succeed; wait for an edit.
                    self.detector.mark_processed(&digest);
                    error!(
                        stage = ?failed_stage,
                        source = ?self.spec.source_path,
                        error = %err,
                        "render cycle failed; waiting for next source change"
                    );
                }
                Disposition::Fatal => {
                    error!(stage = ?failed_stage, error = %err, "render cycle failed fatally");
                }
                Disposition::RetryNextTick => {
                    error!(
                        stage = ?failed_stage,
                        source = ?self.spec.source_path,
                        rendered = ?self.spec.rendered_path,
                        error = %err,
                        "render cycle failed; retrying next tick"
                    );
                }
            }
        }

        result
    }

    async fn run_cycle(
        &mut self,
        content: SourceContent,
        drifted: bool,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome> {
        let rendered_digest = match self.spec.rendered_path.clone() {
            Some(rendered_path) => {
                self.transition(CycleStage::Rendering);
                let rendered = render(&content.bytes, &self.env)?;
                let rendered_digest = compute_digest(&rendered);

                let previous = self
                    .snapshot
                    .as_ref()
                    .filter(|s| s.rendered_digest == rendered_digest);
                match previous {
                    Some(prev) if prev.reloaded && !drifted => {
                        info!(
                            source = ?self.spec.source_path,
                            "source changed but rendered output is identical; skipping reload"
                        );
                        self.record_render(&content.digest, &rendered_digest, true);
                        self.stage = CycleStage::Idle;
                        return Ok(CycleOutcome::RenderUnchanged);
                    }
                    Some(_) if !drifted => {
                        info!(
                            source = ?self.spec.source_path,
                            "rendered output is identical but the last reload failed; reloading again"
                        );
                    }
                    _ => {}
                }

                self.transition(CycleStage::Writing);
                let fs = Arc::clone(&self.fs);
                let path = rendered_path.clone();
                // Not raced against cancellation: a started write always finishes.
                run_blocking(move || fs.write_atomic(&path, &rendered))
                    .await
                    .map_err(|source| ReloaderError::WriteFailure {
                        path: rendered_path.clone(),
                        source,
                    })?;
                info!(path = ?rendered_path, digest = %rendered_digest, "wrote rendered config");
                rendered_digest
            }
            None => content.digest.clone(),
        };

        // Recorded before triggering so a failed reload is not retried every
        // tick; `reloaded` stays false until the target acknowledges it.
        self.record_render(&content.digest, &rendered_digest, false);

        self.transition(CycleStage::Triggering);
        self.trigger.trigger(cancel).await?;

        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.reloaded = true;
        }
        self.transition(CycleStage::Idle);
        Ok(CycleOutcome::Reloaded { rendered_digest })
    }

    fn record_render(&mut self, source_digest: &str, rendered_digest: &str, reloaded: bool) {
        self.detector.mark_processed(source_digest);
        self.snapshot = Some(RenderedSnapshot {
            source_digest: source_digest.to_string(),
            rendered_digest: rendered_digest.to_string(),
            last_rendered_at: Utc::now(),
            reloaded,
        });
    }

    fn transition(&mut self, next: CycleStage) {
        debug!(from = ?self.stage, to = ?next, "cycle stage");
        self.stage = next;
    }
}
