// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod reload;
pub mod render;
pub mod watch;

use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::WatchSpec;
use crate::engine::Orchestrator;
use crate::errors::{ReloaderError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::reload::{HttpReloadTrigger, ReloadTrigger};
use crate::render::Environment;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config validation (fatal on error, before anything runs)
/// - the environment snapshot, including the derived ordinal
/// - the HTTP reload trigger
/// - the orchestrator loop under a cancellation token
/// - SIGINT / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let spec = WatchSpec::try_from(&args)?;

    let mut env = Environment::from_process();
    env.insert_ordinal_from(&args.statefulset_ordinal_from_envvar);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting config-reloader"
    );

    let trigger = HttpReloadTrigger::new(spec.reload_url.clone(), spec.reload_timeout, spec.retry)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let orchestrator = Orchestrator::new(spec, env, fs, trigger);

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone())?;

    if args.once {
        return run_single_cycle(orchestrator, &cancel).await;
    }

    supervise(orchestrator, cancel).await
}

/// Run the orchestrator loop on its own task and wait for it.
///
/// Cancelling `cancel` makes the loop return `Ok(())`; any error it returns
/// is passed through so the caller can exit non-zero.
pub async fn supervise<T>(orchestrator: Orchestrator<T>, cancel: CancellationToken) -> Result<()>
where
    T: ReloadTrigger + 'static,
{
    let handle = tokio::spawn(orchestrator.run(cancel.clone()));

    let result = handle
        .await
        .map_err(|e| ReloaderError::Other(anyhow!("orchestrator task failed: {e}")));

    // Release anything else still waiting on the token.
    cancel.cancel();

    result??;
    info!("shutdown complete");
    Ok(())
}

/// `--once`: one cycle, exit status reflects its outcome.
async fn run_single_cycle<T: ReloadTrigger>(
    mut orchestrator: Orchestrator<T>,
    cancel: &CancellationToken,
) -> Result<()> {
    match orchestrator.poll_once(cancel).await {
        Ok(outcome) => {
            info!(?outcome, "single cycle complete");
            Ok(())
        }
        Err(ReloaderError::Cancelled) => Ok(()),
        Err(err) => Err(err),
    }
}

fn spawn_signal_listener(cancel: CancellationToken) -> Result<()> {
    // Registered before the first cycle so an early SIGTERM is not lost.
    let terminate = terminate_signal()?;
    tokio::spawn(async move {
        shutdown_signal(terminate).await;
        info!("shutdown signal received");
        cancel.cancel();
    });
    Ok(())
}

#[cfg(unix)]
fn terminate_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    Ok(async move {
        sigterm.recv().await;
    })
}

#[cfg(not(unix))]
fn terminate_signal() -> Result<std::future::Pending<()>> {
    Ok(std::future::pending())
}

async fn shutdown_signal(terminate: impl Future<Output = ()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
