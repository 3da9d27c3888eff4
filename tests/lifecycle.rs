mod common;
use crate::common::{init_tracing, mock_spec, wait_until, with_timeout, FakeTrigger, RENDERED, SOURCE};

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use config_reloader::engine::Orchestrator;
use config_reloader::errors::ReloaderError;
use config_reloader::fs::mock::MockFileSystem;
use config_reloader::render::Environment;
use config_reloader::supervise;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn loop_reacts_to_changes_and_stops_cleanly_on_cancel() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SOURCE, "v: ${V}");
    let trigger = FakeTrigger::new();
    let env = Environment::new().with_var("V", "1");
    let orch = Orchestrator::new(mock_spec(), env, Arc::new(fs.clone()), trigger.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(supervise(orch, cancel.clone()));

    // Startup cycle.
    wait_until("startup reload", || trigger.calls() == 1).await;
    assert_eq!(fs.contents(RENDERED).as_deref(), Some(&b"v: 1"[..]));

    // A few idle ticks must not reload again.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(trigger.calls(), 1);

    fs.add_file(SOURCE, "v: ${V} # edited");
    wait_until("reload after edit", || trigger.calls() == 2).await;
    assert_eq!(fs.contents(RENDERED).as_deref(), Some(&b"v: 1 # edited"[..]));

    cancel.cancel();
    with_timeout(handle).await??;
    Ok(())
}

#[tokio::test]
async fn cancel_while_waiting_on_long_interval_returns_promptly() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SOURCE, "a: b");
    let trigger = FakeTrigger::new();
    let spec = mock_spec().with_poll_interval(Duration::from_secs(3600));
    let orch = Orchestrator::new(spec, Environment::new(), Arc::new(fs.clone()), trigger.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(supervise(orch, cancel.clone()));
    wait_until("startup reload", || trigger.calls() == 1).await;

    let started = Instant::now();
    cancel.cancel();
    with_timeout(handle).await??;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(fs.write_count(), 1);
    Ok(())
}

#[tokio::test]
async fn cancel_during_hanging_reload_exits_cleanly() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SOURCE, "a: b");
    let trigger = FakeTrigger::hanging();
    let orch = Orchestrator::new(mock_spec(), Environment::new(), Arc::new(fs.clone()), trigger.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(supervise(orch, cancel.clone()));
    wait_until("reload in flight", || trigger.calls() == 1).await;

    cancel.cancel();
    with_timeout(handle).await??;
    assert_eq!(fs.contents(RENDERED).as_deref(), Some(&b"a: b"[..]));
    Ok(())
}

#[tokio::test]
async fn unreadable_source_past_grace_period_is_fatal() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    let trigger = FakeTrigger::new();
    let spec = mock_spec().with_startup_grace_period(Duration::from_millis(100));
    let orch = Orchestrator::new(spec, Environment::new(), Arc::new(fs), trigger.clone());

    let err = with_timeout(supervise(orch, CancellationToken::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ReloaderError::ConfigurationError(_)));
    assert_eq!(trigger.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn source_appearing_within_grace_period_is_picked_up() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    let trigger = FakeTrigger::new();
    let spec = mock_spec().with_startup_grace_period(Duration::from_secs(2));
    let orch = Orchestrator::new(spec, Environment::new(), Arc::new(fs.clone()), trigger.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(supervise(orch, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(trigger.calls(), 0);
    fs.add_file(SOURCE, "late: true");
    wait_until("reload once source exists", || trigger.calls() == 1).await;

    // Grace no longer applies once the source has been read.
    fs.remove_file(SOURCE);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());

    cancel.cancel();
    with_timeout(handle).await??;
    Ok(())
}

#[tokio::test]
async fn cancel_while_source_read_is_stuck_returns_promptly() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(SOURCE, "a: b");
    fs.set_read_delay(Duration::from_secs(1));
    let trigger = FakeTrigger::new();
    let orch = Orchestrator::new(mock_spec(), Environment::new(), Arc::new(fs.clone()), trigger.clone());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(supervise(orch, cancel.clone()));

    // Let the startup poll get stuck inside the read.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    cancel.cancel();
    with_timeout(handle).await??;

    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(trigger.calls(), 0);
    assert_eq!(fs.write_count(), 0);
    Ok(())
}
