#![allow(dead_code)]

use std::time::Duration;

use config_reloader::config::WatchSpec;
use config_reloader::reload::RetryConfig;
use url::Url;

pub use config_reloader_test_utils::{
    init_tracing, wait_until, with_timeout, FakeTrigger, ScriptedEndpoint,
};

pub const SOURCE: &str = "/etc/prometheus/prometheus.yaml.tmpl";
pub const RENDERED: &str = "/etc/prometheus_out/prometheus.yaml";

/// Spec against the in-memory filesystem paths above.
pub fn mock_spec() -> WatchSpec {
    WatchSpec::new(SOURCE, Url::parse("http://127.0.0.1:9090/-/reload").unwrap())
        .with_rendered_path(RENDERED)
        .with_poll_interval(Duration::from_millis(20))
}

/// Retry schedule short enough for tests against a real socket.
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
    }
}
