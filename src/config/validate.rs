// src/config/validate.rs

use crate::cli::CliArgs;
use crate::config::WatchSpec;
use crate::errors::{ReloaderError, Result};
use crate::reload::RetryConfig;

impl TryFrom<&CliArgs> for WatchSpec {
    type Error = ReloaderError;

    fn try_from(args: &CliArgs) -> std::result::Result<Self, Self::Error> {
        let spec = WatchSpec {
            source_path: args.config_file.clone(),
            rendered_path: args.config_envsubst_file.clone(),
            reload_url: args.reload_url.clone(),
            poll_interval: args.watch_interval,
            reload_timeout: args.reload_timeout,
            retry: RetryConfig::new(args.reload_max_attempts, args.reload_retry_interval),
            startup_grace_period: (!args.startup_grace_period.is_zero())
                .then_some(args.startup_grace_period),
        };
        validate_spec(&spec)?;
        Ok(spec)
    }
}

/// Check the invariants the orchestrator relies on.
pub fn validate_spec(spec: &WatchSpec) -> Result<()> {
    validate_paths(spec)?;
    validate_reload_url(spec)?;
    validate_timing(spec)?;
    Ok(())
}

fn validate_paths(spec: &WatchSpec) -> Result<()> {
    if spec.source_path.as_os_str().is_empty() {
        return Err(config_error("--config-file must not be empty"));
    }

    let Some(rendered) = &spec.rendered_path else {
        return Ok(());
    };

    if rendered.as_os_str().is_empty() {
        return Err(config_error("--config-envsubst-file must not be empty"));
    }
    if rendered == &spec.source_path {
        return Err(config_error(format!(
            "--config-envsubst-file {:?} must differ from --config-file",
            rendered
        )));
    }
    Ok(())
}

fn validate_reload_url(spec: &WatchSpec) -> Result<()> {
    match spec.reload_url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(config_error(format!(
            "--reload-url must use http or https (got scheme '{other}')"
        ))),
    }
}

fn validate_timing(spec: &WatchSpec) -> Result<()> {
    if spec.poll_interval.is_zero() {
        return Err(config_error("--watch-interval must be greater than zero"));
    }
    if spec.reload_timeout.is_zero() {
        return Err(config_error("--reload-timeout must be greater than zero"));
    }
    if spec.retry.max_attempts == 0 {
        return Err(config_error("--reload-max-attempts must be >= 1 (got 0)"));
    }
    Ok(())
}

fn config_error(msg: impl Into<String>) -> ReloaderError {
    ReloaderError::ConfigurationError(msg.into())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["config-reloader", "--config-file", "/etc/prom/prometheus.yaml.gz"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn builds_spec_from_args() {
        let spec = WatchSpec::try_from(&args(&[
            "--config-envsubst-file",
            "/etc/prom_out/prometheus.env.yaml",
            "--watch-interval",
            "10s",
            "--reload-max-attempts",
            "3",
            "--startup-grace-period",
            "1m",
        ]))
        .unwrap();

        assert_eq!(
            spec.rendered_path,
            Some(PathBuf::from("/etc/prom_out/prometheus.env.yaml"))
        );
        assert_eq!(spec.poll_interval, Duration::from_secs(10));
        assert_eq!(spec.retry.max_attempts, 3);
        assert_eq!(spec.startup_grace_period, Some(Duration::from_secs(60)));
    }

    #[test]
    fn zero_grace_period_means_wait_forever() {
        let spec = WatchSpec::try_from(&args(&[])).unwrap();
        assert_eq!(spec.startup_grace_period, None);
    }

    #[test]
    fn rejects_invalid_combinations() {
        let cases: &[&[&str]] = &[
            &["--config-envsubst-file", "/etc/prom/prometheus.yaml.gz"],
            &["--reload-url", "ftp://127.0.0.1/reload"],
            &["--watch-interval", "0s"],
            &["--reload-timeout", "0ms"],
            &["--reload-max-attempts", "0"],
        ];

        for extra in cases {
            let err = WatchSpec::try_from(&args(extra)).unwrap_err();
            assert!(
                matches!(err, ReloaderError::ConfigurationError(_)),
                "{extra:?} gave {err:?}"
            );
        }
    }
}
