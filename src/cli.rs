// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flag names match the ones operators already pass to the reloader sidecar
//! in pod specs, so existing manifests keep working.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

/// Default reload endpoint (Prometheus-style lifecycle API).
pub const DEFAULT_RELOAD_URL: &str = "http://127.0.0.1:9090/-/reload";

/// Default variable the statefulset ordinal is parsed from.
pub const DEFAULT_ORDINAL_SOURCE_VAR: &str = "POD_NAME";

/// Command-line arguments for `config-reloader`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "config-reloader",
    version,
    about = "Render a config file with environment substitution and trigger a server reload when it changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Config file watched by the reloader.
    #[arg(long, value_name = "PATH")]
    pub config_file: PathBuf,

    /// Output file for the environment-variable substituted config file.
    ///
    /// When omitted, the source file is only watched and no rendering happens.
    #[arg(long, value_name = "PATH")]
    pub config_envsubst_file: Option<PathBuf>,

    /// Reload URL to trigger the target server's reload on.
    #[arg(long, value_name = "URL", default_value = DEFAULT_RELOAD_URL)]
    pub reload_url: Url,

    /// Parse this environment variable to create STATEFULSET_ORDINAL_NUMBER,
    /// containing the statefulset ordinal number.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ORDINAL_SOURCE_VAR)]
    pub statefulset_ordinal_from_envvar: String,

    /// Log format to use.
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = LogFormat::Logfmt)]
    pub log_format: LogFormat,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CONFIG_RELOADER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// How often the source file is checked for changes (e.g. `30s`, `3m`).
    #[arg(long, value_name = "DURATION", default_value = "3m", value_parser = parse_duration)]
    pub watch_interval: Duration,

    /// Timeout for a single reload request.
    #[arg(long, value_name = "DURATION", default_value = "5s", value_parser = parse_duration)]
    pub reload_timeout: Duration,

    /// Number of reload attempts before a cycle is reported as failed.
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub reload_max_attempts: u32,

    /// Delay before the first reload retry; doubles on every further retry.
    #[arg(long, value_name = "DURATION", default_value = "1s", value_parser = parse_duration)]
    pub reload_retry_interval: Duration,

    /// How long the source file may stay unreadable at startup before the
    /// reloader gives up. `0s` waits forever.
    #[arg(long, value_name = "DURATION", default_value = "0s", value_parser = parse_duration)]
    pub startup_grace_period: Duration,

    /// Run a single render/reload cycle and exit.
    #[arg(long)]
    pub once: bool,
}

/// Output format of the log stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Logfmt,
    Json,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
///
/// On invalid arguments clap prints the usage error and exits with status 2.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Value parser for the interval and timeout flags (`--watch-interval 3m`,
/// `--reload-timeout 500ms`). A bare number is rejected so `--watch-interval 3`
/// cannot silently mean three seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{raw}' needs a unit (ms, s, m or h)"))?;
    let (amount, unit) = raw.split_at(split);

    let amount: u64 = amount
        .parse()
        .map_err(|e| format!("invalid duration '{raw}': {e}"))?;

    let secs_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(amount)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => {
            return Err(format!(
                "unknown duration unit '{other}' in '{raw}'; use ms, s, m or h"
            ));
        }
    };
    amount
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{raw}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sidecar_conventions() {
        let args = CliArgs::try_parse_from(["config-reloader", "--config-file", "prom.yaml"])
            .unwrap();

        assert_eq!(args.reload_url.as_str(), DEFAULT_RELOAD_URL);
        assert_eq!(args.statefulset_ordinal_from_envvar, "POD_NAME");
        assert_eq!(args.log_format, LogFormat::Logfmt);
        assert_eq!(args.watch_interval, Duration::from_secs(180));
        assert_eq!(args.reload_max_attempts, 5);
        assert!(args.config_envsubst_file.is_none());
        assert!(!args.once);
    }

    #[test]
    fn rejects_bad_url_and_unknown_log_format() {
        assert!(
            CliArgs::try_parse_from([
                "config-reloader",
                "--config-file",
                "a",
                "--reload-url",
                "not a url",
            ])
            .is_err()
        );
        assert!(
            CliArgs::try_parse_from([
                "config-reloader",
                "--config-file",
                "a",
                "--log-format",
                "xml",
            ])
            .is_err()
        );
    }

    #[test]
    fn parses_duration_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
    }
}
