// src/logging.rs

//! Logging setup for `config-reloader` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CONFIG_RELOADER_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs go to STDERR. `logfmt` emits `ts= level= target= msg=` followed by
//! the event's fields, quoting values that contain spaces; `json` emits one
//! object per line.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{self, format, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::cli::{LogFormat, LogLevel};

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "CONFIG_RELOADER_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(format: LogFormat, cli_level: Option<LogLevel>) -> Result<()> {
    let level = effective_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    let builder = fmt::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Logfmt => builder.with_ansi(false).event_format(Logfmt).try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Event formatter producing one logfmt line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logfmt;

impl<S, N> FormatEvent<S, N> for Logfmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        write!(
            writer,
            "ts={} level={} target={}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            meta.level().to_string().to_lowercase(),
            quote(meta.target()),
        )?;
        if let Some(msg) = &fields.message {
            write!(writer, " msg={}", quote(msg))?;
        }
        for (key, value) in &fields.pairs {
            write!(writer, " {}={}", key, quote(value))?;
        }
        writeln!(writer)
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    pairs: Vec<(&'static str, String)>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.pairs.push((field.name(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut rendered = String::new();
        let _ = write!(rendered, "{value:?}");
        self.push(field, rendered);
    }
}

/// Quote a logfmt value when it is empty or contains spaces, `=`, quotes or
/// control characters.
fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '=' || c == '"' || c.is_control());
    if needs_quotes {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}

fn effective_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Run `f` with a logfmt subscriber installed for the current thread and
/// return everything it logged.
#[cfg(test)]
pub(crate) fn capture_logfmt(f: impl FnOnce()) -> String {
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let sink = Sink(Arc::new(Mutex::new(Vec::new())));
    let writer = sink.clone();
    let subscriber = fmt::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .event_format(Logfmt)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = sink.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logfmt_line_carries_keys_and_quotes_values() {
        let out = capture_logfmt(|| {
            tracing::warn!(
                url = "http://127.0.0.1:9090/-/reload",
                attempt = 2,
                error = %"request error: timed out",
                "reload attempt failed"
            );
        });

        let line = out.lines().next().unwrap();
        assert!(line.starts_with("ts="), "{line}");
        assert!(
            line.contains(
                " level=warn target=config_reloader::logging::tests \
                 msg=\"reload attempt failed\" url=http://127.0.0.1:9090/-/reload \
                 attempt=2 error=\"request error: timed out\""
            ),
            "{line}"
        );
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("a=b"), "\"a=b\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn cli_flag_wins_over_env() {
        assert_eq!(
            effective_level(Some(LogLevel::Debug), Some("error")),
            tracing::Level::DEBUG
        );
        assert_eq!(effective_level(None, Some(" Warning ")), tracing::Level::WARN);
        assert_eq!(effective_level(None, Some("loud")), tracing::Level::INFO);
        assert_eq!(effective_level(None, None), tracing::Level::INFO);
    }
}
