// src/render/environment.rs

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

/// Variable the derived ordinal is published under.
pub const STATEFULSET_ORDINAL_VAR: &str = "STATEFULSET_ORDINAL_NUMBER";

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+$").expect("static regex is valid"));

/// Snapshot of environment variables available to the renderer.
///
/// The snapshot is taken once at startup. Derived values (the ordinal) are
/// added to the snapshot instead of being written back into the process
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Environment::set`].
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Derive `STATEFULSET_ORDINAL_NUMBER` from the trailing digits of
    /// `from_name` and store it in the snapshot.
    ///
    /// A missing variable or a value without trailing digits yields an empty
    /// ordinal and a warning; it never fails startup.
    pub fn insert_ordinal_from(&mut self, from_name: &str) -> String {
        let Some(value) = self.get(from_name) else {
            warn!(
                var = %from_name,
                target_var = STATEFULSET_ORDINAL_VAR,
                "ordinal source variable is not set; setting empty value"
            );
            self.set(STATEFULSET_ORDINAL_VAR, "");
            return String::new();
        };
        let ordinal = extract_ordinal(value);

        if ordinal.is_empty() {
            warn!(
                var = %from_name,
                target_var = STATEFULSET_ORDINAL_VAR,
                "no trailing ordinal found; setting empty value"
            );
        } else {
            info!(
                var = %from_name,
                target_var = STATEFULSET_ORDINAL_VAR,
                ordinal = %ordinal,
                "derived statefulset ordinal"
            );
        }

        self.set(STATEFULSET_ORDINAL_VAR, ordinal.clone());
        ordinal
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Return the run of digits at the end of `value`, or an empty string.
pub fn extract_ordinal(value: &str) -> String {
    TRAILING_DIGITS
        .find(value)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture_logfmt;

    #[test]
    fn extracts_trailing_digits_only() {
        assert_eq!(extract_ordinal("myapp-3"), "3");
        assert_eq!(extract_ordinal("prometheus-k8s-12"), "12");
        assert_eq!(extract_ordinal("myapp"), "");
        assert_eq!(extract_ordinal("web1-x"), "");
        assert_eq!(extract_ordinal(""), "");
    }

    #[test]
    fn ordinal_is_published_into_snapshot() {
        let mut env = Environment::new().with_var("POD_NAME", "myapp-3");
        assert_eq!(env.insert_ordinal_from("POD_NAME"), "3");
        assert_eq!(env.get(STATEFULSET_ORDINAL_VAR), Some("3"));
    }

    #[test]
    fn unset_or_digitless_source_yields_empty_ordinal() {
        let mut env = Environment::new().with_var("POD_NAME", "myapp");
        assert_eq!(env.insert_ordinal_from("POD_NAME"), "");
        assert_eq!(env.get(STATEFULSET_ORDINAL_VAR), Some(""));

        let mut env = Environment::new();
        assert_eq!(env.insert_ordinal_from("HOSTNAME"), "");
        assert_eq!(env.get(STATEFULSET_ORDINAL_VAR), Some(""));
    }

    #[test]
    fn unset_source_variable_warns_once() {
        let logs = capture_logfmt(|| {
            Environment::new().insert_ordinal_from("HOSTNAME");
        });
        assert_eq!(logs.matches("level=warn").count(), 1, "{logs}");
        assert!(logs.contains("ordinal source variable is not set"), "{logs}");

        let logs = capture_logfmt(|| {
            Environment::new()
                .with_var("HOSTNAME", "myapp")
                .insert_ordinal_from("HOSTNAME");
        });
        assert_eq!(logs.matches("level=warn").count(), 1, "{logs}");
        assert!(logs.contains("no trailing ordinal found"), "{logs}");
    }
}
