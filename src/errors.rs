// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant except `ConfigurationError` describes a per-cycle failure:
//! the orchestrator logs it and carries on with the next poll tick.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloaderError {
    #[error("source config {path:?} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing environment variable referenced by config: {name}")]
    MissingVariable { name: String },

    #[error("writing rendered config {path:?} failed: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reload via {url} failed after {attempts} attempt(s): {last_error}")]
    ReloadFailed {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReloaderError>;
