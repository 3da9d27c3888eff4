// src/reload/mod.rs

//! Notifying the target server that its configuration changed.
//!
//! The orchestrator talks to a [`ReloadTrigger`] instead of an HTTP client
//! directly, so tests can count and script reloads without a server.
//!
//! - [`http`] holds the production trigger (POST to the reload URL).
//! - [`retry`] holds the backoff schedule shared by triggers.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::errors::Result;

pub mod http;
pub mod retry;

pub use http::HttpReloadTrigger;
pub use retry::{ReloadAttempt, RetryConfig};

/// Trait abstracting how a reload is requested.
pub trait ReloadTrigger: Send {
    /// Request a reload, retrying as the implementation sees fit.
    ///
    /// Must return [`crate::errors::ReloaderError::Cancelled`] promptly once
    /// `cancel` fires, abandoning any in-flight request.
    fn trigger<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
