use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use config_reloader::errors::{ReloaderError, Result};
use config_reloader::reload::ReloadTrigger;
use tokio_util::sync::CancellationToken;

type Observer = Arc<dyn Fn() -> Option<Vec<u8>> + Send + Sync>;

/// A fake reload trigger that:
/// - counts calls
/// - succeeds or fails according to a script (then succeeds)
/// - optionally blocks until cancelled
/// - optionally snapshots some state (e.g. the rendered file) at call time
#[derive(Clone, Default)]
pub struct FakeTrigger {
    calls: Arc<Mutex<usize>>,
    script: Arc<Mutex<VecDeque<bool>>>,
    hang: bool,
    observer: Option<Observer>,
    observed: Arc<Mutex<Vec<Option<Vec<u8>>>>>,
}

impl FakeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits until the token is cancelled.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Queue outcomes for the next calls (`true` = success).
    pub fn script(self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.script.lock().unwrap().extend(outcomes);
        self
    }

    pub fn with_observer<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(f));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn observed(&self) -> Vec<Option<Vec<u8>>> {
        self.observed.lock().unwrap().clone()
    }
}

impl ReloadTrigger for FakeTrigger {
    fn trigger<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            *self.calls.lock().unwrap() += 1;
            if let Some(observer) = &self.observer {
                let seen = observer();
                self.observed.lock().unwrap().push(seen);
            }

            if self.hang {
                cancel.cancelled().await;
                return Err(ReloaderError::Cancelled);
            }

            let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(())
            } else {
                Err(ReloaderError::ReloadFailed {
                    url: "fake://reload".into(),
                    attempts: 1,
                    last_error: "scripted failure".into(),
                })
            }
        })
    }
}
