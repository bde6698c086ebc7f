//! Debounced task scheduling.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{ProductSearch, SearchOutcome, SearchState};

/// Runs a task once its delay passes without a newer task being scheduled.
///
/// Scheduling aborts the previously scheduled task, whether it is still
/// waiting out its delay or already running. Must be used from within a
/// Tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with nothing scheduled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing whatever was scheduled before.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the scheduled task, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Debounced product search publishing its progress on a watch channel.
pub struct SearchDebouncer<S> {
    searcher: Arc<S>,
    debouncer: Debouncer,
    state: Arc<watch::Sender<SearchState>>,
}

impl<S: ProductSearch> SearchDebouncer<S> {
    /// Create a debounced search over `searcher`.
    pub fn new(searcher: S) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            searcher: Arc::new(searcher),
            debouncer: Debouncer::new(),
            state: Arc::new(state),
        }
    }

    /// Search for `query` once `delay` passes with no newer query.
    pub fn schedule(&self, query: impl Into<String>, delay: Duration) {
        let query = query.into();
        debug!(query = %query, delay_ms = delay.as_millis(), "Search scheduled");

        let searcher = Arc::clone(&self.searcher);
        let state = Arc::clone(&self.state);

        self.debouncer.schedule(delay, async move {
            state.send_replace(SearchState::Loading {
                query: query.clone(),
            });
            let outcome = SearchOutcome::from_result(searcher.search_products(&query).await);
            state.send_replace(SearchState::Done { query, outcome });
        });
    }

    /// Subscribe to search progress.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }
}
