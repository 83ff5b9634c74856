//! Composite datasource that settles on the first candidate able to start.
//!
//! Candidates are probed one after another in declaration order; the first
//! `init() == true` becomes the delegate for the rest of the wrapper's life
//! and later candidates are never touched. Until then `on`/`once` are queued
//! and replayed onto the delegate in order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::services::ports::{
    AsynchronousDatasource, ConnectionStatus, Datasource, Listener, Payload,
};

enum Queued {
    On(String, Listener),
    Once(String, Listener),
}

#[derive(Default)]
struct AdaptiveState {
    active: Option<Arc<dyn AsynchronousDatasource>>,
    queued: Vec<Queued>,
}

pub struct AdaptiveAsyncDatasource {
    candidates: Vec<Arc<dyn AsynchronousDatasource>>,
    candidate_timeout: Option<Duration>,
    state: Mutex<AdaptiveState>,
    probe: tokio::sync::Mutex<()>,
}

impl AdaptiveAsyncDatasource {
    pub fn new(candidates: Vec<Arc<dyn AsynchronousDatasource>>) -> Self {
        Self {
            candidates,
            candidate_timeout: None,
            state: Mutex::new(AdaptiveState::default()),
            probe: tokio::sync::Mutex::new(()),
        }
    }

    /// Treats a candidate whose `init` does not finish within `timeout` as
    /// failed.
    pub fn with_candidate_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.candidate_timeout = timeout;
        self
    }

    fn state(&self) -> MutexGuard<'_, AdaptiveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn active(&self) -> Option<Arc<dyn AsynchronousDatasource>> {
        self.state().active.clone()
    }

    pub fn queued_len(&self) -> usize {
        self.state().queued.len()
    }

    async fn try_candidate(&self, candidate: &Arc<dyn AsynchronousDatasource>) -> bool {
        match self.candidate_timeout {
            Some(window) => match tokio::time::timeout(window, candidate.init()).await {
                Ok(ok) => ok,
                Err(_) => {
                    tracing::warn!(
                        candidate = candidate.name(),
                        timeout_ms = window.as_millis() as u64,
                        "candidate init timed out"
                    );
                    false
                }
            },
            None => candidate.init().await,
        }
    }

    fn adopt(&self, candidate: Arc<dyn AsynchronousDatasource>) {
        let mut state = self.state();
        let queued = std::mem::take(&mut state.queued);
        let status_channel = candidate.status().channel();
        // Lifecycle listeners queued before adoption missed the transition
        // that happened inside `init`; they get it once here.
        let mut missed = Vec::new();
        for entry in queued {
            match entry {
                Queued::On(channel, listener) => {
                    if Some(channel.as_str()) == status_channel {
                        missed.push(Arc::clone(&listener));
                    }
                    candidate.on(&channel, listener);
                }
                Queued::Once(channel, listener) => {
                    if Some(channel.as_str()) == status_channel {
                        missed.push(listener);
                    } else {
                        candidate.once(&channel, listener);
                    }
                }
            }
        }
        state.active = Some(candidate);
        drop(state);
        for listener in missed {
            listener(Payload::Null);
        }
    }
}

impl Datasource for AdaptiveAsyncDatasource {
    fn name(&self) -> &str {
        "adaptive"
    }

    fn status(&self) -> ConnectionStatus {
        self.active()
            .map_or(ConnectionStatus::Initial, |active| active.status())
    }

    fn on(&self, channel: &str, listener: Listener) {
        let mut state = self.state();
        match state.active.clone() {
            Some(active) => {
                drop(state);
                active.on(channel, listener);
            }
            None => state.queued.push(Queued::On(channel.to_string(), listener)),
        }
    }

    fn once(&self, channel: &str, listener: Listener) {
        let mut state = self.state();
        match state.active.clone() {
            Some(active) => {
                drop(state);
                active.once(channel, listener);
            }
            None => state
                .queued
                .push(Queued::Once(channel.to_string(), listener)),
        }
    }
}

impl AsynchronousDatasource for AdaptiveAsyncDatasource {
    fn init(&self) -> BoxFuture<'_, bool> {
        async move {
            let _probe = self.probe.lock().await;
            if self.active().is_some() {
                return true;
            }
            for candidate in &self.candidates {
                if self.try_candidate(candidate).await {
                    tracing::info!(
                        candidate = candidate.name(),
                        status = %candidate.status(),
                        "adaptive datasource selected"
                    );
                    self.adopt(Arc::clone(candidate));
                    return true;
                }
                tracing::debug!(candidate = candidate.name(), "candidate unavailable");
            }
            tracing::warn!(
                candidates = self.candidates.len(),
                "no datasource candidate could be initialized"
            );
            false
        }
        .boxed()
    }

    fn connect(&self) -> BoxFuture<'_, bool> {
        match self.active() {
            Some(active) => async move { active.connect().await }.boxed(),
            None => futures::future::ready(false).boxed(),
        }
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        match self.active() {
            Some(active) => async move { active.disconnect().await }.boxed(),
            None => futures::future::ready(()).boxed(),
        }
    }

    fn send<'a>(&'a self, channel: &'a str, payload: Payload) -> BoxFuture<'a, bool> {
        match self.active() {
            Some(active) => async move { active.send(channel, payload).await }.boxed(),
            None => futures::future::ready(false).boxed(),
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/adapters/adaptive.rs"]
mod tests;
