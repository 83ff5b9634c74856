use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::services::ports::{ConnectionStatus, Listener, Payload};

struct Registration {
    listener: Listener,
    once: bool,
}

/// Status machine and listener table shared by the concrete datasources.
pub struct DatasourceCore {
    name: &'static str,
    status: Mutex<ConnectionStatus>,
    listeners: Mutex<FxHashMap<CompactString, Vec<Registration>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DatasourceCore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            status: Mutex::new(ConnectionStatus::Initial),
            listeners: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> ConnectionStatus {
        *lock(&self.status)
    }

    pub fn on(&self, channel: &str, listener: Listener) {
        self.register(channel, listener, false);
    }

    pub fn once(&self, channel: &str, listener: Listener) {
        self.register(channel, listener, true);
    }

    fn register(&self, channel: &str, listener: Listener, once: bool) {
        lock(&self.listeners)
            .entry(CompactString::from(channel))
            .or_default()
            .push(Registration { listener, once });
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        lock(&self.listeners).get(channel).map_or(0, Vec::len)
    }

    /// Moves to `next` and fires its lifecycle channel. Returns `false` when
    /// the status did not change.
    pub fn transition(&self, next: ConnectionStatus) -> bool {
        let prev = {
            let mut status = lock(&self.status);
            let prev = *status;
            if prev == next {
                return false;
            }
            *status = next;
            prev
        };
        tracing::debug!(datasource = self.name, from = %prev, to = %next, "status changed");
        if let Some(channel) = next.channel() {
            self.dispatch(channel, Payload::Null);
        }
        true
    }

    /// Invokes the listeners of `channel`; `once` listeners are dropped first.
    pub fn dispatch(&self, channel: &str, payload: Payload) {
        let listeners: Vec<Listener> = {
            let mut table = lock(&self.listeners);
            let Some(regs) = table.get_mut(channel) else {
                return;
            };
            let listeners = regs.iter().map(|r| r.listener.clone()).collect();
            regs.retain(|r| !r.once);
            if regs.is_empty() {
                table.remove(channel);
            }
            listeners
        };
        for listener in listeners {
            listener(payload.clone());
        }
    }

    /// Runs a connect handshake bounded by `window`.
    pub async fn connect_within<F>(&self, window: Duration, handshake: F) -> bool
    where
        F: Future<Output = bool>,
    {
        match tokio::time::timeout(window, handshake).await {
            Ok(true) => {
                self.transition(ConnectionStatus::Connected);
                true
            }
            Ok(false) => {
                self.transition(ConnectionStatus::Disconnected);
                false
            }
            Err(_) => {
                tracing::warn!(
                    datasource = self.name,
                    timeout_ms = window.as_millis() as u64,
                    "connect timed out"
                );
                self.transition(ConnectionStatus::Timeouted);
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/adapters/base.rs"]
mod tests;
