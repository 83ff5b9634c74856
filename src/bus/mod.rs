//! The event bus: anchored, hierarchy-aware publish/subscribe.
//!
//! Handlers are keyed by `(anchor, event_type)`. Emitting an event walks the
//! event's type chain from the concrete type up to (excluding) the abstract
//! root and runs every handler registered at each level under the given
//! anchor. All handlers of one emission run concurrently and the emission
//! settles once every one of them has.
//!
//! A subscription under a scoped anchor is mirrored under [`Anchor::Global`],
//! so `reset_object(anchor)` tears down a widget's own set while the global
//! set keeps seeing the handler until it is explicitly unsubscribed.

pub mod handler;
pub mod pool;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::core::event::{EventRef, EventType, IntoEvent};
use crate::core::Service;
use crate::services::ports::AsyncExecutor;

pub use handler::{Handler, HandlerError, HandlerFuture, HandlerId, HandlerResult};
pub use pool::{Anchor, AnchorId};

use pool::HandlerPool;

pub type Result<T> = std::result::Result<T, BusError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    AbstractEventType(&'static str),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::AbstractEventType(name) => {
                write!(f, "event type {} is abstract and cannot be subscribed", name)
            }
        }
    }
}

impl std::error::Error for BusError {}

#[derive(Debug, Clone)]
pub struct HandlerFailure {
    pub handler: HandlerId,
    pub label: String,
    pub event_type: &'static str,
    pub error: HandlerError,
}

/// Aggregate failure of one emission. Every other handler still ran.
#[derive(Debug, Clone)]
pub struct EmitError {
    failures: Vec<HandlerFailure>,
}

impl EmitError {
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<HandlerFailure> {
        self.failures
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "some handlers failed ({})", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.label, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for EmitError {}

#[derive(Default)]
struct BusState {
    pool: HandlerPool,
    last_events: FxHashMap<&'static EventType, EventRef>,
    anchors: SlotMap<AnchorId, String>,
}

struct BusInner {
    state: Mutex<BusState>,
    executor: Arc<dyn AsyncExecutor>,
}

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// Non-owning handle, for callbacks stored inside the bus itself.
#[derive(Clone)]
pub struct WeakEventBus {
    inner: Weak<BusInner>,
}

impl WeakEventBus {
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

impl EventBus {
    pub fn new(executor: Arc<dyn AsyncExecutor>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                state: Mutex::new(BusState::default()),
                executor,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn executor(&self) -> Arc<dyn AsyncExecutor> {
        Arc::clone(&self.inner.executor)
    }

    pub fn mint_anchor(&self, label: impl Into<String>) -> AnchorId {
        let label = label.into();
        let id = self.state().anchors.insert(label);
        tracing::trace!(anchor = ?id, "anchor minted");
        id
    }

    /// Drops every handler under `id` and forgets the anchor.
    pub fn release_anchor(&self, id: AnchorId) {
        let mut state = self.state();
        let removed = state.pool.clear_anchor(Anchor::Scoped(id));
        state.anchors.remove(id);
        tracing::trace!(anchor = ?id, removed, "anchor released");
    }

    pub fn anchor_label(&self, id: AnchorId) -> Option<String> {
        self.state().anchors.get(id).cloned()
    }

    /// Registers `handler` and returns the size of the anchor's set for
    /// `event_type`.
    ///
    /// With `emit_last`, the most recent instance of exactly `event_type` is
    /// replayed to the new handler on the executor, never inline.
    pub fn subscribe(
        &self,
        event_type: &'static EventType,
        handler: Handler,
        anchor: impl Into<Anchor>,
        emit_last: bool,
    ) -> Result<usize> {
        if event_type.is_abstract() {
            return Err(BusError::AbstractEventType(event_type.name()));
        }
        let anchor = anchor.into();
        let (count, replay) = {
            let mut state = self.state();
            let count = state.pool.insert(anchor, event_type, handler.clone());
            if !anchor.is_global() {
                state.pool.insert(Anchor::Global, event_type, handler.clone());
            }
            let replay = if emit_last {
                state.last_events.get(event_type).cloned()
            } else {
                None
            };
            (count, replay)
        };

        tracing::trace!(
            event = event_type.name(),
            handler = handler.label(),
            ?anchor,
            count,
            "subscribed"
        );

        if let Some(last) = replay {
            self.inner.executor.spawn(Box::pin(async move {
                if let Err(err) = handler.invoke(last).await {
                    tracing::warn!(
                        event = event_type.name(),
                        handler = handler.label(),
                        error = %err,
                        "replay of last event failed"
                    );
                }
            }));
        }
        Ok(count)
    }

    pub fn unsubscribe(
        &self,
        event_type: &'static EventType,
        handler: &Handler,
        anchor: impl Into<Anchor>,
    ) {
        let anchor = anchor.into();
        let mut state = self.state();
        state.pool.remove(anchor, event_type, handler.id());
        if !anchor.is_global() {
            state.pool.remove(Anchor::Global, event_type, handler.id());
        }
    }

    pub fn reset(&self, event_type: &'static EventType, anchor: impl Into<Anchor>) {
        self.state().pool.clear(anchor.into(), event_type);
    }

    pub fn reset_object(&self, anchor: impl Into<Anchor>) {
        let anchor = anchor.into();
        let removed = self.state().pool.clear_anchor(anchor);
        if removed > 0 {
            tracing::debug!(?anchor, removed, "anchor handlers reset");
        }
    }

    pub fn handler_count(&self, event_type: &'static EventType, anchor: impl Into<Anchor>) -> usize {
        self.state().pool.count(anchor.into(), event_type)
    }

    pub fn anchor_handler_count(&self, anchor: impl Into<Anchor>) -> usize {
        self.state().pool.anchor_len(anchor.into())
    }

    pub fn last(&self, event_type: &'static EventType) -> Option<EventRef> {
        self.state().last_events.get(event_type).cloned()
    }

    /// Records `event` as the last of its type and snapshots the handlers to
    /// run, most specific type first.
    fn plan(&self, event: &EventRef, anchor: Anchor) -> Vec<Handler> {
        let event_type = event.event_type();
        let mut state = self.state();
        state.last_events.insert(event_type, Arc::clone(event));
        event_type
            .ancestors()
            .flat_map(|level| state.pool.snapshot(anchor, level))
            .collect()
    }

    /// Fire-and-forget emission. Failures are logged.
    pub fn emit(&self, event: impl IntoEvent, anchor: impl Into<Anchor>) {
        let event = event.into_event();
        let anchor = anchor.into();
        let handlers = self.plan(&event, anchor);
        if handlers.is_empty() {
            return;
        }
        self.inner.executor.spawn(Box::pin(async move {
            if let Err(err) = dispatch(handlers, event).await {
                tracing::warn!(?anchor, error = %err, "emit finished with failures");
            }
        }));
    }

    pub async fn emit_async(
        &self,
        event: impl IntoEvent,
        anchor: impl Into<Anchor>,
    ) -> std::result::Result<(), EmitError> {
        let event = event.into_event();
        let handlers = self.plan(&event, anchor.into());
        dispatch(handlers, event).await
    }
}

async fn dispatch(handlers: Vec<Handler>, event: EventRef) -> std::result::Result<(), EmitError> {
    if handlers.is_empty() {
        return Ok(());
    }
    let event_name = event.event_type().name();
    let results =
        futures::future::join_all(handlers.iter().map(|h| h.invoke(Arc::clone(&event)))).await;

    let failures: Vec<HandlerFailure> = handlers
        .iter()
        .zip(results)
        .filter_map(|(handler, result)| {
            result.err().map(|error| HandlerFailure {
                handler: handler.id(),
                label: handler.label().to_string(),
                event_type: event_name,
                error,
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        for failure in &failures {
            tracing::debug!(
                event = event_name,
                handler = %failure.label,
                error = %failure.error,
                "handler failed"
            );
        }
        Err(EmitError { failures })
    }
}

impl Service for EventBus {
    fn name(&self) -> &'static str {
        "EventBus"
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("EventBus")
            .field("anchors", &state.anchors.len())
            .field("last_events", &state.last_events.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bus/bus.rs"]
mod tests;
