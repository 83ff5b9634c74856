use std::fmt;
use std::sync::Arc;

use super::{BindingError, Result};
use crate::bus::{AnchorId, EmitError, EventBus};
use crate::core::event::{EventClass, EventRef, EventType, ACTION};

type Factory = Arc<dyn Fn() -> EventRef + Send + Sync>;

/// A named action a presenter offers to generic UI, such as a widget menu.
#[derive(Clone)]
pub struct ActionSpec {
    name: String,
    event_type: &'static EventType,
    make: Factory,
}

impl ActionSpec {
    pub fn of<E: EventClass + Default>(name: impl Into<String>) -> Self {
        Self::with(name, E::default)
    }

    pub fn with<E: EventClass>(
        name: impl Into<String>,
        make: impl Fn() -> E + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            event_type: E::static_type(),
            make: Arc::new(move || -> EventRef { Arc::new(make()) }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn event_type(&self) -> &'static EventType {
        self.event_type
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.event_type.is_a(&ACTION) {
            Ok(())
        } else {
            Err(BindingError::NotAnAction(self.event_type.name()))
        }
    }

    pub(crate) fn bind(&self, bus: EventBus, anchor: AnchorId) -> ConnectorAction {
        ConnectorAction {
            name: self.name.clone(),
            event_type: self.event_type,
            make: Arc::clone(&self.make),
            bus,
            anchor,
        }
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.name)
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// An action bound to a connector. Triggering emits a fresh event instance
/// under the connector's anchor.
#[derive(Clone)]
pub struct ConnectorAction {
    name: String,
    event_type: &'static EventType,
    make: Factory,
    bus: EventBus,
    anchor: AnchorId,
}

impl ConnectorAction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn event_type(&self) -> &'static EventType {
        self.event_type
    }

    pub fn trigger(&self) {
        tracing::debug!(action = %self.name, anchor = ?self.anchor, "action triggered");
        self.bus.emit((self.make)(), self.anchor);
    }

    pub async fn trigger_async(&self) -> std::result::Result<(), EmitError> {
        self.bus.emit_async((self.make)(), self.anchor).await
    }
}

impl fmt::Debug for ConnectorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorAction")
            .field("name", &self.name)
            .field("event_type", &self.event_type)
            .field("anchor", &self.anchor)
            .finish()
    }
}
