use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::bus::{Anchor, EmitError, EventBus};
use crate::core::event::IntoEvent;
use crate::services::ports::{AsynchronousDatasource, ConnectionStatus, Payload};

#[derive(Debug)]
pub enum ModelError {
    NotRegistered(&'static str),
    AlreadyRegistered(&'static str),
    State(serde_json::Error),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotRegistered(name) => write!(f, "model not registered: {}", name),
            ModelError::AlreadyRegistered(name) => {
                write!(f, "model already registered: {}", name)
            }
            ModelError::State(e) => write!(f, "state merge failed: {}", e),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::State(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::State(e)
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

pub trait ModelState: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> ModelState for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Merges `patch` into `target`. Objects merge key by key, recursively;
/// anything else replaces the target value.
pub fn merge_state(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(slot) => merge_state(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// State, datasource and bus handle shared by every model.
pub struct ModelCore<S> {
    state: RwLock<S>,
    data_source: Arc<dyn AsynchronousDatasource>,
    bus: EventBus,
}

impl<S: ModelState> ModelCore<S> {
    pub fn new(state: S, data_source: Arc<dyn AsynchronousDatasource>, bus: EventBus) -> Self {
        Self {
            state: RwLock::new(state),
            data_source,
            bus,
        }
    }

    pub fn state(&self) -> S {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The only mutation path. Emits nothing; callers emit once they are
    /// done mutating.
    pub fn set_state<P: Serialize>(&self, partial: P) -> Result<()> {
        let patch = serde_json::to_value(partial)?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut current = serde_json::to_value(&*state)?;
        merge_state(&mut current, patch);
        *state = serde_json::from_value(current)?;
        Ok(())
    }

    pub fn emit(&self, event: impl IntoEvent) {
        self.bus.emit(event, Anchor::Global);
    }

    pub async fn emit_async(&self, event: impl IntoEvent) -> std::result::Result<(), EmitError> {
        self.bus.emit_async(event, Anchor::Global).await
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn data_source(&self) -> &Arc<dyn AsynchronousDatasource> {
        &self.data_source
    }

    pub fn status(&self) -> ConnectionStatus {
        self.data_source.status()
    }

    /// Forwards to the datasource only while connected. Nothing is queued.
    pub async fn send(&self, channel: &str, payload: Payload) -> bool {
        let status = self.data_source.status();
        if !status.is_connected() {
            tracing::debug!(channel, %status, "send dropped, datasource not connected");
            return false;
        }
        self.data_source.send(channel, payload).await
    }
}

type ChannelHook<M> = Arc<dyn Fn(&M, Payload) + Send + Sync>;
type StatusHook<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Per-model table of datasource wiring: channel listeners plus the
/// connect/disconnect/timeout hooks.
pub struct ModelBindings<M> {
    pub(crate) listeners: Vec<(String, ChannelHook<M>)>,
    pub(crate) on_connect: Option<StatusHook<M>>,
    pub(crate) on_disconnect: Option<StatusHook<M>>,
    pub(crate) on_timeout: Option<StatusHook<M>>,
}

impl<M> Default for ModelBindings<M> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            on_connect: None,
            on_disconnect: None,
            on_timeout: None,
        }
    }
}

impl<M> ModelBindings<M> {
    pub fn listen(
        &mut self,
        channel: impl Into<String>,
        f: impl Fn(&M, Payload) + Send + Sync + 'static,
    ) -> &mut Self {
        self.listeners.push((channel.into(), Arc::new(f)));
        self
    }

    pub fn on_connect(&mut self, f: impl Fn(&M) + Send + Sync + 'static) -> &mut Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    pub fn on_disconnect(&mut self, f: impl Fn(&M) + Send + Sync + 'static) -> &mut Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    pub fn on_timeout(&mut self, f: impl Fn(&M) + Send + Sync + 'static) -> &mut Self {
        self.on_timeout = Some(Arc::new(f));
        self
    }

    pub fn listener_channels(&self) -> Vec<&str> {
        self.listeners.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub(crate) fn hook_for(&self, status: ConnectionStatus) -> Option<&StatusHook<M>> {
        match status {
            ConnectionStatus::Initial => None,
            ConnectionStatus::Connected => self.on_connect.as_ref(),
            ConnectionStatus::Disconnected => self.on_disconnect.as_ref(),
            ConnectionStatus::Timeouted => self.on_timeout.as_ref(),
        }
    }
}

pub trait Model: Send + Sync + Sized + 'static {
    type State: ModelState;

    fn default_state() -> Self::State;

    fn from_core(core: ModelCore<Self::State>) -> Self;

    fn core(&self) -> &ModelCore<Self::State>;

    /// Datasource wiring. Models without transport traffic leave it empty.
    fn bindings(_bindings: &mut ModelBindings<Self>) {}

    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/model.rs"]
mod tests;
