use serde::{Deserialize, Serialize};
use serde_json::json;

use super::model::{Model, ModelBindings, ModelCore};
use crate::core::event::ConnectionStatusEvent;
use crate::services::ports::ConnectionStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
}

/// Mirrors the datasource's connection status and announces every change as
/// a [`ConnectionStatusEvent`].
pub struct ConnectionModel {
    core: ModelCore<ConnectionState>,
}

impl ConnectionModel {
    pub fn status(&self) -> ConnectionStatus {
        self.core.read(|s| s.status)
    }

    pub async fn connect(&self) -> bool {
        self.core.data_source().connect().await
    }

    pub async fn disconnect(&self) {
        self.core.data_source().disconnect().await;
    }

    fn record(&self, status: ConnectionStatus) {
        if let Err(err) = self.core.set_state(json!({ "status": status })) {
            tracing::error!(error = %err, "failed to record connection status");
            return;
        }
        self.core.emit(ConnectionStatusEvent { status });
    }
}

impl Model for ConnectionModel {
    type State = ConnectionState;

    fn default_state() -> Self::State {
        ConnectionState::default()
    }

    fn from_core(core: ModelCore<Self::State>) -> Self {
        Self { core }
    }

    fn core(&self) -> &ModelCore<Self::State> {
        &self.core
    }

    fn bindings(bindings: &mut ModelBindings<Self>) {
        bindings
            .on_connect(|m| m.record(ConnectionStatus::Connected))
            .on_disconnect(|m| m.record(ConnectionStatus::Disconnected))
            .on_timeout(|m| m.record(ConnectionStatus::Timeouted));
    }

    fn name() -> &'static str {
        "ConnectionModel"
    }
}
