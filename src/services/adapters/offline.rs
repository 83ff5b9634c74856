use futures::future::BoxFuture;
use futures::FutureExt;

use super::base::DatasourceCore;
use crate::services::ports::{
    AsynchronousDatasource, ConnectionStatus, Datasource, Listener, Payload,
};

/// Last-resort candidate: always initializes, never connects.
pub struct OfflineDatasource {
    core: DatasourceCore,
}

impl OfflineDatasource {
    pub fn new() -> Self {
        Self {
            core: DatasourceCore::new("offline"),
        }
    }
}

impl Default for OfflineDatasource {
    fn default() -> Self {
        Self::new()
    }
}

impl Datasource for OfflineDatasource {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn status(&self) -> ConnectionStatus {
        self.core.status()
    }

    fn on(&self, channel: &str, listener: Listener) {
        self.core.on(channel, listener);
    }

    fn once(&self, channel: &str, listener: Listener) {
        self.core.once(channel, listener);
    }
}

impl AsynchronousDatasource for OfflineDatasource {
    fn init(&self) -> BoxFuture<'_, bool> {
        async move {
            self.core.transition(ConnectionStatus::Disconnected);
            true
        }
        .boxed()
    }

    fn connect(&self) -> BoxFuture<'_, bool> {
        async move {
            self.core.transition(ConnectionStatus::Disconnected);
            false
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        async move {
            self.core.transition(ConnectionStatus::Disconnected);
        }
        .boxed()
    }

    fn send<'a>(&'a self, channel: &'a str, _payload: Payload) -> BoxFuture<'a, bool> {
        tracing::trace!(channel, "offline datasource dropped send");
        futures::future::ready(false).boxed()
    }
}
