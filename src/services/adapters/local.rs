//! In-process bridge datasource.
//!
//! `local_bridge` returns a datasource and the peer standing on the other side
//! of the link. The peer receives everything the datasource sends, pushes
//! inbound messages, and can drop or restore the link out-of-band. Hosts use
//! it to wire an embedded device simulator; tests use it as a scriptable
//! transport.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;

use super::base::DatasourceCore;
use crate::services::ports::{
    AsynchronousDatasource, ConnectionStatus, Datasource, Listener, Payload,
};

/// How the peer answers the next handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    #[default]
    Accept,
    Refuse,
    /// Never answers; the datasource's connect window decides.
    Stall,
    /// The bridge is not present in this environment; `init` fails.
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub channel: String,
    pub payload: Payload,
}

struct Link {
    mode: Mutex<LinkMode>,
}

impl Link {
    fn mode(&self) -> LinkMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct LocalDatasource {
    core: Arc<DatasourceCore>,
    link: Arc<Link>,
    outbound: mpsc::UnboundedSender<Outbound>,
    connect_timeout: Duration,
}

pub struct LocalPeer {
    core: Arc<DatasourceCore>,
    link: Arc<Link>,
    inbox: mpsc::UnboundedReceiver<Outbound>,
}

pub fn local_bridge(name: &'static str, connect_timeout: Duration) -> (LocalDatasource, LocalPeer) {
    let core = Arc::new(DatasourceCore::new(name));
    let link = Arc::new(Link {
        mode: Mutex::new(LinkMode::default()),
    });
    let (tx, rx) = mpsc::unbounded_channel();
    (
        LocalDatasource {
            core: Arc::clone(&core),
            link: Arc::clone(&link),
            outbound: tx,
            connect_timeout,
        },
        LocalPeer {
            core,
            link,
            inbox: rx,
        },
    )
}

impl LocalDatasource {
    async fn handshake(&self) -> bool {
        match self.link.mode() {
            LinkMode::Accept => !self.outbound.is_closed(),
            LinkMode::Refuse | LinkMode::Absent => false,
            LinkMode::Stall => futures::future::pending::<bool>().await,
        }
    }
}

impl Datasource for LocalDatasource {
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

impl AsynchronousDatasource for LocalDatasource {
    fn init(&self) -> BoxFuture<'_, bool> {
        async move {
            if self.link.mode() == LinkMode::Absent || self.outbound.is_closed() {
                tracing::debug!(datasource = self.core.name(), "bridge not present");
                return false;
            }
            self.core
                .connect_within(self.connect_timeout, self.handshake())
                .await;
            true
        }
        .boxed()
    }

    fn connect(&self) -> BoxFuture<'_, bool> {
        async move {
            if self.core.status().is_connected() {
                return true;
            }
            self.core
                .connect_within(self.connect_timeout, self.handshake())
                .await
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        async move {
            self.core.transition(ConnectionStatus::Disconnected);
        }
        .boxed()
    }

    fn send<'a>(&'a self, channel: &'a str, payload: Payload) -> BoxFuture<'a, bool> {
        async move {
            if !self.core.status().is_connected() {
                return false;
            }
            self.outbound
                .send(Outbound {
                    channel: channel.to_string(),
                    payload,
                })
                .is_ok()
        }
        .boxed()
    }
}

impl LocalPeer {
    pub fn set_mode(&self, mode: LinkMode) {
        *self.link.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Delivers an inbound message to the datasource's listeners.
    pub fn push(&self, channel: &str, payload: Payload) {
        self.core.dispatch(channel, payload);
    }

    /// The link came up without the datasource asking for it.
    pub fn restore_link(&self) {
        self.core.transition(ConnectionStatus::Connected);
    }

    pub fn drop_link(&self) {
        self.core.transition(ConnectionStatus::Disconnected);
    }

    pub async fn recv(&mut self) -> Option<Outbound> {
        self.inbox.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.inbox.try_recv().ok()
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/adapters/local.rs"]
mod tests;
