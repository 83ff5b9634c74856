use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub type Payload = serde_json::Value;
pub type Listener = Arc<dyn Fn(Payload) + Send + Sync>;

/// Lifecycle channels fired by every datasource on status transitions.
pub mod channels {
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const TIMEOUT: &str = "timeout";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Initial,
    Connected,
    Disconnected,
    Timeouted,
}

impl ConnectionStatus {
    pub fn channel(self) -> Option<&'static str> {
        match self {
            ConnectionStatus::Initial => None,
            ConnectionStatus::Connected => Some(channels::CONNECT),
            ConnectionStatus::Disconnected => Some(channels::DISCONNECT),
            ConnectionStatus::Timeouted => Some(channels::TIMEOUT),
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Initial => "initial",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Timeouted => "timeouted",
        };
        f.write_str(s)
    }
}

pub trait Datasource: Send + Sync {
    fn name(&self) -> &str;

    fn status(&self) -> ConnectionStatus;

    fn on(&self, channel: &str, listener: Listener);

    fn once(&self, channel: &str, listener: Listener);
}

/// A bidirectional transport. Channel names and payload shapes belong to the
/// transport; the lifecycle channels in [`channels`] are shared by all.
pub trait AsynchronousDatasource: Datasource {
    /// Detects and opens the transport. `false` means the transport is not
    /// available in this environment at all.
    fn init(&self) -> BoxFuture<'_, bool>;

    fn connect(&self) -> BoxFuture<'_, bool>;

    fn disconnect(&self) -> BoxFuture<'_, ()>;

    fn send<'a>(&'a self, channel: &'a str, payload: Payload) -> BoxFuture<'a, bool>;
}
