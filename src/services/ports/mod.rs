//! Service ports: traits + data contracts.

pub mod config;
pub mod datasource;
pub mod runtime;

pub use config::FrameworkConfig;
pub use datasource::{
    channels, AsynchronousDatasource, ConnectionStatus, Datasource, Listener, Payload,
};
pub use runtime::{AsyncExecutor, Task};
