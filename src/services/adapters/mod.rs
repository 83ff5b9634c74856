//! Service adapters: runtime and transport implementations.

pub mod adaptive;
pub mod base;
pub mod config;
pub mod local;
pub mod offline;
pub mod runtime;
pub mod settings;

pub use adaptive::AdaptiveAsyncDatasource;
pub use base::DatasourceCore;
pub use config::ConfigService;
pub use local::{local_bridge, LinkMode, LocalDatasource, LocalPeer, Outbound};
pub use offline::OfflineDatasource;
pub use runtime::{OwnedRuntime, TokioExecutor};
pub use settings::{
    default_config_path, ensure_config_file, ensure_log_dir, load_config, load_config_or_default,
    ConfigError,
};
