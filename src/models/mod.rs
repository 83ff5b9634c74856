//! Models: long-lived state owners bound to one datasource.

pub mod connection;
pub mod model;
pub mod service;

pub use connection::{ConnectionModel, ConnectionState};
pub use model::{merge_state, Model, ModelBindings, ModelCore, ModelError, ModelState};
pub use service::ModelService;
