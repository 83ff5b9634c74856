//! Presenters and the connector binding them to a view slot.
//!
//! A [`Presenter`] declares its event routes once per type through
//! [`Presenter::routes`]. A [`ViewConnector`] owns one anchor on the bus and,
//! on every `attach`, builds fresh presenter instances, subscribes their
//! routes under that anchor and points them at the new view.

pub mod action;
pub mod connector;
pub mod context;
pub mod routes;

use std::fmt;

use crate::bus::BusError;
use crate::models::ModelError;
use crate::views::Props;

pub use action::{ActionSpec, ConnectorAction};
pub use connector::{ViewConnector, ViewConnectorBuilder};
pub use context::PresenterContext;
pub use routes::{RouteEntry, Routes};

#[derive(Debug)]
pub enum BindingError {
    Model(ModelError),
    Bus(BusError),
    /// A presenter refused to build.
    Presenter(String),
    /// An action entry names an event outside the `Action` branch.
    NotAnAction(&'static str),
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::Model(e) => write!(f, "model lookup failed: {}", e),
            BindingError::Bus(e) => write!(f, "subscription failed: {}", e),
            BindingError::Presenter(msg) => write!(f, "presenter construction failed: {}", msg),
            BindingError::NotAnAction(name) => write!(f, "not an action event: {}", name),
        }
    }
}

impl std::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindingError::Model(e) => Some(e),
            BindingError::Bus(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for BindingError {
    fn from(e: ModelError) -> Self {
        BindingError::Model(e)
    }
}

impl From<BusError> for BindingError {
    fn from(e: BusError) -> Self {
        BindingError::Bus(e)
    }
}

pub type Result<T> = std::result::Result<T, BindingError>;

pub trait Presenter: Send + Sync + Sized + 'static {
    fn new(ctx: PresenterContext) -> Result<Self>;

    /// The route table. Called once per connector, not per attach.
    fn routes(routes: &mut Routes<Self>);

    /// Actions this presenter exposes to generic UI.
    fn actions() -> Vec<ActionSpec> {
        Vec::new()
    }

    /// Props pushed to the view before any route is subscribed.
    fn initial_props(&self) -> Option<Props> {
        None
    }

    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
