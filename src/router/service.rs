use std::sync::{PoisonError, RwLock};

use super::{Param, Resolution, Result, Router, RouterError};
use crate::bus::{Anchor, EventBus};
use crate::core::event::NavigationEvent;
use crate::core::Service;

/// The application's router plus the current location. Every successful
/// navigation is announced globally as a [`NavigationEvent`].
pub struct RouterService<T = String> {
    router: RwLock<Router<T>>,
    current: RwLock<Option<String>>,
    bus: EventBus,
}

impl<T: Clone + Send + Sync + 'static> RouterService<T> {
    pub fn new(router: Router<T>, bus: EventBus) -> Self {
        Self {
            router: RwLock::new(router),
            current: RwLock::new(None),
            bus,
        }
    }

    /// Mutable access to the route table, e.g. to add routes after startup.
    pub fn with_router<R>(&self, f: impl FnOnce(&mut Router<T>) -> R) -> R {
        f(&mut self.router.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn resolve(&self, path: &str) -> Option<Resolution<T>> {
        self.router
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(path)
    }

    pub fn reverse(&self, name: &str, params: &[Param]) -> Result<String> {
        self.router
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reverse(name, params)
    }

    pub fn navigate(&self, path: &str) -> Result<Resolution<T>> {
        let Some(resolution) = self.resolve(path) else {
            tracing::debug!(path, "navigation matched no route");
            return Err(RouterError::NoMatch(path.to_string()));
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
        tracing::debug!(path, route = %resolution.name, "navigated");
        self.bus.emit(
            NavigationEvent {
                path: path.to_string(),
                route: Some(resolution.name.clone()),
            },
            Anchor::Global,
        );
        Ok(resolution)
    }

    pub fn navigate_to(&self, name: &str, params: &[Param]) -> Result<Resolution<T>> {
        let path = self.reverse(name, params)?;
        self.navigate(&path)
    }

    pub fn current(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Send + Sync + 'static> Service for RouterService<T> {
    fn name(&self) -> &'static str {
        "RouterService"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/router/service.rs"]
mod tests;
