use std::any::{Any, TypeId};
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    InitializationFailed(String),
    AlreadyRegistered(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(name) => write!(f, "Service not found: {}", name),
            ServiceError::InitializationFailed(msg) => {
                write!(f, "Service initialization failed: {}", msg)
            }
            ServiceError::AlreadyRegistered(name) => {
                write!(f, "Service already registered: {}", name)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

pub trait Service: Any + Send + Sync {
    fn name(&self) -> &'static str;
}

struct Entry {
    name: &'static str,
    service: Arc<dyn Any + Send + Sync>,
}

/// Type-keyed container of shared services.
///
/// Services are handed out as `Arc`s because presenters, connectors and
/// models all hold on to them for the lifetime of the application.
#[derive(Default)]
pub struct ServiceRegistry {
    services: FxHashMap<TypeId, Entry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Service>(&mut self, service: S) -> Result<Arc<S>> {
        self.register_shared(Arc::new(service))
    }

    pub fn register_shared<S: Service>(&mut self, service: Arc<S>) -> Result<Arc<S>> {
        let type_id = TypeId::of::<S>();
        let name = service.name();
        if self.services.contains_key(&type_id) {
            return Err(ServiceError::AlreadyRegistered(name.to_string()));
        }
        let erased: Arc<dyn Any + Send + Sync> = service.clone();
        self.services.insert(
            type_id,
            Entry {
                name,
                service: erased,
            },
        );
        tracing::debug!(service = name, "service registered");
        Ok(service)
    }

    pub fn get<S: Service>(&self) -> Option<Arc<S>> {
        let entry = self.services.get(&TypeId::of::<S>())?;
        Arc::clone(&entry.service).downcast::<S>().ok()
    }

    pub fn require<S: Service>(&self) -> Result<Arc<S>> {
        self.get::<S>()
            .ok_or_else(|| ServiceError::NotFound(std::any::type_name::<S>().to_string()))
    }

    pub fn contains<S: Service>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<S>())
    }

    pub fn remove<S: Service>(&mut self) -> Option<Arc<S>> {
        let entry = self.services.remove(&TypeId::of::<S>())?;
        entry.service.downcast::<S>().ok()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.services.values().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/service.rs"]
mod tests;
