use std::any::{Any, TypeId};
use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::model::{merge_state, Model, ModelBindings, ModelCore, ModelError, Result};
use crate::bus::EventBus;
use crate::core::Service;
use crate::services::ports::{channels, AsynchronousDatasource, Payload};

/// Registry of model singletons, one per model type.
pub struct ModelService {
    bus: EventBus,
    models: RwLock<FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ModelService {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            models: RwLock::new(FxHashMap::default()),
        }
    }

    /// Builds `M` on `data_source`, wires its bindings and fires the hook
    /// matching the datasource's current status right away.
    pub fn register<M: Model>(
        &self,
        data_source: Arc<dyn AsynchronousDatasource>,
        overrides: Option<Value>,
    ) -> Result<Arc<M>> {
        if self.contains::<M>() {
            return Err(ModelError::AlreadyRegistered(M::name()));
        }

        let mut state = serde_json::to_value(M::default_state())?;
        if let Some(overrides) = overrides {
            merge_state(&mut state, overrides);
        }
        let state: M::State = serde_json::from_value(state)?;

        let core = ModelCore::new(state, Arc::clone(&data_source), self.bus.clone());
        let model = Arc::new(M::from_core(core));

        let mut bindings = ModelBindings::default();
        M::bindings(&mut bindings);
        wire(&model, &bindings, data_source.as_ref());

        {
            let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
            if models.contains_key(&TypeId::of::<M>()) {
                return Err(ModelError::AlreadyRegistered(M::name()));
            }
            let erased: Arc<dyn Any + Send + Sync> = model.clone();
            models.insert(TypeId::of::<M>(), erased);
        }

        let status = data_source.status();
        tracing::debug!(
            model = M::name(),
            datasource = data_source.name(),
            %status,
            "model registered"
        );
        if let Some(hook) = bindings.hook_for(status) {
            hook(&model);
        }
        Ok(model)
    }

    pub fn retrieve<M: Model>(&self) -> Result<Arc<M>> {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        models
            .get(&TypeId::of::<M>())
            .and_then(|m| Arc::clone(m).downcast::<M>().ok())
            .ok_or(ModelError::NotRegistered(M::name()))
    }

    pub fn contains<M: Model>(&self) -> bool {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<M>())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

fn wire<M: Model>(model: &Arc<M>, bindings: &ModelBindings<M>, data_source: &dyn AsynchronousDatasource) {
    for (channel, hook) in &bindings.listeners {
        let weak = Arc::downgrade(model);
        let hook = Arc::clone(hook);
        data_source.on(
            channel,
            Arc::new(move |payload| {
                if let Some(model) = weak.upgrade() {
                    hook(&model, payload);
                }
            }),
        );
    }

    let status_hooks = [
        (channels::CONNECT, &bindings.on_connect),
        (channels::DISCONNECT, &bindings.on_disconnect),
        (channels::TIMEOUT, &bindings.on_timeout),
    ];
    for (channel, hook) in status_hooks {
        let Some(hook) = hook.clone() else {
            continue;
        };
        let weak = Arc::downgrade(model);
        data_source.on(
            channel,
            Arc::new(move |_: Payload| {
                if let Some(model) = weak.upgrade() {
                    hook(&model);
                }
            }),
        );
    }
}

impl Service for ModelService {
    fn name(&self) -> &'static str {
        "ModelService"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/service.rs"]
mod tests;
