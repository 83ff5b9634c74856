//! 应用层：把 bus、模型、路由与配置装配成一个宿主可持有的整体。

use std::sync::Arc;

use crate::bus::EventBus;
use crate::core::service::Result as ServiceResult;
use crate::core::ServiceRegistry;
use crate::models::{Model, ModelService};
use crate::presenters::ViewConnectorBuilder;
use crate::router::{Router, RouterService};
use crate::services::adapters::{AdaptiveAsyncDatasource, ConfigService};
use crate::services::ports::{AsyncExecutor, AsynchronousDatasource, FrameworkConfig};

/// The service host. Owns the registry and hands out the shared services
/// presenters and connectors need.
pub struct Application {
    services: ServiceRegistry,
    bus: EventBus,
    models: Arc<ModelService>,
    config: Arc<ConfigService>,
    router: Option<Arc<RouterService>>,
}

pub struct ApplicationBuilder {
    config: FrameworkConfig,
    executor: Arc<dyn AsyncExecutor>,
    router: Option<Router<String>>,
}

impl Application {
    pub fn builder(config: FrameworkConfig, executor: Arc<dyn AsyncExecutor>) -> ApplicationBuilder {
        ApplicationBuilder {
            config,
            executor,
            router: None,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn models(&self) -> &Arc<ModelService> {
        &self.models
    }

    pub fn config(&self) -> FrameworkConfig {
        self.config.config()
    }

    pub fn router(&self) -> Option<&Arc<RouterService>> {
        self.router.as_ref()
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    pub fn register_model<M: Model>(
        &self,
        data_source: Arc<dyn AsynchronousDatasource>,
        overrides: Option<serde_json::Value>,
    ) -> crate::models::model::Result<Arc<M>> {
        self.models.register::<M>(data_source, overrides)
    }

    /// An adaptive datasource over `candidates`, bounded per candidate by the
    /// configured `candidate_timeout_ms`.
    pub fn adaptive_datasource(
        &self,
        candidates: Vec<Arc<dyn AsynchronousDatasource>>,
    ) -> AdaptiveAsyncDatasource {
        AdaptiveAsyncDatasource::new(candidates)
            .with_candidate_timeout(self.config.config().candidate_timeout())
    }

    /// A connector builder wired to this application's bus, models and router.
    pub fn connector(&self) -> ViewConnectorBuilder {
        let builder = ViewConnectorBuilder::new(self.bus.clone(), Arc::clone(&self.models));
        match &self.router {
            Some(router) => builder.router(Arc::clone(router)),
            None => builder,
        }
    }
}

impl ApplicationBuilder {
    pub fn router(mut self, router: Router<String>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn build(self) -> ServiceResult<Application> {
        let mut services = ServiceRegistry::new();
        let bus = EventBus::new(self.executor);
        services.register(bus.clone())?;
        let config = services.register(ConfigService::with_config(self.config))?;
        let models = services.register(ModelService::new(bus.clone()))?;
        let router = match self.router {
            Some(router) => Some(services.register(RouterService::new(router, bus.clone()))?),
            None => None,
        };

        tracing::info!(services = ?services.names(), "application assembled");
        Ok(Application {
            services,
            bus,
            models,
            config,
            router,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/application.rs"]
mod tests;
