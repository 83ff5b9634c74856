use std::sync::{Arc, PoisonError, RwLock};

use super::Result;
use crate::bus::{Anchor, AnchorId, EmitError, EventBus};
use crate::core::event::IntoEvent;
use crate::models::{Model, ModelService};
use crate::router::RouterService;
use crate::views::{Props, View};

/// The view of one attach, shared with the presenters built for it. Emptied
/// when that attach is torn down.
pub(crate) type ViewSlot = Arc<RwLock<Option<Arc<dyn View>>>>;

/// What a presenter can reach: models, the router, its view and the bus
/// under its connector's anchor.
#[derive(Clone)]
pub struct PresenterContext {
    bus: EventBus,
    models: Arc<ModelService>,
    router: Option<Arc<RouterService>>,
    anchor: AnchorId,
    view: ViewSlot,
}

impl PresenterContext {
    pub(crate) fn new(
        bus: EventBus,
        models: Arc<ModelService>,
        router: Option<Arc<RouterService>>,
        anchor: AnchorId,
        view: ViewSlot,
    ) -> Self {
        Self {
            bus,
            models,
            router,
            anchor,
            view,
        }
    }

    pub fn model<M: Model>(&self) -> Result<Arc<M>> {
        Ok(self.models.retrieve::<M>()?)
    }

    pub fn models(&self) -> &Arc<ModelService> {
        &self.models
    }

    pub fn router(&self) -> Option<&Arc<RouterService>> {
        self.router.as_ref()
    }

    pub fn view(&self) -> Option<Arc<dyn View>> {
        self.view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pushes `props` to the attached view. Returns `false` when detached.
    pub fn set_view_props(&self, props: Props) -> bool {
        match self.view() {
            Some(view) => {
                view.set_props(props);
                true
            }
            None => {
                tracing::debug!(anchor = ?self.anchor, "props dropped, no view attached");
                false
            }
        }
    }

    /// Emits under this presenter's anchor.
    pub fn emit(&self, event: impl IntoEvent) {
        self.bus.emit(event, self.anchor);
    }

    pub async fn emit_async(&self, event: impl IntoEvent) -> std::result::Result<(), EmitError> {
        self.bus.emit_async(event, self.anchor).await
    }

    pub fn emit_global(&self, event: impl IntoEvent) {
        self.bus.emit(event, Anchor::Global);
    }

    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}
