use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use super::context::{PresenterContext, ViewSlot};
use super::routes::Routes;
use super::{ActionSpec, ConnectorAction, Presenter, Result};
use crate::bus::handler::guarded;
use crate::bus::{Anchor, AnchorId, EmitError, EventBus, Handler, HandlerFuture, WeakEventBus};
use crate::core::event::{
    ErrorEvent, EventRef, EventType, IntoEvent, MountEvent, UnmountEvent, ERROR,
};
use crate::models::ModelService;
use crate::router::RouterService;
use crate::views::{Props, View};

type Call = Arc<dyn Fn(EventRef) -> HandlerFuture + Send + Sync>;
type Build = Box<dyn Fn(PresenterContext, &EventBus) -> Result<Instance> + Send + Sync>;

struct Binding {
    event_type: &'static EventType,
    restorable: bool,
    handler: Handler,
}

/// One freshly built presenter, ready to be subscribed.
struct Instance {
    initial_props: Option<Props>,
    bindings: Vec<Binding>,
}

/// Everything known about a presenter type before any view shows up.
struct Blueprint {
    name: &'static str,
    build: Build,
    actions: Vec<ActionSpec>,
}

impl Blueprint {
    fn of<P: Presenter>() -> Self {
        let name = P::name();
        let mut routes = Routes::<P>::default();
        P::routes(&mut routes);
        tracing::debug!(presenter = name, routes = routes.len(), "route table built");

        let build: Build = Box::new(move |ctx: PresenterContext, bus: &EventBus| {
            let presenter = Arc::new(P::new(ctx)?);
            let initial_props = presenter.initial_props();
            let mut bindings = Vec::with_capacity(routes.len());
            for route in routes.iter() {
                let bound: Call = {
                    let presenter = Arc::clone(&presenter);
                    let call = Arc::clone(&route.call);
                    Arc::new(move |event: EventRef| call(Arc::clone(&presenter), event))
                };
                let handler = isolate(bus.downgrade(), name, route.method, bound);
                for entry in &route.entries {
                    bindings.push(Binding {
                        event_type: entry.event_type,
                        restorable: entry.restorable,
                        handler: handler.clone(),
                    });
                }
            }
            Ok(Instance {
                initial_props,
                bindings,
            })
        });

        Self {
            name,
            build,
            actions: P::actions(),
        }
    }
}

/// Wraps a presenter method so a failure (error or panic) is logged and
/// re-emitted globally as an [`ErrorEvent`]. The failure is still returned,
/// so an awaiting `emit_async` caller sees it in its aggregate.
///
/// The handler lives in the bus's own pool, so it only keeps a weak handle.
fn isolate(
    bus: WeakEventBus,
    presenter: &'static str,
    method: &'static str,
    call: Call,
) -> Handler {
    Handler::new(move |event: EventRef| {
        let bus = bus.clone();
        let call = Arc::clone(&call);
        async move {
            let result = guarded(async { call(Arc::clone(&event)).await }).await;
            if let Err(err) = &result {
                let source = event.event_type();
                tracing::error!(
                    presenter,
                    method,
                    event = source.name(),
                    error = %err,
                    "presenter handler failed"
                );
                // An error handler failing must not feed itself.
                if let Some(bus) = bus.upgrade().filter(|_| !source.is_a(&ERROR)) {
                    bus.emit(
                        ErrorEvent::from_dispatch(format!("{presenter}::{method}: {err}"), source),
                        Anchor::Global,
                    );
                }
            }
            result
        }
    })
    .with_label(format!("{presenter}::{method}"))
}

/// Glue between one widget slot and its presenters.
///
/// The connector keeps a single anchor for its whole life. Every `attach`
/// tears down the previous view's subscriptions, builds new presenter
/// instances and subscribes their routes under that anchor, then emits
/// [`MountEvent`] under it. Each attach gets its own view slot; teardown
/// empties it, so presenters of an earlier attach can no longer reach a view.
pub struct ViewConnector {
    bus: EventBus,
    models: Arc<ModelService>,
    router: Option<Arc<RouterService>>,
    anchor: AnchorId,
    label: String,
    blueprints: Vec<Blueprint>,
    actions: Vec<ConnectorAction>,
    view: RwLock<ViewSlot>,
    attached: Mutex<Vec<(&'static EventType, Handler)>>,
}

impl ViewConnector {
    pub fn builder(bus: EventBus, models: Arc<ModelService>) -> ViewConnectorBuilder {
        ViewConnectorBuilder::new(bus, models)
    }

    pub fn attach(&self, view: Arc<dyn View>) -> Result<()> {
        let mut attached = self.lock_attached();
        self.teardown(&mut attached, true);

        let slot: ViewSlot = Arc::new(RwLock::new(Some(Arc::clone(&view))));
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&slot);

        for blueprint in &self.blueprints {
            let ctx = PresenterContext::new(
                self.bus.clone(),
                Arc::clone(&self.models),
                self.router.clone(),
                self.anchor,
                Arc::clone(&slot),
            );
            let instance = match (blueprint.build)(ctx, &self.bus) {
                Ok(instance) => instance,
                Err(err) => {
                    tracing::warn!(
                        connector = %self.label,
                        presenter = blueprint.name,
                        error = %err,
                        "presenter failed to build, attach rolled back"
                    );
                    self.teardown(&mut attached, false);
                    return Err(err);
                }
            };

            if let Some(props) = instance.initial_props {
                view.set_props(props);
            }

            for binding in instance.bindings {
                let subscribed = self.bus.subscribe(
                    binding.event_type,
                    binding.handler.clone(),
                    self.anchor,
                    binding.restorable,
                );
                if let Err(err) = subscribed {
                    self.teardown(&mut attached, false);
                    return Err(err.into());
                }
                attached.push((binding.event_type, binding.handler));
            }
        }

        tracing::debug!(
            connector = %self.label,
            view = view.name(),
            subscriptions = attached.len(),
            "view attached"
        );
        self.bus.emit(MountEvent, self.anchor);
        Ok(())
    }

    /// Emits [`UnmountEvent`] to the current presenters, then drops the view
    /// and every subscription made for it. Returns `false` if nothing was
    /// attached.
    pub fn detach(&self) -> bool {
        let mut attached = self.lock_attached();
        self.teardown(&mut attached, true)
    }

    pub fn emit(&self, event: impl IntoEvent) {
        self.bus.emit(event, self.anchor);
    }

    pub async fn emit_async(&self, event: impl IntoEvent) -> std::result::Result<(), EmitError> {
        self.bus.emit_async(event, self.anchor).await
    }

    pub fn actions(&self) -> &[ConnectorAction] {
        &self.actions
    }

    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn view(&self) -> Option<Arc<dyn View>> {
        self.current_slot()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_attached(&self) -> bool {
        self.view().is_some()
    }

    /// `(event type, handler)` pairs subscribed for the current view.
    pub fn subscription_count(&self) -> usize {
        self.lock_attached().len()
    }

    fn lock_attached(&self) -> MutexGuard<'_, Vec<(&'static EventType, Handler)>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_slot(&self) -> ViewSlot {
        Arc::clone(&self.view.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// With `announce`, a mounted view is sent [`UnmountEvent`] before its
    /// routes go away. A rolled back attach never mounted, so it is silent.
    fn teardown(&self, attached: &mut Vec<(&'static EventType, Handler)>, announce: bool) -> bool {
        let slot = std::mem::replace(
            &mut *self.view.write().unwrap_or_else(PoisonError::into_inner),
            empty_slot(),
        );
        let previous = slot.write().unwrap_or_else(PoisonError::into_inner).take();
        if announce && previous.is_some() {
            self.bus.emit(UnmountEvent, self.anchor);
        }
        let released = attached.len();
        for (event_type, handler) in attached.drain(..) {
            self.bus.unsubscribe(event_type, &handler, self.anchor);
        }
        self.bus.reset_object(self.anchor);

        match previous {
            Some(view) => {
                tracing::debug!(
                    connector = %self.label,
                    view = view.name(),
                    released,
                    "view detached"
                );
                true
            }
            None => false,
        }
    }
}

impl Drop for ViewConnector {
    fn drop(&mut self) {
        let mut attached =
            std::mem::take(self.attached.get_mut().unwrap_or_else(PoisonError::into_inner));
        self.teardown(&mut attached, true);
        self.bus.release_anchor(self.anchor);
    }
}

impl fmt::Debug for ViewConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewConnector")
            .field("label", &self.label)
            .field("anchor", &self.anchor)
            .field(
                "presenters",
                &self.blueprints.iter().map(|b| b.name).collect::<Vec<_>>(),
            )
            .field("attached", &self.is_attached())
            .finish()
    }
}

fn empty_slot() -> ViewSlot {
    Arc::new(RwLock::new(None))
}

pub struct ViewConnectorBuilder {
    bus: EventBus,
    models: Arc<ModelService>,
    router: Option<Arc<RouterService>>,
    label: Option<String>,
    blueprints: Vec<Blueprint>,
}

impl ViewConnectorBuilder {
    pub fn new(bus: EventBus, models: Arc<ModelService>) -> Self {
        Self {
            bus,
            models,
            router: None,
            label: None,
            blueprints: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn router(mut self, router: Arc<RouterService>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn presenter<P: Presenter>(mut self) -> Self {
        self.blueprints.push(Blueprint::of::<P>());
        self
    }

    pub fn build(self) -> Result<ViewConnector> {
        for blueprint in &self.blueprints {
            for action in &blueprint.actions {
                action.validate()?;
            }
        }

        let label = self.label.unwrap_or_else(|| {
            self.blueprints
                .iter()
                .map(|b| b.name.rsplit("::").next().unwrap_or(b.name))
                .collect::<Vec<_>>()
                .join("+")
        });
        let anchor = self.bus.mint_anchor(label.clone());
        let actions = self
            .blueprints
            .iter()
            .flat_map(|b| b.actions.iter())
            .map(|action| action.bind(self.bus.clone(), anchor))
            .collect();

        tracing::debug!(connector = %label, anchor = ?anchor, "connector built");
        Ok(ViewConnector {
            bus: self.bus,
            models: self.models,
            router: self.router,
            anchor,
            label,
            blueprints: self.blueprints,
            actions,
            view: RwLock::new(empty_slot()),
            attached: Mutex::new(Vec::new()),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presenters/connector.rs"]
mod tests;
