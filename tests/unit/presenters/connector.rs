use super::*;
use crate::bus::HandlerError;
use crate::core::event::{
    MountEvent, RenderEvent, ACTION, MODEL_EVENT, MOUNT, RENDER, UNMOUNT, VIEW_EVENT,
};
use crate::models::{Model, ModelCore, ModelError};
use crate::presenters::BindingError;
use crate::services::adapters::TokioExecutor;
use crate::views::HeadlessView;
use crate::{event_type, impl_event};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

event_type!(static BLINK = "Blink" : ACTION);
event_type!(static SENSOR = "SensorReading" : MODEL_EVENT);
event_type!(static POKE = "Poke" : VIEW_EVENT);
event_type!(static STALL = "Stall" : VIEW_EVENT);

#[derive(Debug)]
struct Poke;
impl_event!(Poke => POKE);

/// Holds its handler until `gate` is notified.
#[derive(Debug)]
struct Stall {
    gate: Arc<Notify>,
}
impl_event!(Stall => STALL);

#[derive(Debug, Default)]
struct BlinkAction;
impl_event!(BlinkAction => BLINK);

#[derive(Debug)]
struct SensorReading {
    value: i64,
}
impl_event!(SensorReading => SENSOR);

struct StatusPresenter {
    ctx: PresenterContext,
}

impl Presenter for StatusPresenter {
    fn new(ctx: PresenterContext) -> Result<Self> {
        Ok(Self { ctx })
    }

    fn routes(routes: &mut Routes<Self>) {
        routes
            .on_sync("on_mount", &[&MOUNT, &MOUNT], |p, _| {
                p.ctx.set_view_props(json!({ "mounted": true }));
                Ok(())
            })
            .on_restorable("on_reading", &[&SENSOR], |p, event| async move {
                let value = event.downcast_ref::<SensorReading>().map(|r| r.value);
                p.ctx.set_view_props(json!({ "reading": value }));
                Ok(())
            })
            .on_sync("on_blink", &[&BLINK], |p, _| {
                p.ctx.set_view_props(json!({ "blinked": true }));
                Ok(())
            });
    }

    fn actions() -> Vec<ActionSpec> {
        vec![ActionSpec::of::<BlinkAction>("Blink")]
    }

    fn initial_props(&self) -> Option<Props> {
        Some(json!({ "label": "status" }))
    }
}

struct FailingPresenter;

impl Presenter for FailingPresenter {
    fn new(_: PresenterContext) -> Result<Self> {
        Ok(Self)
    }

    fn routes(routes: &mut Routes<Self>) {
        routes
            .on_sync("explode", &[&POKE], |_, _| Err(HandlerError::new("boom")))
            .on_sync("panic", &[&RENDER], |_, _| panic!("render exploded"));
    }
}

struct FailingErrorPresenter;

impl Presenter for FailingErrorPresenter {
    fn new(_: PresenterContext) -> Result<Self> {
        Ok(Self)
    }

    fn routes(routes: &mut Routes<Self>) {
        routes.on_sync("on_error", &[&ERROR], |_, _| Err(HandlerError::new("still broken")));
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
struct Settings {
    brightness: u8,
}

struct SettingsModel {
    core: ModelCore<Settings>,
}

impl Model for SettingsModel {
    type State = Settings;

    fn default_state() -> Self::State {
        Settings::default()
    }

    fn from_core(core: ModelCore<Self::State>) -> Self {
        Self { core }
    }

    fn core(&self) -> &ModelCore<Self::State> {
        &self.core
    }
}

struct NeedsSettings;

impl Presenter for NeedsSettings {
    fn new(ctx: PresenterContext) -> Result<Self> {
        ctx.model::<SettingsModel>()?;
        Ok(Self)
    }

    fn routes(routes: &mut Routes<Self>) {
        routes.on_sync("on_mount", &[&MOUNT], |_, _| Ok(()));
    }
}

struct SlowPresenter {
    ctx: PresenterContext,
}

impl Presenter for SlowPresenter {
    fn new(ctx: PresenterContext) -> Result<Self> {
        Ok(Self { ctx })
    }

    fn routes(routes: &mut Routes<Self>) {
        routes.on("on_stall", &[&STALL], |p, event| async move {
            if let Some(stall) = event.downcast_ref::<Stall>() {
                stall.gate.notified().await;
            }
            p.ctx.set_view_props(json!({ "stale": true }));
            Ok(())
        });
    }
}

struct MislabeledActions;

impl Presenter for MislabeledActions {
    fn new(_: PresenterContext) -> Result<Self> {
        Ok(Self)
    }

    fn routes(_: &mut Routes<Self>) {}

    fn actions() -> Vec<ActionSpec> {
        vec![ActionSpec::of::<MountEvent>("Mount")]
    }
}

fn setup() -> (EventBus, Arc<ModelService>) {
    let bus = EventBus::new(Arc::new(TokioExecutor::current()));
    let models = Arc::new(ModelService::new(bus.clone()));
    (bus, models)
}

fn catch_errors(bus: &EventBus) -> mpsc::UnboundedReceiver<ErrorEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    bus.subscribe(
        &ERROR,
        Handler::sync(move |event| {
            if let Some(e) = event.downcast_ref::<ErrorEvent>() {
                let _ = tx.send(e.clone());
            }
            Ok(())
        }),
        Anchor::Global,
        false,
    )
    .unwrap();
    rx
}

async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn attach_pushes_initial_props_and_routes_events() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus, models)
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let view = Arc::new(HeadlessView::new("status"));

    connector.attach(view.clone()).unwrap();
    assert!(connector.is_attached());
    assert_eq!(view.props(), Some(json!({ "label": "status" })));
    assert_eq!(connector.subscription_count(), 3);

    eventually(|| view.merged() == json!({ "label": "status", "mounted": true })).await;
}

#[tokio::test]
async fn detach_sends_unmount_to_current_presenters() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus.clone(), models)
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    connector
        .attach(Arc::new(HeadlessView::new("status")))
        .unwrap();

    let unmounts = Arc::new(AtomicUsize::new(0));
    let counter = unmounts.clone();
    bus.subscribe(
        &UNMOUNT,
        Handler::sync(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        connector.anchor(),
        false,
    )
    .unwrap();

    assert!(connector.detach());
    eventually(|| unmounts.load(Ordering::SeqCst) == 1).await;

    assert!(!connector.detach());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(unmounts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn detach_releases_every_subscription() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus.clone(), models)
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let view = Arc::new(HeadlessView::new("status"));
    connector.attach(view.clone()).unwrap();
    assert_eq!(bus.handler_count(&MOUNT, connector.anchor()), 1);
    assert_eq!(bus.handler_count(&MOUNT, Anchor::Global), 1);

    assert!(connector.detach());
    assert!(!connector.detach());
    assert!(!connector.is_attached());
    assert_eq!(connector.subscription_count(), 0);
    assert_eq!(bus.anchor_handler_count(connector.anchor()), 0);
    assert_eq!(bus.handler_count(&MOUNT, Anchor::Global), 0);

    connector.emit_async(MountEvent).await.unwrap();
    assert_eq!(view.updates(), 1);
}

#[tokio::test]
async fn reattach_swaps_view_and_presenters() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus.clone(), models)
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let first = Arc::new(HeadlessView::new("first"));
    let second = Arc::new(HeadlessView::new("second"));

    connector.attach(first.clone()).unwrap();
    connector.attach(second.clone()).unwrap();
    assert_eq!(connector.view().map(|v| v.name().to_string()), Some("second".into()));
    assert_eq!(bus.handler_count(&MOUNT, connector.anchor()), 1);

    eventually(|| second.updates() == 2).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(first.updates(), 1);
    assert_eq!(second.props(), Some(json!({ "mounted": true })));
}

#[tokio::test]
async fn suspended_handler_cannot_reach_a_later_view() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus, models)
        .presenter::<SlowPresenter>()
        .build()
        .unwrap();
    let first = Arc::new(HeadlessView::new("first"));
    let second = Arc::new(HeadlessView::new("second"));
    connector.attach(first.clone()).unwrap();

    let gate = Arc::new(Notify::new());
    connector.emit(Stall { gate: gate.clone() });
    tokio::task::yield_now().await;

    connector.attach(second.clone()).unwrap();
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(first.props(), None);
    assert_eq!(second.props(), None);

    let open = Arc::new(Notify::new());
    open.notify_one();
    connector.emit_async(Stall { gate: open }).await.unwrap();
    assert_eq!(second.props(), Some(json!({ "stale": true })));
}

#[tokio::test]
async fn restorable_route_replays_last_model_event() {
    let (bus, models) = setup();
    bus.emit_async(SensorReading { value: 7 }, Anchor::Global)
        .await
        .unwrap();

    let connector = ViewConnector::builder(bus, models)
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let view = Arc::new(HeadlessView::new("status"));
    connector.attach(view.clone()).unwrap();
    assert_eq!(view.updates(), 1);

    eventually(|| view.merged()["reading"] == json!(7)).await;
}

#[tokio::test]
async fn scoped_emit_stays_within_connector() {
    let (bus, models) = setup();
    let a = ViewConnector::builder(bus.clone(), Arc::clone(&models))
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let b = ViewConnector::builder(bus, models)
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let view_a = Arc::new(HeadlessView::new("a"));
    let view_b = Arc::new(HeadlessView::new("b"));
    a.attach(view_a.clone()).unwrap();
    b.attach(view_b.clone()).unwrap();

    eventually(|| view_a.updates() == 2 && view_b.updates() == 2).await;

    a.emit_async(MountEvent).await.unwrap();
    assert_eq!(view_a.updates(), 3);
    assert_eq!(view_b.updates(), 2);
}

#[tokio::test]
async fn actions_trigger_through_the_connector() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus, models)
        .label("status")
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    let view = Arc::new(HeadlessView::new("status"));
    connector.attach(view.clone()).unwrap();
    eventually(|| view.updates() == 2).await;

    let actions = connector.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name(), "Blink");
    assert_eq!(actions[0].event_type(), &BLINK);

    actions[0].trigger_async().await.unwrap();
    assert_eq!(view.merged()["blinked"], json!(true));

    actions[0].trigger();
    eventually(|| view.updates() == 4).await;
}

#[tokio::test]
async fn non_action_events_are_rejected_at_build() {
    let (bus, models) = setup();
    let result = ViewConnector::builder(bus, models)
        .presenter::<MislabeledActions>()
        .build();
    assert!(matches!(result, Err(BindingError::NotAnAction("Mount"))));
}

#[tokio::test]
async fn failing_handler_is_isolated_and_reported() {
    let (bus, models) = setup();
    let mut errors = catch_errors(&bus);
    let connector = ViewConnector::builder(bus, models)
        .presenter::<StatusPresenter>()
        .presenter::<FailingPresenter>()
        .build()
        .unwrap();
    let view = Arc::new(HeadlessView::new("status"));
    connector.attach(view.clone()).unwrap();

    let err = connector.emit_async(Poke).await.unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert!(err.failures()[0].label.ends_with("FailingPresenter::explode"));
    eventually(|| view.merged()["mounted"] == json!(true)).await;

    let reported = errors.recv().await.unwrap();
    assert_eq!(reported.source_event, Some("Poke"));
    assert!(reported.message.contains("boom"));
}

#[tokio::test]
async fn panicking_handler_is_reported_as_error() {
    let (bus, models) = setup();
    let mut errors = catch_errors(&bus);
    let connector = ViewConnector::builder(bus, models)
        .presenter::<FailingPresenter>()
        .build()
        .unwrap();
    connector
        .attach(Arc::new(HeadlessView::new("status")))
        .unwrap();

    let err = connector.emit_async(RenderEvent).await.unwrap_err();
    assert!(err.failures()[0].error.message().contains("render exploded"));

    let reported = errors.recv().await.unwrap();
    assert_eq!(reported.source_event, Some("Render"));
}

#[tokio::test]
async fn failing_error_handler_is_not_re_emitted() {
    let (bus, models) = setup();
    let mut errors = catch_errors(&bus);
    let connector = ViewConnector::builder(bus, models)
        .presenter::<FailingErrorPresenter>()
        .build()
        .unwrap();
    connector
        .attach(Arc::new(HeadlessView::new("errors")))
        .unwrap();

    let err = connector
        .emit_async(ErrorEvent::new("original"))
        .await
        .unwrap_err();
    assert_eq!(err.failures().len(), 1);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn missing_model_fails_attach() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus.clone(), models)
        .presenter::<StatusPresenter>()
        .presenter::<NeedsSettings>()
        .build()
        .unwrap();

    let result = connector.attach(Arc::new(HeadlessView::new("settings")));
    assert!(matches!(
        result,
        Err(BindingError::Model(ModelError::NotRegistered(_)))
    ));
    assert!(!connector.is_attached());
    assert_eq!(connector.subscription_count(), 0);
    assert_eq!(bus.handler_count(&MOUNT, Anchor::Global), 0);
}

#[tokio::test]
async fn dropping_connector_releases_anchor() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus.clone(), models)
        .label("status")
        .presenter::<StatusPresenter>()
        .build()
        .unwrap();
    connector
        .attach(Arc::new(HeadlessView::new("status")))
        .unwrap();
    let anchor = connector.anchor();
    assert_eq!(bus.anchor_label(anchor).as_deref(), Some("status"));

    drop(connector);
    assert!(bus.anchor_label(anchor).is_none());
    assert_eq!(bus.handler_count(&MOUNT, Anchor::Global), 0);
}

#[tokio::test]
async fn default_label_names_presenters() {
    let (bus, models) = setup();
    let connector = ViewConnector::builder(bus, models)
        .presenter::<StatusPresenter>()
        .presenter::<FailingPresenter>()
        .build()
        .unwrap();
    assert_eq!(connector.label(), "StatusPresenter+FailingPresenter");
}

#[tokio::test]
async fn subscribed_handlers_do_not_keep_the_bus_alive() {
    let bus = EventBus::new(Arc::new(TokioExecutor::current()));
    let weak = bus.downgrade();
    let call: Call = Arc::new(|_: EventRef| -> HandlerFuture { Box::pin(async { Ok(()) }) });
    bus.subscribe(
        &MOUNT,
        isolate(bus.downgrade(), "Idle", "on_mount", call),
        Anchor::Global,
        false,
    )
    .unwrap();
    assert!(weak.upgrade().is_some());

    drop(bus);
    assert!(weak.upgrade().is_none());
}
