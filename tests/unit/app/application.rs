use super::*;
use crate::core::event::{MountEvent, MOUNT};
use crate::models::ConnectionModel;
use crate::presenters::{Presenter, PresenterContext, Result, Routes};
use crate::services::adapters::{OfflineDatasource, TokioExecutor};
use crate::services::ports::ConnectionStatus;
use crate::views::HeadlessView;
use serde_json::json;

struct RoutePresenter {
    ctx: PresenterContext,
}

impl Presenter for RoutePresenter {
    fn new(ctx: PresenterContext) -> Result<Self> {
        Ok(Self { ctx })
    }

    fn routes(routes: &mut Routes<Self>) {
        routes.on_sync("on_mount", &[&MOUNT], |p, _| {
            let current = p
                .ctx
                .router()
                .and_then(|r| r.resolve("/boards/1"))
                .map(|r| r.target);
            p.ctx.set_view_props(json!({ "target": current }));
            Ok(())
        });
    }
}

fn executor() -> Arc<dyn AsyncExecutor> {
    Arc::new(TokioExecutor::current())
}

#[tokio::test]
async fn build_registers_core_services() {
    let app = Application::builder(FrameworkConfig::default(), executor())
        .build()
        .unwrap();

    let services = app.services();
    assert!(services.contains::<EventBus>());
    assert!(services.contains::<ModelService>());
    assert!(services.contains::<ConfigService>());
    assert!(!services.contains::<RouterService>());
    assert!(app.router().is_none());
    assert!(Arc::ptr_eq(
        &services.require::<ModelService>().unwrap(),
        app.models()
    ));
}

#[tokio::test]
async fn config_is_shared_through_the_service() {
    let config = FrameworkConfig {
        candidate_timeout_ms: Some(250),
        ..FrameworkConfig::default()
    };
    let app = Application::builder(config.clone(), executor())
        .build()
        .unwrap();
    assert_eq!(app.config(), config);

    let offline: Arc<dyn AsynchronousDatasource> = Arc::new(OfflineDatasource::new());
    let adaptive = app.adaptive_datasource(vec![offline]);
    assert!(adaptive.init().await);
    assert!(adaptive.active().is_some());
}

#[tokio::test]
async fn connector_reaches_router() {
    let mut router = Router::new();
    router
        .add("board", "/boards/{int}", "board".to_string())
        .unwrap();
    let app = Application::builder(FrameworkConfig::default(), executor())
        .router(router)
        .build()
        .unwrap();
    assert!(app.services().contains::<RouterService>());

    let connector = app.connector().presenter::<RoutePresenter>().build().unwrap();
    let view = Arc::new(HeadlessView::new("nav"));
    connector.attach(view.clone()).unwrap();
    connector.emit_async(MountEvent).await.unwrap();

    assert_eq!(view.props(), Some(json!({ "target": "board" })));
}

#[tokio::test]
async fn register_model_goes_through_model_service() {
    let app = Application::builder(FrameworkConfig::default(), executor())
        .build()
        .unwrap();
    let ds = Arc::new(OfflineDatasource::new());
    ds.init().await;

    let model = app.register_model::<ConnectionModel>(ds, None).unwrap();
    assert_eq!(model.status(), ConnectionStatus::Disconnected);
    assert!(app.models().contains::<ConnectionModel>());
}
