//! eduframe - 事件驱动的 MVP 框架核心
//!
//! 模块结构：
//! - core: 事件层级、服务注册
//! - bus: 带 anchor 的层级发布/订阅
//! - services: 端口（datasource、执行器、配置）与适配器
//! - models: 绑定到 datasource 的状态对象
//! - views: 视图契约
//! - presenters: presenter 与 ViewConnector
//! - router: 路径路由
//! - app: 应用装配

pub mod app;
pub mod bus;
pub mod core;
pub mod logging;
pub mod models;
pub mod presenters;
pub mod router;
pub mod services;
pub mod views;

pub use app::{Application, ApplicationBuilder};
pub use bus::{Anchor, AnchorId, EmitError, EventBus, Handler, HandlerError};
pub use presenters::{Presenter, PresenterContext, Routes, ViewConnector};
