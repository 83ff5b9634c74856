//! 视图层契约
//!
//! 渲染不在本 crate 内。视图只需要接收 presenter 推送的 props，
//! 并通过 `ViewConnector` 把用户交互作为事件发出。

mod headless;

pub use headless::HeadlessView;

/// View properties pushed by presenters. Shape is up to the view.
pub type Props = serde_json::Value;

pub trait View: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Replaces the view's props. Called from presenter handlers, possibly off
    /// the UI thread.
    fn set_props(&self, props: Props);
}
