use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::core::event::EventRef;

pub type HandlerResult = Result<(), HandlerError>;
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

type Callback = Arc<dyn Fn(EventRef) -> HandlerFuture + Send + Sync>;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {}

/// A subscribable callback.
///
/// Identity is the [`HandlerId`] minted at construction; clones share it, so
/// subscribing a clone of an already registered handler is a no-op.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    label: Arc<str>,
    callback: Callback,
}

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(EventRef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            id: HandlerId::next(),
            label: Arc::from("handler"),
            callback: Arc::new(move |event| f(event).boxed()),
        }
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(EventRef) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(move |event| std::future::ready(f(event)))
    }

    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the handler, turning a panic into a [`HandlerError`].
    pub fn invoke(&self, event: EventRef) -> HandlerFuture {
        let callback = Arc::clone(&self.callback);
        guarded(async move { callback(event).await }).boxed()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id.0)
            .field("label", &self.label)
            .finish()
    }
}

pub(crate) async fn guarded<Fut>(fut: Fut) -> HandlerResult
where
    Fut: Future<Output = HandlerResult> + Send,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(HandlerError::new(format!("handler panicked: {detail}")))
        }
    }
}
