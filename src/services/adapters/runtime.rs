use std::io;

use crate::services::ports::{AsyncExecutor, Task};

/// Spawns onto a tokio runtime through its handle.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime; use [`Self::try_current`]
    /// where that can happen.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }

    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }
}

impl AsyncExecutor for TokioExecutor {
    fn spawn(&self, task: Task) {
        self.handle.spawn(task);
    }
}

/// Owned runtime for hosts that do not run one themselves.
pub struct OwnedRuntime {
    runtime: tokio::runtime::Runtime,
}

impl OwnedRuntime {
    pub fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Ok(Self { runtime })
    }

    pub fn executor(&self) -> TokioExecutor {
        TokioExecutor::new(self.runtime.handle().clone())
    }

    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/adapters/runtime.rs"]
mod tests;
