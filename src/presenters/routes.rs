use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use crate::bus::{HandlerFuture, HandlerResult};
use crate::core::event::{EventRef, EventType};

pub(crate) type RouteFn<P> = Arc<dyn Fn(Arc<P>, EventRef) -> HandlerFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub event_type: &'static EventType,
    /// Subscribe with replay of the last event of this type.
    pub restorable: bool,
}

pub(crate) struct Route<P> {
    pub(crate) method: &'static str,
    pub(crate) entries: Vec<RouteEntry>,
    pub(crate) call: RouteFn<P>,
}

/// Per-presenter route table, bucketed by method name.
///
/// A method routed twice to the same event type keeps a single entry; the
/// entry is restorable if any of the declarations asked for it. The first
/// callback registered for a method name is the one that runs.
pub struct Routes<P> {
    routes: Vec<Route<P>>,
}

impl<P> Default for Routes<P> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<P: Send + Sync + 'static> Routes<P> {
    pub fn on<F, Fut>(&mut self, method: &'static str, types: &[&'static EventType], f: F) -> &mut Self
    where
        F: Fn(Arc<P>, EventRef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(
            method,
            types,
            false,
            Arc::new(move |p: Arc<P>, e: EventRef| f(p, e).boxed()),
        );
        self
    }

    pub fn on_restorable<F, Fut>(
        &mut self,
        method: &'static str,
        types: &[&'static EventType],
        f: F,
    ) -> &mut Self
    where
        F: Fn(Arc<P>, EventRef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(
            method,
            types,
            true,
            Arc::new(move |p: Arc<P>, e: EventRef| f(p, e).boxed()),
        );
        self
    }

    pub fn on_sync<F>(&mut self, method: &'static str, types: &[&'static EventType], f: F) -> &mut Self
    where
        F: Fn(&P, EventRef) -> HandlerResult + Send + Sync + 'static,
    {
        self.push(
            method,
            types,
            false,
            Arc::new(move |p: Arc<P>, e: EventRef| futures::future::ready(f(&*p, e)).boxed()),
        );
        self
    }

    fn push(
        &mut self,
        method: &'static str,
        types: &[&'static EventType],
        restorable: bool,
        call: RouteFn<P>,
    ) {
        let index = match self.routes.iter().position(|r| r.method == method) {
            Some(index) => index,
            None => {
                self.routes.push(Route {
                    method,
                    entries: Vec::new(),
                    call,
                });
                self.routes.len() - 1
            }
        };
        let route = &mut self.routes[index];
        for &event_type in types {
            match route.entries.iter_mut().find(|e| e.event_type == event_type) {
                Some(entry) => entry.restorable |= restorable,
                None => route.entries.push(RouteEntry {
                    event_type,
                    restorable,
                }),
            }
        }
    }
}

impl<P> Routes<P> {
    pub fn entries(&self, method: &str) -> &[RouteEntry] {
        self.routes
            .iter()
            .find(|r| r.method == method)
            .map(|r| r.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.routes.iter().map(|r| r.method).collect()
    }

    /// Number of `(method, event type)` pairs.
    pub fn len(&self) -> usize {
        self.routes.iter().map(|r| r.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Route<P>> {
        self.routes.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presenters/routes.rs"]
mod tests;
