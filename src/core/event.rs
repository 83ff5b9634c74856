//! Event types and the built-in event hierarchy.
//!
//! Every event type is a `static EventType` that points at its parent. The
//! chain always ends at [`EVENT`], the abstract root, which is never a valid
//! subscription key. Below the root there are exactly two branches:
//! [`VIEW_EVENT`] (UI -> logic) and [`MODEL_EVENT`] (data -> logic).
//!
//! Event types are compared by identity, so two statics with the same name are
//! still distinct topics.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::services::ports::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Root,
    View,
    Model,
}

pub struct EventType {
    name: &'static str,
    parent: Option<&'static EventType>,
}

impl EventType {
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    pub const fn derived(name: &'static str, parent: &'static EventType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static EventType> {
        self.parent
    }

    pub fn is_abstract(&self) -> bool {
        self.parent.is_none()
    }

    /// Walks from this type up to, but not including, the abstract root.
    pub fn ancestors(&'static self) -> Ancestors {
        Ancestors { next: Some(self) }
    }

    pub fn is_a(&'static self, other: &'static EventType) -> bool {
        self.ancestors().any(|t| t == other)
    }

    pub fn origin(&'static self) -> Origin {
        if self.is_a(&VIEW_EVENT) {
            Origin::View
        } else if self.is_a(&MODEL_EVENT) {
            Origin::Model
        } else {
            Origin::Root
        }
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const EventType).hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub struct Ancestors {
    next: Option<&'static EventType>,
}

impl Iterator for Ancestors {
    type Item = &'static EventType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|t| !t.is_abstract())?;
        self.next = current.parent;
        Some(current)
    }
}

pub trait Event: Any + fmt::Debug + Send + Sync {
    fn event_type(&self) -> &'static EventType;

    fn as_any(&self) -> &dyn Any;
}

/// Implemented for concrete event structs so generic code can name their type
/// without an instance.
pub trait EventClass: Event {
    fn static_type() -> &'static EventType;
}

pub type EventRef = Arc<dyn Event>;

impl dyn Event {
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is_a(&self, event_type: &'static EventType) -> bool {
        self.event_type().is_a(event_type)
    }

    pub fn origin(&self) -> Origin {
        self.event_type().origin()
    }
}

pub trait IntoEvent {
    fn into_event(self) -> EventRef;
}

impl<E: Event> IntoEvent for E {
    fn into_event(self) -> EventRef {
        Arc::new(self)
    }
}

impl IntoEvent for EventRef {
    fn into_event(self) -> EventRef {
        self
    }
}

/// Declares a static event type below `$parent`.
///
/// ```ignore
/// event_type!(pub static BOARD_STATUS = "BoardStatus" : MODEL_EVENT);
/// ```
#[macro_export]
macro_rules! event_type {
    ($(#[$meta:meta])* $vis:vis static $ident:ident = $name:literal : $parent:path) => {
        $(#[$meta])*
        $vis static $ident: $crate::core::event::EventType =
            $crate::core::event::EventType::derived($name, &$parent);
    };
}

/// Binds a struct to a declared event type.
#[macro_export]
macro_rules! impl_event {
    ($ty:ty => $event_type:path) => {
        impl $crate::core::event::Event for $ty {
            fn event_type(&self) -> &'static $crate::core::event::EventType {
                &$event_type
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::core::event::EventClass for $ty {
            fn static_type() -> &'static $crate::core::event::EventType {
                &$event_type
            }
        }
    };
}

pub static EVENT: EventType = EventType::root("Event");
pub static VIEW_EVENT: EventType = EventType::derived("ViewEvent", &EVENT);
pub static MODEL_EVENT: EventType = EventType::derived("ModelEvent", &EVENT);

event_type!(pub static MOUNT = "Mount" : VIEW_EVENT);
event_type!(pub static UNMOUNT = "Unmount" : VIEW_EVENT);
event_type!(pub static RENDER = "Render" : VIEW_EVENT);
event_type!(pub static RESIZE = "Resize" : VIEW_EVENT);
event_type!(
    /// Generic failure topic. Subscribing here also catches every error subtype.
    pub static ERROR = "Error" : VIEW_EVENT
);
event_type!(
    /// Base of every UI action exposed through a connector's action list.
    pub static ACTION = "Action" : VIEW_EVENT
);
event_type!(pub static NAVIGATION = "Navigation" : VIEW_EVENT);
event_type!(pub static CONNECTION_STATUS = "ConnectionStatus" : MODEL_EVENT);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountEvent;
impl_event!(MountEvent => MOUNT);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmountEvent;
impl_event!(UnmountEvent => UNMOUNT);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderEvent;
impl_event!(RenderEvent => RENDER);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeEvent {
    pub width: u32,
    pub height: u32,
}
impl_event!(ResizeEvent => RESIZE);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub message: String,
    /// Name of the event whose handler failed, when the error came from dispatch.
    pub source_event: Option<&'static str>,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source_event: None,
        }
    }

    pub fn from_dispatch(message: impl Into<String>, source: &'static EventType) -> Self {
        Self {
            message: message.into(),
            source_event: Some(source.name()),
        }
    }
}
impl_event!(ErrorEvent => ERROR);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub path: String,
    pub route: Option<String>,
}
impl_event!(NavigationEvent => NAVIGATION);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatusEvent {
    pub status: ConnectionStatus,
}
impl_event!(ConnectionStatusEvent => CONNECTION_STATUS);

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
