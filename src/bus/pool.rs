use rustc_hash::FxHashMap;
use slotmap::new_key_type;

use super::handler::{Handler, HandlerId};
use crate::core::event::EventType;

new_key_type! {
    /// Opaque subscription scope minted by [`super::EventBus::mint_anchor`].
    pub struct AnchorId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Global,
    Scoped(AnchorId),
}

impl Anchor {
    pub fn is_global(self) -> bool {
        matches!(self, Anchor::Global)
    }
}

impl From<AnchorId> for Anchor {
    fn from(id: AnchorId) -> Self {
        Anchor::Scoped(id)
    }
}

impl From<Option<AnchorId>> for Anchor {
    fn from(id: Option<AnchorId>) -> Self {
        id.map_or(Anchor::Global, Anchor::Scoped)
    }
}

type TypeTable = FxHashMap<&'static EventType, Vec<Handler>>;

/// `anchor -> event_type -> handlers`, with set semantics per leaf.
#[derive(Default)]
pub(crate) struct HandlerPool {
    anchors: FxHashMap<Anchor, TypeTable>,
}

impl HandlerPool {
    pub fn insert(&mut self, anchor: Anchor, event_type: &'static EventType, handler: Handler) -> usize {
        let set = self
            .anchors
            .entry(anchor)
            .or_default()
            .entry(event_type)
            .or_default();
        if !set.contains(&handler) {
            set.push(handler);
        }
        set.len()
    }

    pub fn remove(&mut self, anchor: Anchor, event_type: &'static EventType, id: HandlerId) -> bool {
        let Some(table) = self.anchors.get_mut(&anchor) else {
            return false;
        };
        let Some(set) = table.get_mut(event_type) else {
            return false;
        };
        let before = set.len();
        set.retain(|h| h.id() != id);
        let removed = set.len() != before;
        if set.is_empty() {
            table.remove(event_type);
        }
        if table.is_empty() {
            self.anchors.remove(&anchor);
        }
        removed
    }

    pub fn clear(&mut self, anchor: Anchor, event_type: &'static EventType) -> usize {
        let Some(table) = self.anchors.get_mut(&anchor) else {
            return 0;
        };
        let removed = table.remove(event_type).map_or(0, |set| set.len());
        if table.is_empty() {
            self.anchors.remove(&anchor);
        }
        removed
    }

    pub fn clear_anchor(&mut self, anchor: Anchor) -> usize {
        self.anchors
            .remove(&anchor)
            .map_or(0, |table| table.values().map(Vec::len).sum())
    }

    pub fn snapshot(&self, anchor: Anchor, event_type: &'static EventType) -> Vec<Handler> {
        self.anchors
            .get(&anchor)
            .and_then(|table| table.get(event_type))
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, anchor: Anchor, event_type: &'static EventType) -> usize {
        self.anchors
            .get(&anchor)
            .and_then(|table| table.get(event_type))
            .map_or(0, Vec::len)
    }

    pub fn anchor_len(&self, anchor: Anchor) -> usize {
        self.anchors
            .get(&anchor)
            .map_or(0, |table| table.values().map(Vec::len).sum())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bus/pool.rs"]
mod tests;
