use std::sync::{Mutex, PoisonError};

use super::{Props, View};
use crate::models::merge_state;

/// A view without a renderer. Keeps the latest props and every update, which
/// is what a host without a UI toolkit (or a test) needs to observe.
pub struct HeadlessView {
    name: String,
    history: Mutex<Vec<Props>>,
}

impl HeadlessView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn props(&self) -> Option<Props> {
        self.lock().last().cloned()
    }

    /// Every update folded into one object, later keys winning.
    pub fn merged(&self) -> Props {
        let mut merged = Props::Object(Default::default());
        for props in self.lock().iter() {
            merge_state(&mut merged, props.clone());
        }
        merged
    }

    pub fn updates(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Props>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl View for HeadlessView {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_props(&self, props: Props) {
        tracing::trace!(view = %self.name, "props updated");
        self.lock().push(props);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/views/headless.rs"]
mod tests;
