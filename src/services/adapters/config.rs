use std::sync::{PoisonError, RwLock};

use crate::core::Service;
use crate::services::ports::FrameworkConfig;

pub struct ConfigService {
    config: RwLock<FrameworkConfig>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_config(FrameworkConfig::default())
    }

    pub fn with_config(config: FrameworkConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> FrameworkConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut FrameworkConfig)) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for ConfigService {
    fn name(&self) -> &'static str {
        "ConfigService"
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/adapters/config.rs"]
mod tests;
