//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::ConfigService;
use crate::config::Settings;
use crate::domain::Pipeline;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub config_service: ConfigService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let pipeline = Pipeline::new().with_max_eval_depth(settings.expansion.max_eval_depth);
        let config_service = ConfigService::with_pipeline(Arc::clone(&fs), pipeline);

        Self {
            settings: Arc::new(settings),
            fs,
            config_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_settings_when_building_container_then_pipeline_uses_configured_depth() {
        let mut settings = Settings::default();
        settings.expansion.max_eval_depth = 3;

        let container = ServiceContainer::new(settings);

        assert_eq!(container.config_service.pipeline().max_eval_depth(), 3);
        assert_eq!(container.settings.expansion.max_eval_depth, 3);
    }
}
