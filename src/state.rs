//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::ecs::ControlPlane;
use crate::metadata::MetadataClient;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Contains the application configuration, the injected ECS control-plane
/// handle, and the task metadata endpoint client.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub control_plane: Arc<dyn ControlPlane>,
    pub metadata: MetadataClient,
}

impl AppState {
    /// Creates a new application state from the given configuration,
    /// control-plane handle, and metadata client.
    pub fn new(
        config: AppConfig,
        control_plane: Arc<dyn ControlPlane>,
        metadata: MetadataClient,
    ) -> Self {
        Self {
            config: Arc::new(config),
            control_plane,
            metadata,
        }
    }
}
