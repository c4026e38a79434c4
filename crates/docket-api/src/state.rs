//! # Application State
//!
//! Shared state handed to every handler: the lifecycle controller (which
//! owns the stores, the routing engine, and the work queue) and the
//! server configuration.

use std::sync::Arc;

use docket_pipeline::{
    Collaborators, ConfigError, LifecycleController, PipelineConfig, PipelineStore, Worker,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<LifecycleController>,
    pub config: AppConfig,
}

impl AppState {
    pub fn from_controller(controller: Arc<LifecycleController>, config: AppConfig) -> Self {
        Self { controller, config }
    }

    /// State backed by the in-memory store and the development
    /// collaborators. The returned worker must be spawned for triggered
    /// runs to progress.
    pub fn in_memory(
        config: AppConfig,
        pipeline: &PipelineConfig,
    ) -> Result<(Self, Worker<LifecycleController>), ConfigError> {
        let store = PipelineStore::new();
        let registry = Arc::new(pipeline.document_registry()?);
        let collaborators = Collaborators::development(&store, Arc::clone(&registry));
        let (controller, worker) =
            LifecycleController::assemble(pipeline, store, registry, collaborators)?;
        Ok((Self::from_controller(controller, config), worker))
    }
}
