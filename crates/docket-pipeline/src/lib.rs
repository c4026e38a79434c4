//! # docket-pipeline: Case Lifecycle and Document Generation
//!
//! Runs a case from "generate my documents" to a terminal phase:
//!
//! ```text
//!  trigger ─▶ LifecycleController ─▶ WorkQueue ─▶ Worker
//!                                                  │
//!          RoutingEngine ◀── run_pipeline ◀────────┘
//!                │
//!             gate::validate ─▶ Orchestrator ─▶ ContentGenerator
//!                                    │         └▶ ArtifactRenderer
//!                                    ▼
//!                              PipelineStore
//! ```
//!
//! - [`controller`]: trigger, routing, gating and reset.
//! - [`orchestrator`]: batch creation, sequential job execution, retries.
//! - [`registry`]: document types, templates and content rules.
//! - [`collaborator`]: the seams to the fact store, the content generator,
//!   the renderer and the clock. [`dev`] holds in-process implementations.
//! - [`queue`]: at-least-once delivery of pipeline runs.
//! - [`store`]: in-memory state shared by all of the above.
//! - [`config`]: YAML plus environment configuration.

pub mod collaborator;
pub mod config;
pub mod controller;
pub mod dev;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod registry;
pub mod store;

#[cfg(test)]
mod testing;

pub use collaborator::{
    ArtifactRenderer, Clock, CollaboratorError, ContentGenerator, FactStore, FactStoreError,
    FixedClock, SystemClock,
};
pub use config::{ConfigError, PipelineConfig};
pub use controller::{CaseStatusView, Collaborators, LifecycleController, RunOutcome, TriggerOutcome};
pub use dev::{InMemoryFactStore, InlineArtifactRenderer, TemplateContentGenerator};
pub use error::{PipelineError, RetryRejection};
pub use orchestrator::{BatchOutcome, Orchestrator, GENERATION_FAILED};
pub use queue::{PipelineTask, QueueError, TaskHandler, WorkQueue, Worker};
pub use registry::{
    ContentRule, DocumentDefinition, DocumentRegistry, RenderKind, TemplateError, TEMPLATE_FIELDS,
};
pub use store::{PipelineStore, Store};
