use std::sync::Arc;

use modbot_pipeline::collaborators::MediaResolver;
use modbot_pipeline::config::PipelineConfig;
use modbot_queue::TaskQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: modbot_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Pipeline identity and policy configuration.
    pub pipeline: Arc<PipelineConfig>,
    /// Enqueue handle for background tasks.
    pub queue: TaskQueue,
    /// Media metadata resolver used during admission.
    pub resolver: Arc<dyn MediaResolver>,
}
