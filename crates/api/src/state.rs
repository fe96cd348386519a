use std::sync::Arc;

use docket_workflow::{EditRequestWorkflow, PgEditRequestStore};

use crate::config::ServerConfig;
use crate::storage::AttachmentStore;
use crate::ws::WsManager;

/// The workflow as wired in the server.
pub type Workflow = EditRequestWorkflow<PgEditRequestStore>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: docket_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection and room registry.
    pub ws_manager: Arc<WsManager>,
    /// Bus the workflow publishes to; the room router drains it.
    pub event_bus: Arc<docket_events::EventBus>,
    pub workflow: Arc<Workflow>,
    pub attachments: Arc<AttachmentStore>,
}

impl AppState {
    /// Wire the workflow and collaborators around a pool and config.
    pub fn new(pool: docket_db::DbPool, config: ServerConfig) -> Self {
        let event_bus = Arc::new(docket_events::EventBus::default());
        let workflow = Arc::new(EditRequestWorkflow::new(
            PgEditRequestStore::new(pool.clone()),
            event_bus.clone(),
            config.edit_policy,
        ));
        let attachments = Arc::new(AttachmentStore::new(&config.attachment_root));

        Self {
            pool,
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            event_bus,
            workflow,
            attachments,
        }
    }
}
