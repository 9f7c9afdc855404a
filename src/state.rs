use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::models::TenantId;
use crate::models::job::JobStatus;
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Unit of work for the auto-dispatch engine.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub tenant_id: TenantId,
    pub job_id: Uuid,
    pub attempt: u32,
}

/// Broadcast on every committed lifecycle transition. External consumers
/// (notification delivery, dashboards) subscribe via the websocket feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub tenant_id: TenantId,
    pub job_id: Uuid,
    pub status: JobStatus,
    pub driver_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub dispatch_tx: mpsc::Sender<DispatchRequest>,
    pub job_events_tx: broadcast::Sender<JobEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> (Self, mpsc::Receiver<DispatchRequest>) {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(config.dispatch_queue_size);
        let (job_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                config,
                store: Store::new(),
                dispatch_tx,
                job_events_tx,
                metrics: Metrics::new(),
            },
            dispatch_rx,
        )
    }
}
