use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingDirection {
    CustomerToDriver,
    DriverToCustomer,
}

/// At most one per (job, direction); a completed job can carry two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub job_id: Uuid,
    pub direction: RatingDirection,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub stars: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
