use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Suspended,
    Rejected,
}

/// Driver profile attached to a driver-role user. The driver mutates
/// location and the online flag; an admin mutates approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contractor {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub user_id: Uuid,
    pub truck_type: Option<String>,
    pub truck_capacity: Option<f64>,
    pub location: Option<GeoPoint>,
    pub is_online: bool,
    pub approval_status: ApprovalStatus,
    pub avg_rating: f64,
    pub total_jobs: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contractor {
    /// Eligible to receive dispatch offers right now.
    pub fn is_dispatchable(&self) -> bool {
        self.is_online && self.approval_status == ApprovalStatus::Approved && self.location.is_some()
    }
}
