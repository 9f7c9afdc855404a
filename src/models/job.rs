use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Confirmed,
    Assigned,
    EnRoute,
    Arrived,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Confirmed => "confirmed",
            JobStatus::Assigned => "assigned",
            JobStatus::EnRoute => "en_route",
            JobStatus::Arrived => "arrived",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// A driver is actively committed to the job in these states; they
    /// count toward dispatch load balancing.
    pub fn is_open_for_driver(&self) -> bool {
        matches!(
            self,
            JobStatus::Assigned | JobStatus::EnRoute | JobStatus::Arrived | JobStatus::InProgress
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobItem {
    pub item_type: String,
    pub quantity: u32,
}

/// Itemized quote, frozen at booking time. The components always sum to
/// `total`; rules changing later never reprice an existing job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub items: Decimal,
    pub volume_adjustment: Decimal,
    pub surge: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

/// Driver/platform split of the pool left after the service fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutSplit {
    pub driver_payout: Decimal,
    pub platform_commission: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: JobStatus,
    pub address: String,
    pub location: GeoPoint,
    pub items: Vec<JobItem>,
    pub photos: Vec<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub price: PriceBreakdown,
    pub payout: Option<PayoutSplit>,
    pub surge_multiplier: Decimal,
    /// Bumped on every committed transition; optimistic concurrency token.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
