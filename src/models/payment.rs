use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Captured => "captured",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        matches!(
            (*self, to),
            (PaymentStatus::Pending, PaymentStatus::Authorized)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Authorized, PaymentStatus::Captured)
                | (PaymentStatus::Authorized, PaymentStatus::Failed)
                | (PaymentStatus::Captured, PaymentStatus::Refunded)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(&self, to: PayoutStatus) -> bool {
        matches!(
            (*self, to),
            (PayoutStatus::Pending, PayoutStatus::Processing)
                | (PayoutStatus::Processing, PayoutStatus::Completed)
                | (PayoutStatus::Processing, PayoutStatus::Failed)
        )
    }
}

/// One per job. Payment and payout advance independently: a captured
/// payment may still have a pending payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub job_id: Uuid,
    pub amount: Decimal,
    pub service_fee: Decimal,
    pub driver_payout: Decimal,
    pub platform_commission: Decimal,
    pub payment_status: PaymentStatus,
    pub payout_status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{PaymentStatus, PayoutStatus};

    #[test]
    fn payment_happy_path_is_allowed() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Authorized));
        assert!(PaymentStatus::Authorized.can_transition_to(PaymentStatus::Captured));
        assert!(PaymentStatus::Captured.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn captured_payment_cannot_fail() {
        assert!(!PaymentStatus::Captured.can_transition_to(PaymentStatus::Failed));
    }

    #[test]
    fn refunded_and_failed_are_terminal() {
        for to in [
            PaymentStatus::Pending,
            PaymentStatus::Authorized,
            PaymentStatus::Captured,
            PaymentStatus::Refunded,
            PaymentStatus::Failed,
        ] {
            assert!(!PaymentStatus::Refunded.can_transition_to(to));
            assert!(!PaymentStatus::Failed.can_transition_to(to));
        }
    }

    #[test]
    fn payout_cannot_skip_processing() {
        assert!(!PayoutStatus::Pending.can_transition_to(PayoutStatus::Completed));
        assert!(PayoutStatus::Pending.can_transition_to(PayoutStatus::Processing));
        assert!(PayoutStatus::Processing.can_transition_to(PayoutStatus::Completed));
        assert!(PayoutStatus::Processing.can_transition_to(PayoutStatus::Failed));
    }
}
