use chrono::{DateTime, Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::TenantId;

/// Daily time-of-day window. `start > end` wraps past midnight
/// (e.g. 22:00 to 04:00).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Polygonal high-demand area with a pricing multiplier. When several
/// zones cover the same point, the highest multiplier wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeZone {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub boundary: Vec<GeoPoint>,
    pub multiplier: Decimal,
    pub is_active: bool,
    /// No window means the zone applies all day.
    pub window: Option<TimeWindow>,
    /// Days counted from Monday = 0; empty means every day.
    pub days_of_week: Vec<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SurgeZone {
    pub fn applies_at(&self, at: DateTime<Utc>) -> bool {
        if let Some(window) = &self.window {
            if !window.contains(at.time()) {
                return false;
            }
        }

        if !self.days_of_week.is_empty() {
            let weekday = at.weekday().num_days_from_monday();
            if !self.days_of_week.contains(&weekday) {
                return false;
            }
        }

        true
    }
}
