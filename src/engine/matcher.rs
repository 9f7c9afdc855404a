use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::{GeoPoint, haversine_km};
use crate::models::TenantId;
use crate::store::Store;

/// One eligible driver for a job, in dispatch preference order.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub contractor_id: Uuid,
    pub user_id: Uuid,
    pub distance_km: f64,
    pub open_jobs: usize,
}

/// Rank online, approved contractors within the search radius: nearest
/// first, ties broken by fewer open jobs. The caller commits one; this is
/// a read-only snapshot and candidates must be re-validated at commit
/// time.
pub fn find_candidates(
    store: &Store,
    tenant_id: TenantId,
    job_location: &GeoPoint,
    radius_km: f64,
) -> Result<Vec<Candidate>, AppError> {
    let mut candidates: Vec<Candidate> = store
        .contractors(tenant_id)
        .into_iter()
        .filter(|contractor| contractor.is_dispatchable())
        .filter_map(|contractor| {
            let location = contractor.location?;
            let distance_km = haversine_km(&location, job_location);
            if distance_km <= radius_km {
                Some(Candidate {
                    contractor_id: contractor.id,
                    user_id: contractor.user_id,
                    distance_km,
                    open_jobs: store.open_job_count(tenant_id, contractor.id),
                })
            } else {
                None
            }
        })
        .collect();

    if candidates.is_empty() {
        return Err(AppError::NoCandidatesFound);
    }

    candidates.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.open_jobs.cmp(&b.open_jobs))
    });

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::find_candidates;
    use crate::error::AppError;
    use crate::geo::GeoPoint;
    use crate::models::TenantId;
    use crate::models::contractor::{ApprovalStatus, Contractor};
    use crate::models::job::{Job, JobItem, JobStatus, PriceBreakdown};
    use crate::store::Store;

    fn tenant() -> TenantId {
        TenantId(Uuid::from_u128(1))
    }

    fn contractor(lat: f64, lng: f64) -> Contractor {
        let now = Utc::now();
        Contractor {
            id: Uuid::new_v4(),
            tenant_id: tenant(),
            user_id: Uuid::new_v4(),
            truck_type: Some("box_truck".to_string()),
            truck_capacity: Some(12.0),
            location: Some(GeoPoint { lat, lng }),
            is_online: true,
            approval_status: ApprovalStatus::Approved,
            avg_rating: 4.5,
            total_jobs: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn open_job_for(driver_id: Uuid) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            tenant_id: tenant(),
            customer_id: Uuid::new_v4(),
            driver_id: Some(driver_id),
            status: JobStatus::Assigned,
            address: "201 SE 2nd Ave".to_string(),
            location: GeoPoint {
                lat: 25.77,
                lng: -80.19,
            },
            items: vec![JobItem {
                item_type: "mattress".to_string(),
                quantity: 1,
            }],
            photos: Vec::new(),
            scheduled_at: None,
            accepted_at: Some(now),
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            price: PriceBreakdown {
                items: Decimal::new(5000, 2),
                volume_adjustment: Decimal::ZERO,
                surge: Decimal::ZERO,
                service_fee: Decimal::new(500, 2),
                total: Decimal::new(5500, 2),
            },
            payout: None,
            surge_multiplier: Decimal::ONE,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn pickup() -> GeoPoint {
        GeoPoint {
            lat: 25.7617,
            lng: -80.1918,
        }
    }

    #[test]
    fn nearest_contractor_ranks_first() {
        let store = Store::new();
        let near = contractor(25.7620, -80.1920);
        let far = contractor(25.9000, -80.1500);
        let near_id = near.id;
        store.insert_contractor(near);
        store.insert_contractor(far);

        let candidates = find_candidates(&store, tenant(), &pickup(), 30.0).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].contractor_id, near_id);
        assert!(candidates[0].distance_km < candidates[1].distance_km);
    }

    #[test]
    fn distance_tie_breaks_on_open_jobs() {
        let store = Store::new();
        let busy = contractor(25.7620, -80.1920);
        let idle = contractor(25.7620, -80.1920);
        let busy_id = busy.id;
        let idle_id = idle.id;
        store.insert_contractor(busy);
        store.insert_contractor(idle);
        store.insert_job(open_job_for(busy_id));

        let candidates = find_candidates(&store, tenant(), &pickup(), 30.0).unwrap();

        assert_eq!(candidates[0].contractor_id, idle_id);
        assert_eq!(candidates[0].open_jobs, 0);
        assert_eq!(candidates[1].open_jobs, 1);
    }

    #[test]
    fn offline_and_unapproved_contractors_are_excluded() {
        let store = Store::new();

        let mut offline = contractor(25.7620, -80.1920);
        offline.is_online = false;
        store.insert_contractor(offline);

        let mut pending = contractor(25.7620, -80.1920);
        pending.approval_status = ApprovalStatus::Pending;
        store.insert_contractor(pending);

        let err = find_candidates(&store, tenant(), &pickup(), 30.0).unwrap_err();
        assert!(matches!(err, AppError::NoCandidatesFound));
    }

    #[test]
    fn out_of_radius_contractors_are_excluded() {
        let store = Store::new();
        // West Palm Beach, ~110 km north of the pickup.
        store.insert_contractor(contractor(26.7153, -80.0534));

        let err = find_candidates(&store, tenant(), &pickup(), 5.0).unwrap_err();
        assert!(matches!(err, AppError::NoCandidatesFound));
    }

    #[test]
    fn other_tenants_never_appear() {
        let store = Store::new();
        let mut foreign = contractor(25.7620, -80.1920);
        foreign.tenant_id = TenantId(Uuid::from_u128(2));
        store.insert_contractor(foreign);

        let err = find_candidates(&store, tenant(), &pickup(), 30.0).unwrap_err();
        assert!(matches!(err, AppError::NoCandidatesFound));
    }
}
