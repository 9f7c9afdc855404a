use std::collections::HashMap;

use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::TenantId;
use crate::models::contractor::Contractor;
use crate::models::job::Job;
use crate::models::payment::Payment;
use crate::models::pricing::PricingRule;
use crate::models::rating::{Rating, RatingDirection};
use crate::models::surge::SurgeZone;
use crate::models::user::User;

/// In-memory tenant-scoped repositories. Every accessor takes the tenant
/// explicitly; there is no ambient tenant context anywhere below the HTTP
/// layer.
#[derive(Default)]
pub struct Store {
    users: DashMap<(TenantId, Uuid), User>,
    contractors: DashMap<(TenantId, Uuid), Contractor>,
    jobs: DashMap<(TenantId, Uuid), Job>,
    /// Keyed by job id; payments are one-to-one with jobs.
    payments: DashMap<(TenantId, Uuid), Payment>,
    ratings: DashMap<(TenantId, Uuid), Rating>,
    pricing_rules: DashMap<(TenantId, Uuid), PricingRule>,
    surge_zones: DashMap<(TenantId, Uuid), SurgeZone>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // --- users ---

    pub fn insert_user(&self, user: User) {
        self.users.insert((user.tenant_id, user.id), user);
    }

    pub fn user(&self, tenant_id: TenantId, id: Uuid) -> Result<User, AppError> {
        self.users
            .get(&(tenant_id, id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }

    pub fn users(&self, tenant_id: TenantId) -> Vec<User> {
        self.users
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn with_user_mut<T>(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        f: impl FnOnce(&mut User) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .users
            .get_mut(&(tenant_id, id))
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;
        f(entry.value_mut())
    }

    // --- contractors ---

    pub fn insert_contractor(&self, contractor: Contractor) {
        self.contractors
            .insert((contractor.tenant_id, contractor.id), contractor);
    }

    pub fn contractor(&self, tenant_id: TenantId, id: Uuid) -> Result<Contractor, AppError> {
        self.contractors
            .get(&(tenant_id, id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("contractor {id} not found")))
    }

    pub fn contractors(&self, tenant_id: TenantId) -> Vec<Contractor> {
        self.contractors
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn contractor_by_user(&self, tenant_id: TenantId, user_id: Uuid) -> Option<Contractor> {
        self.contractors
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .find(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
    }

    pub fn with_contractor_mut<T>(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        f: impl FnOnce(&mut Contractor) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .contractors
            .get_mut(&(tenant_id, id))
            .ok_or_else(|| AppError::NotFound(format!("contractor {id} not found")))?;
        f(entry.value_mut())
    }

    // --- jobs ---

    pub fn insert_job(&self, job: Job) {
        self.jobs.insert((job.tenant_id, job.id), job);
    }

    pub fn job(&self, tenant_id: TenantId, id: Uuid) -> Result<Job, AppError> {
        self.jobs
            .get(&(tenant_id, id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("job {id} not found")))
    }

    pub fn jobs(&self, tenant_id: TenantId) -> Vec<Job> {
        self.jobs
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Mutate a job all-or-nothing: the closure works on a draft and the
    /// draft replaces the stored row only when it returns Ok. The map entry
    /// stays locked for the duration, serializing transitions per job.
    pub fn with_job_mut<T>(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        f: impl FnOnce(&mut Job) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .jobs
            .get_mut(&(tenant_id, id))
            .ok_or_else(|| AppError::NotFound(format!("job {id} not found")))?;

        let mut draft = entry.value().clone();
        let out = f(&mut draft)?;
        *entry.value_mut() = draft;
        Ok(out)
    }

    /// Jobs a driver is actively committed to; dispatch uses this for load
    /// balancing ties.
    pub fn open_job_count(&self, tenant_id: TenantId, driver_id: Uuid) -> usize {
        self.jobs
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .filter(|entry| {
                let job = entry.value();
                job.driver_id == Some(driver_id) && job.status.is_open_for_driver()
            })
            .count()
    }

    // --- payments ---

    pub fn upsert_payment(&self, payment: Payment) {
        self.payments
            .insert((payment.tenant_id, payment.job_id), payment);
    }

    pub fn payment_for_job(&self, tenant_id: TenantId, job_id: Uuid) -> Result<Payment, AppError> {
        self.payments
            .get(&(tenant_id, job_id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("payment for job {job_id} not found")))
    }

    pub fn with_payment_mut<T>(
        &self,
        tenant_id: TenantId,
        job_id: Uuid,
        f: impl FnOnce(&mut Payment) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .payments
            .get_mut(&(tenant_id, job_id))
            .ok_or_else(|| AppError::NotFound(format!("payment for job {job_id} not found")))?;
        f(entry.value_mut())
    }

    // --- ratings ---

    pub fn insert_rating(&self, rating: Rating) {
        self.ratings.insert((rating.tenant_id, rating.id), rating);
    }

    pub fn rating_exists(
        &self,
        tenant_id: TenantId,
        job_id: Uuid,
        direction: RatingDirection,
    ) -> bool {
        self.ratings
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .any(|entry| entry.value().job_id == job_id && entry.value().direction == direction)
    }

    pub fn ratings_for_job(&self, tenant_id: TenantId, job_id: Uuid) -> Vec<Rating> {
        self.ratings
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .filter(|entry| entry.value().job_id == job_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn ratings_for_user(&self, tenant_id: TenantId, to_user_id: Uuid) -> Vec<Rating> {
        self.ratings
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .filter(|entry| entry.value().to_user_id == to_user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    // --- pricing rules ---

    pub fn insert_pricing_rule(&self, rule: PricingRule) {
        self.pricing_rules.insert((rule.tenant_id, rule.id), rule);
    }

    pub fn pricing_rules(&self, tenant_id: TenantId) -> Vec<PricingRule> {
        self.pricing_rules
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn pricing_rule_by_item_type(
        &self,
        tenant_id: TenantId,
        item_type: &str,
    ) -> Option<PricingRule> {
        self.pricing_rules
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .find(|entry| entry.value().item_type == item_type)
            .map(|entry| entry.value().clone())
    }

    /// Snapshot of active rules as item_type -> base_price. Quotes are
    /// computed against this copy, never against live rows.
    pub fn active_rule_snapshot(&self, tenant_id: TenantId) -> HashMap<String, Decimal> {
        self.pricing_rules
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .filter(|entry| entry.value().is_active)
            .map(|entry| (entry.value().item_type.clone(), entry.value().base_price))
            .collect()
    }

    pub fn with_pricing_rule_mut<T>(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        f: impl FnOnce(&mut PricingRule) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .pricing_rules
            .get_mut(&(tenant_id, id))
            .ok_or_else(|| AppError::NotFound(format!("pricing rule {id} not found")))?;
        f(entry.value_mut())
    }

    // --- surge zones ---

    pub fn insert_surge_zone(&self, zone: SurgeZone) {
        self.surge_zones.insert((zone.tenant_id, zone.id), zone);
    }

    pub fn surge_zones(&self, tenant_id: TenantId) -> Vec<SurgeZone> {
        self.surge_zones
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn with_surge_zone_mut<T>(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        f: impl FnOnce(&mut SurgeZone) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut entry = self
            .surge_zones
            .get_mut(&(tenant_id, id))
            .ok_or_else(|| AppError::NotFound(format!("surge zone {id} not found")))?;
        f(entry.value_mut())
    }

    // --- counts for the health endpoint ---

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn contractor_count(&self) -> usize {
        self.contractors.len()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.len()
    }
}
