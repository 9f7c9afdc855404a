use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::engine::lifecycle::{self, TransitionCommand};
use crate::engine::queue::enqueue_dispatch;
use crate::engine::{pricing, surge};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::job::{Job, JobItem, JobStatus};
use crate::models::user::{Role, UserStatus};
use crate::state::{AppState, DispatchRequest};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/confirm", post(confirm_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub address: String,
    pub location: GeoPoint,
    pub items: Vec<JobItem>,
    pub volume_adjustment: Option<Decimal>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<JobStatus>,
}

#[derive(Deserialize)]
pub struct ConfirmBookingRequest {
    pub version: Option<u64>,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
    pub version: Option<u64>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Job>, AppError> {
    caller.require_role(&[Role::Customer, Role::Admin])?;
    let customer_id = caller.require_user()?;

    let customer = state.store.user(caller.tenant_id, customer_id)?;
    if customer.status != UserStatus::Active {
        return Err(AppError::Forbidden("account is suspended".to_string()));
    }

    if payload.address.trim().is_empty() {
        return Err(AppError::validation("address", "address cannot be empty"));
    }

    let now = Utc::now();

    // Surge is resolved against the scheduled slot and frozen on the job;
    // zone edits after booking never reprice it.
    let priced_at = payload.scheduled_at.unwrap_or(now);
    let zones = state.store.surge_zones(caller.tenant_id);
    let surge_multiplier = surge::resolve(&zones, &payload.location, priced_at);

    let rules = state.store.active_rule_snapshot(caller.tenant_id);
    let price = pricing::quote(
        &rules,
        &payload.items,
        payload.volume_adjustment,
        surge_multiplier,
        state.config.service_fee_rate,
    )?;

    let job = Job {
        id: Uuid::new_v4(),
        tenant_id: caller.tenant_id,
        customer_id,
        driver_id: None,
        status: JobStatus::Pending,
        address: payload.address.trim().to_string(),
        location: payload.location,
        items: payload.items,
        photos: payload.photos,
        scheduled_at: payload.scheduled_at,
        accepted_at: None,
        started_at: None,
        completed_at: None,
        cancelled_at: None,
        cancellation_reason: None,
        price,
        payout: None,
        surge_multiplier,
        version: 0,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_job(job.clone());
    tracing::info!(job_id = %job.id, total = %job.price.total, "booking created");

    Ok(Json(job))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let role = caller.require_role(&[Role::Customer, Role::Dispatcher, Role::Admin])?;

    let mut jobs = state.store.jobs(caller.tenant_id);

    if role == Role::Customer {
        let customer_id = caller.require_user()?;
        jobs.retain(|job| job.customer_id == customer_id);
    }

    if let Some(status) = query.status {
        jobs.retain(|job| job.status == status);
    }

    jobs.sort_by_key(|job| std::cmp::Reverse(job.created_at));
    Ok(Json(jobs))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let role = caller.require_role(&[Role::Customer, Role::Dispatcher, Role::Admin])?;
    let job = state.store.job(caller.tenant_id, id)?;

    if role == Role::Customer && job.customer_id != caller.require_user()? {
        return Err(AppError::Forbidden(
            "booking belongs to another customer".to_string(),
        ));
    }

    Ok(Json(job))
}

async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmBookingRequest>,
) -> Result<Json<Job>, AppError> {
    let role = caller.require_role(&[Role::Customer, Role::Admin])?;
    let job = state.store.job(caller.tenant_id, id)?;

    if role == Role::Customer && job.customer_id != caller.require_user()? {
        return Err(AppError::Forbidden(
            "booking belongs to another customer".to_string(),
        ));
    }

    let expected_version = payload.version.unwrap_or(job.version);
    let updated = lifecycle::transition(
        &state,
        caller.tenant_id,
        id,
        Some(expected_version),
        TransitionCommand::Confirm,
        Utc::now(),
    )?;

    enqueue_dispatch(
        &state,
        DispatchRequest {
            tenant_id: caller.tenant_id,
            job_id: id,
            attempt: 0,
        },
    )
    .await?;

    Ok(Json(updated))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<Json<Job>, AppError> {
    let role = caller.require_role(&[Role::Customer, Role::Dispatcher, Role::Admin])?;
    let job = state.store.job(caller.tenant_id, id)?;

    if role == Role::Customer && job.customer_id != caller.require_user()? {
        return Err(AppError::Forbidden(
            "booking belongs to another customer".to_string(),
        ));
    }

    if payload.reason.trim().is_empty() {
        return Err(AppError::validation("reason", "a reason is required"));
    }

    let expected_version = payload.version.unwrap_or(job.version);
    let updated = lifecycle::transition(
        &state,
        caller.tenant_id,
        id,
        Some(expected_version),
        TransitionCommand::Cancel {
            reason: payload.reason.trim().to_string(),
        },
        Utc::now(),
    )?;

    Ok(Json(updated))
}
