use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::engine::lifecycle::{self, TransitionCommand};
use crate::engine::matcher::{self, Candidate};
use crate::error::AppError;
use crate::models::contractor::ApprovalStatus;
use crate::models::job::Job;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dispatch/candidates", get(list_candidates))
        .route("/dispatch/assign", post(assign_job))
        .route("/dispatch/unassign", post(unassign_job))
}

#[derive(Deserialize)]
pub struct CandidatesQuery {
    pub job_id: Uuid,
    pub radius_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub job_id: Uuid,
    pub driver_id: Uuid,
    pub version: Option<u64>,
}

#[derive(Deserialize)]
pub struct UnassignRequest {
    pub job_id: Uuid,
    pub version: Option<u64>,
}

async fn list_candidates(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;

    let job = state.store.job(caller.tenant_id, query.job_id)?;
    let radius_km = query.radius_km.unwrap_or(state.config.search_radius_km);

    let candidates =
        matcher::find_candidates(&state.store, caller.tenant_id, &job.location, radius_km)?;

    Ok(Json(candidates))
}

/// Manual assignment by a dispatcher. Unlike auto-dispatch this does not
/// require the driver to be online, only approved.
async fn assign_job(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Job>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;

    let contractor = state.store.contractor(caller.tenant_id, payload.driver_id)?;
    if contractor.approval_status != ApprovalStatus::Approved {
        return Err(AppError::validation(
            "driver_id",
            "contractor is not approved and cannot take jobs",
        ));
    }

    let job = state.store.job(caller.tenant_id, payload.job_id)?;
    let expected_version = payload.version.unwrap_or(job.version);

    let updated = lifecycle::transition(
        &state,
        caller.tenant_id,
        payload.job_id,
        Some(expected_version),
        TransitionCommand::Assign {
            driver_id: payload.driver_id,
        },
        Utc::now(),
    )?;

    Ok(Json(updated))
}

async fn unassign_job(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<UnassignRequest>,
) -> Result<Json<Job>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;

    let job = state.store.job(caller.tenant_id, payload.job_id)?;
    let expected_version = payload.version.unwrap_or(job.version);

    let updated = lifecycle::transition(
        &state,
        caller.tenant_id,
        payload.job_id,
        Some(expected_version),
        TransitionCommand::Unassign,
        Utc::now(),
    )?;

    Ok(Json(updated))
}
