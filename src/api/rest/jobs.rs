use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::engine::lifecycle::{self, TransitionCommand};
use crate::error::AppError;
use crate::models::job::{Job, JobStatus};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id/status", post(update_job_status))
}

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<JobStatus>,
    pub driver_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateJobStatusRequest {
    pub status: JobStatus,
    pub version: Option<u64>,
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let role = caller.require_role(&[Role::Driver, Role::Dispatcher, Role::Admin])?;

    let mut jobs = state.store.jobs(caller.tenant_id);

    if role == Role::Driver {
        let user_id = caller.require_user()?;
        let contractor = state
            .store
            .contractor_by_user(caller.tenant_id, user_id)
            .ok_or_else(|| AppError::NotFound("contractor profile not found".to_string()))?;
        jobs.retain(|job| job.driver_id == Some(contractor.id));
    } else if let Some(driver_id) = query.driver_id {
        jobs.retain(|job| job.driver_id == Some(driver_id));
    }

    if let Some(status) = query.status {
        jobs.retain(|job| job.status == status);
    }

    jobs.sort_by_key(|job| std::cmp::Reverse(job.created_at));
    Ok(Json(jobs))
}

/// Driver progress updates. Only the assigned driver may move the job,
/// and only along the en-route / arrived / started / completed path;
/// cancellation goes through the booking endpoint.
async fn update_job_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobStatusRequest>,
) -> Result<Json<Job>, AppError> {
    caller.require_role(&[Role::Driver])?;
    let user_id = caller.require_user()?;

    let job = state.store.job(caller.tenant_id, id)?;

    let contractor = state
        .store
        .contractor_by_user(caller.tenant_id, user_id)
        .ok_or_else(|| AppError::NotFound("contractor profile not found".to_string()))?;

    if job.driver_id != Some(contractor.id) {
        return Err(AppError::Forbidden(
            "job is not assigned to this driver".to_string(),
        ));
    }

    let cmd = match payload.status {
        JobStatus::EnRoute => TransitionCommand::MarkEnRoute,
        JobStatus::Arrived => TransitionCommand::MarkArrived,
        JobStatus::InProgress => TransitionCommand::Start,
        JobStatus::Completed => TransitionCommand::Complete,
        other => {
            return Err(AppError::validation(
                "status",
                format!("drivers cannot move a job to {}", other.as_str()),
            ));
        }
    };

    let expected_version = payload.version.unwrap_or(job.version);
    let updated = lifecycle::transition(
        &state,
        caller.tenant_id,
        id,
        Some(expected_version),
        cmd,
        Utc::now(),
    )?;

    Ok(Json(updated))
}
