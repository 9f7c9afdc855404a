use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::contractor::{ApprovalStatus, Contractor};
use crate::models::user::{Role, UserStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contractors", post(register_contractor).get(list_contractors))
        .route("/contractors/:id/location", patch(update_location))
        .route("/contractors/:id/online", patch(update_online))
        .route("/contractors/:id/approval", patch(update_approval))
}

#[derive(Deserialize)]
pub struct RegisterContractorRequest {
    pub truck_type: Option<String>,
    pub truck_capacity: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateOnlineRequest {
    pub is_online: bool,
}

#[derive(Deserialize)]
pub struct UpdateApprovalRequest {
    pub approval_status: ApprovalStatus,
}

async fn register_contractor(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<RegisterContractorRequest>,
) -> Result<Json<Contractor>, AppError> {
    caller.require_role(&[Role::Driver])?;
    let user_id = caller.require_user()?;

    let user = state.store.user(caller.tenant_id, user_id)?;
    if user.role != Role::Driver {
        return Err(AppError::validation("user_id", "user is not a driver"));
    }
    if user.status != UserStatus::Active {
        return Err(AppError::Forbidden("account is suspended".to_string()));
    }

    if state
        .store
        .contractor_by_user(caller.tenant_id, user_id)
        .is_some()
    {
        return Err(AppError::Conflict(
            "contractor profile already exists for this user".to_string(),
        ));
    }

    let now = Utc::now();
    let contractor = Contractor {
        id: Uuid::new_v4(),
        tenant_id: caller.tenant_id,
        user_id,
        truck_type: payload.truck_type,
        truck_capacity: payload.truck_capacity,
        location: None,
        is_online: false,
        approval_status: ApprovalStatus::Pending,
        avg_rating: 0.0,
        total_jobs: 0,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_contractor(contractor.clone());
    Ok(Json(contractor))
}

async fn list_contractors(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<Contractor>>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;
    Ok(Json(state.store.contractors(caller.tenant_id)))
}

/// High-frequency driver ping; last write wins per contractor.
async fn update_location(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Contractor>, AppError> {
    caller.require_role(&[Role::Driver])?;
    let user_id = caller.require_user()?;

    let updated = state
        .store
        .with_contractor_mut(caller.tenant_id, id, |contractor| {
            if contractor.user_id != user_id {
                return Err(AppError::Forbidden(
                    "contractors may only update their own location".to_string(),
                ));
            }
            contractor.location = Some(payload.location);
            contractor.updated_at = Utc::now();
            Ok(contractor.clone())
        })?;

    Ok(Json(updated))
}

async fn update_online(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOnlineRequest>,
) -> Result<Json<Contractor>, AppError> {
    caller.require_role(&[Role::Driver])?;
    let user_id = caller.require_user()?;

    let updated = state
        .store
        .with_contractor_mut(caller.tenant_id, id, |contractor| {
            if contractor.user_id != user_id {
                return Err(AppError::Forbidden(
                    "contractors may only update their own availability".to_string(),
                ));
            }
            contractor.is_online = payload.is_online;
            contractor.updated_at = Utc::now();
            Ok(contractor.clone())
        })?;

    Ok(Json(updated))
}

async fn update_approval(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApprovalRequest>,
) -> Result<Json<Contractor>, AppError> {
    caller.require_role(&[Role::Admin])?;

    let updated = state
        .store
        .with_contractor_mut(caller.tenant_id, id, |contractor| {
            contractor.approval_status = payload.approval_status;
            contractor.updated_at = Utc::now();
            Ok(contractor.clone())
        })?;

    Ok(Json(updated))
}
