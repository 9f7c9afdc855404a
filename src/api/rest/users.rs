use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::error::AppError;
use crate::models::user::{Role, User, UserStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/status", patch(update_user_status))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    caller.require_role(&[Role::Admin])?;

    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::validation("email", "a valid email is required"));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("name", "name cannot be empty"));
    }

    let email = payload.email.trim().to_lowercase();
    let duplicate = state
        .store
        .users(caller.tenant_id)
        .into_iter()
        .any(|user| user.email == email);
    if duplicate {
        return Err(AppError::Conflict(format!(
            "user with email {email} already exists"
        )));
    }

    let user = User {
        id: Uuid::new_v4(),
        tenant_id: caller.tenant_id,
        email,
        name: payload.name.trim().to_string(),
        phone: payload.phone,
        role: payload.role,
        status: UserStatus::Active,
        created_at: Utc::now(),
    };

    state.store.insert_user(user.clone());
    Ok(Json(user))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<User>>, AppError> {
    caller.require_role(&[Role::Admin, Role::Dispatcher])?;
    Ok(Json(state.store.users(caller.tenant_id)))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    caller.require_role(&[Role::Admin, Role::Dispatcher])?;
    Ok(Json(state.store.user(caller.tenant_id, id)?))
}

async fn update_user_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> Result<Json<User>, AppError> {
    caller.require_role(&[Role::Admin])?;

    let updated = state.store.with_user_mut(caller.tenant_id, id, |user| {
        user.status = payload.status;
        Ok(user.clone())
    })?;

    Ok(Json(updated))
}
