use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::error::AppError;
use crate::models::job::JobStatus;
use crate::models::rating::{Rating, RatingDirection};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/jobs/:id/ratings", post(create_rating).get(list_ratings))
}

#[derive(Deserialize)]
pub struct CreateRatingRequest {
    pub stars: u8,
    pub comment: Option<String>,
}

/// Rate the other party on a completed job. The direction follows the
/// caller's role; each direction may be rated once.
async fn create_rating(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<CreateRatingRequest>,
) -> Result<Json<Rating>, AppError> {
    let role = caller.require_role(&[Role::Customer, Role::Driver])?;
    let user_id = caller.require_user()?;

    if !(1..=5).contains(&payload.stars) {
        return Err(AppError::validation("stars", "stars must be between 1 and 5"));
    }

    let job = state.store.job(caller.tenant_id, job_id)?;
    if job.status != JobStatus::Completed {
        return Err(AppError::validation("job_id", "only completed jobs can be rated"));
    }

    let driver_id = job
        .driver_id
        .ok_or_else(|| AppError::validation("job_id", "job has no assigned driver"))?;
    let contractor = state.store.contractor(caller.tenant_id, driver_id)?;

    let (direction, from_user_id, to_user_id) = match role {
        Role::Customer => {
            if job.customer_id != user_id {
                return Err(AppError::Forbidden(
                    "job belongs to another customer".to_string(),
                ));
            }
            (
                RatingDirection::CustomerToDriver,
                user_id,
                contractor.user_id,
            )
        }
        Role::Driver => {
            if contractor.user_id != user_id {
                return Err(AppError::Forbidden(
                    "job is assigned to another driver".to_string(),
                ));
            }
            (RatingDirection::DriverToCustomer, user_id, job.customer_id)
        }
        _ => unreachable!(),
    };

    if state.store.rating_exists(caller.tenant_id, job_id, direction) {
        return Err(AppError::Conflict(
            "this side of the job has already been rated".to_string(),
        ));
    }

    let rating = Rating {
        id: Uuid::new_v4(),
        tenant_id: caller.tenant_id,
        job_id,
        direction,
        from_user_id,
        to_user_id,
        stars: payload.stars,
        comment: payload.comment,
        created_at: Utc::now(),
    };

    state.store.insert_rating(rating.clone());

    if direction == RatingDirection::CustomerToDriver {
        refresh_driver_rating(&state, &caller, contractor.id, contractor.user_id)?;
    }

    Ok(Json(rating))
}

async fn list_ratings(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<Rating>>, AppError> {
    caller.require_role(&[Role::Customer, Role::Driver, Role::Dispatcher, Role::Admin])?;
    state.store.job(caller.tenant_id, job_id)?;
    Ok(Json(state.store.ratings_for_job(caller.tenant_id, job_id)))
}

fn refresh_driver_rating(
    state: &AppState,
    caller: &Caller,
    contractor_id: Uuid,
    contractor_user_id: Uuid,
) -> Result<(), AppError> {
    let ratings = state
        .store
        .ratings_for_user(caller.tenant_id, contractor_user_id);
    if ratings.is_empty() {
        return Ok(());
    }

    let sum: u32 = ratings.iter().map(|rating| rating.stars as u32).sum();
    let avg = sum as f64 / ratings.len() as f64;

    state
        .store
        .with_contractor_mut(caller.tenant_id, contractor_id, |contractor| {
            contractor.avg_rating = avg;
            contractor.updated_at = Utc::now();
            Ok(())
        })
}
