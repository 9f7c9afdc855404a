use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::error::AppError;
use crate::models::payment::{Payment, PaymentStatus, PayoutStatus};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments/:job_id", get(get_payment))
        .route("/payments/:job_id/status", post(update_payment_status))
        .route("/payments/:job_id/payout", post(update_payout_status))
}

#[derive(Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Deserialize)]
pub struct UpdatePayoutStatusRequest {
    pub payout_status: PayoutStatus,
}

async fn get_payment(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let role = caller.require_role(&[
        Role::Customer,
        Role::Driver,
        Role::Dispatcher,
        Role::Admin,
    ])?;

    let payment = state.store.payment_for_job(caller.tenant_id, job_id)?;

    // Customers and drivers may only see payments on their own jobs.
    if role == Role::Customer || role == Role::Driver {
        let user_id = caller.require_user()?;
        let job = state.store.job(caller.tenant_id, job_id)?;

        let is_participant = match role {
            Role::Customer => job.customer_id == user_id,
            Role::Driver => state
                .store
                .contractor_by_user(caller.tenant_id, user_id)
                .is_some_and(|contractor| job.driver_id == Some(contractor.id)),
            _ => unreachable!(),
        };

        if !is_participant {
            return Err(AppError::Forbidden(
                "payment belongs to another job participant".to_string(),
            ));
        }
    }

    Ok(Json(payment))
}

/// Record the processor's payment outcome. Moves through the payment
/// state machine only; payout state is tracked separately.
async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Payment>, AppError> {
    caller.require_role(&[Role::Admin])?;

    let updated = state
        .store
        .with_payment_mut(caller.tenant_id, job_id, |payment| {
            if !payment.payment_status.can_transition_to(payload.payment_status) {
                return Err(AppError::InvalidTransition {
                    from: payment.payment_status.as_str().to_string(),
                    to: payload.payment_status.as_str().to_string(),
                });
            }
            payment.payment_status = payload.payment_status;
            payment.updated_at = Utc::now();
            Ok(payment.clone())
        })?;

    Ok(Json(updated))
}

async fn update_payout_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdatePayoutStatusRequest>,
) -> Result<Json<Payment>, AppError> {
    caller.require_role(&[Role::Admin])?;

    let updated = state
        .store
        .with_payment_mut(caller.tenant_id, job_id, |payment| {
            if !payment.payout_status.can_transition_to(payload.payout_status) {
                return Err(AppError::InvalidTransition {
                    from: payment.payout_status.as_str().to_string(),
                    to: payload.payout_status.as_str().to_string(),
                });
            }
            payment.payout_status = payload.payout_status;
            payment.updated_at = Utc::now();
            Ok(payment.clone())
        })?;

    Ok(Json(updated))
}
