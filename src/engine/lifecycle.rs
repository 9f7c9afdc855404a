use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::engine::settlement;
use crate::error::AppError;
use crate::models::TenantId;
use crate::models::job::{Job, JobStatus};
use crate::models::payment::{Payment, PaymentStatus, PayoutStatus};
use crate::state::{AppState, JobEvent};

#[derive(Debug, Clone)]
pub enum TransitionCommand {
    Confirm,
    Assign { driver_id: Uuid },
    Unassign,
    MarkEnRoute,
    MarkArrived,
    Start,
    Complete,
    Cancel { reason: String },
}

impl TransitionCommand {
    /// Status this command drives the job toward.
    pub fn target(&self) -> JobStatus {
        match self {
            TransitionCommand::Confirm => JobStatus::Confirmed,
            TransitionCommand::Assign { .. } => JobStatus::Assigned,
            TransitionCommand::Unassign => JobStatus::Pending,
            TransitionCommand::MarkEnRoute => JobStatus::EnRoute,
            TransitionCommand::MarkArrived => JobStatus::Arrived,
            TransitionCommand::Start => JobStatus::InProgress,
            TransitionCommand::Complete => JobStatus::Completed,
            TransitionCommand::Cancel { .. } => JobStatus::Cancelled,
        }
    }
}

fn next_status(from: JobStatus, cmd: &TransitionCommand) -> Result<JobStatus, AppError> {
    use JobStatus::*;

    let allowed = match (from, cmd) {
        (Pending, TransitionCommand::Confirm) => true,
        (Confirmed, TransitionCommand::Assign { .. }) => true,
        (Assigned, TransitionCommand::Unassign) => true,
        (Assigned, TransitionCommand::MarkEnRoute) => true,
        (EnRoute, TransitionCommand::MarkArrived) => true,
        (Arrived, TransitionCommand::Start) => true,
        (InProgress, TransitionCommand::Complete) => true,
        (
            Pending | Confirmed | Assigned | EnRoute | Arrived,
            TransitionCommand::Cancel { .. },
        ) => true,
        _ => false,
    };

    if allowed {
        Ok(cmd.target())
    } else {
        Err(AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: cmd.target().as_str().to_string(),
        })
    }
}

fn set_once(
    slot: &mut Option<DateTime<Utc>>,
    field: &'static str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if slot.is_some() {
        return Err(AppError::DuplicateTransition { field });
    }
    *slot = Some(now);
    Ok(())
}

/// Validate and apply one transition to a job value. Leaves the job
/// untouched on any error; the store's draft write-back turns that into
/// all-or-nothing persistence.
pub fn apply(
    job: &mut Job,
    cmd: &TransitionCommand,
    commission_rate: Decimal,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let to = next_status(job.status, cmd)?;

    match cmd {
        TransitionCommand::Confirm => {}
        TransitionCommand::Assign { driver_id } => {
            set_once(&mut job.accepted_at, "accepted_at", now)?;
            job.driver_id = Some(*driver_id);
        }
        TransitionCommand::Unassign => {
            // The revoked assignment takes its timestamp with it so a
            // later re-assign can stamp accepted_at fresh.
            job.driver_id = None;
            job.accepted_at = None;
        }
        TransitionCommand::MarkEnRoute | TransitionCommand::MarkArrived => {}
        TransitionCommand::Start => {
            set_once(&mut job.started_at, "started_at", now)?;
        }
        TransitionCommand::Complete => {
            set_once(&mut job.completed_at, "completed_at", now)?;
            job.payout = Some(settlement::split(&job.price, commission_rate));
        }
        TransitionCommand::Cancel { reason } => {
            set_once(&mut job.cancelled_at, "cancelled_at", now)?;
            job.cancellation_reason = Some(reason.clone());
        }
    }

    job.status = to;
    Ok(())
}

/// Commit a transition against the store with optimistic versioning.
///
/// `expected_version` of `Some(v)` rejects with `ConcurrentModification`
/// if the job has moved since the caller read it; `None` skips the check
/// (the entry lock still serializes writers). Completion settles the
/// payment record and bumps the driver's job count; every commit emits a
/// job event.
pub fn transition(
    state: &AppState,
    tenant_id: TenantId,
    job_id: Uuid,
    expected_version: Option<u64>,
    cmd: TransitionCommand,
    now: DateTime<Utc>,
) -> Result<Job, AppError> {
    let commission_rate = state.config.commission_rate;

    let updated = state.store.with_job_mut(tenant_id, job_id, |job| {
        if let Some(version) = expected_version {
            if job.version != version {
                return Err(AppError::ConcurrentModification);
            }
        }

        apply(job, &cmd, commission_rate, now)?;
        job.version += 1;
        job.updated_at = now;
        Ok(job.clone())
    })?;

    if updated.status == JobStatus::Completed {
        settle_completed(state, &updated, now);
    }

    state
        .metrics
        .job_transitions_total
        .with_label_values(&[updated.status.as_str()])
        .inc();

    let _ = state.job_events_tx.send(JobEvent {
        tenant_id,
        job_id: updated.id,
        status: updated.status,
        driver_id: updated.driver_id,
        at: now,
    });

    info!(
        job_id = %updated.id,
        status = updated.status.as_str(),
        "job transition committed"
    );

    Ok(updated)
}

/// Record settlement intent for a completed job. Payout execution is an
/// external collaborator; completion never waits on it.
fn settle_completed(state: &AppState, job: &Job, now: DateTime<Utc>) {
    let Some(payout) = &job.payout else {
        return;
    };

    state.store.upsert_payment(Payment {
        id: Uuid::new_v4(),
        tenant_id: job.tenant_id,
        job_id: job.id,
        amount: job.price.total,
        service_fee: job.price.service_fee,
        driver_payout: payout.driver_payout,
        platform_commission: payout.platform_commission,
        payment_status: PaymentStatus::Pending,
        payout_status: PayoutStatus::Pending,
        created_at: now,
        updated_at: now,
    });
    state.metrics.payments_settled_total.inc();

    if let Some(driver_id) = job.driver_id {
        let _ = state
            .store
            .with_contractor_mut(job.tenant_id, driver_id, |contractor| {
                contractor.total_jobs += 1;
                contractor.updated_at = now;
                Ok(())
            });
    }
}
