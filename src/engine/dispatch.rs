use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

use crate::engine::lifecycle::{self, TransitionCommand};
use crate::engine::matcher;
use crate::engine::queue::enqueue_dispatch;
use crate::error::AppError;
use crate::models::job::JobStatus;
use crate::state::{AppState, DispatchRequest};

/// Automatic-assignment policy: consume confirmed jobs off the queue,
/// rank candidates, and commit the best one through the lifecycle layer.
pub async fn run_dispatch_engine(state: Arc<AppState>, mut rx: mpsc::Receiver<DispatchRequest>) {
    info!("dispatch engine started");

    while let Some(request) = rx.recv().await {
        state.metrics.dispatch_queue_depth.dec();

        let start = Instant::now();
        let outcome = match process_request(&state, &request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(job_id = %request.job_id, error = %err, "dispatch processing failed");
                "error"
            }
        };

        let elapsed = start.elapsed().as_secs_f64();
        state
            .metrics
            .dispatch_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed);
        state
            .metrics
            .dispatch_attempts_total
            .with_label_values(&[outcome])
            .inc();
    }

    warn!("dispatch engine stopped: queue channel closed");
}

async fn process_request(
    state: &Arc<AppState>,
    request: &DispatchRequest,
) -> Result<&'static str, AppError> {
    let job = match state.store.job(request.tenant_id, request.job_id) {
        Ok(job) => job,
        Err(_) => {
            warn!(job_id = %request.job_id, "queued job no longer exists");
            return Ok("missing");
        }
    };

    // Manual dispatch or cancellation may have raced the queue.
    if job.status != JobStatus::Confirmed {
        return Ok("stale");
    }

    let candidates = match matcher::find_candidates(
        &state.store,
        request.tenant_id,
        &job.location,
        state.config.search_radius_km,
    ) {
        Ok(candidates) => candidates,
        Err(AppError::NoCandidatesFound) => {
            warn!(job_id = %job.id, attempt = request.attempt, "no eligible drivers in range");
            return retry_later(state, request).await;
        }
        Err(err) => return Err(err),
    };

    for candidate in candidates {
        // The candidate list is a snapshot; re-check the contractor's
        // state before committing so a driver who just went offline or
        // lost approval is skipped instead of assigned blind.
        let Ok(contractor) = state.store.contractor(request.tenant_id, candidate.contractor_id)
        else {
            continue;
        };
        if !contractor.is_dispatchable() {
            continue;
        }

        match lifecycle::transition(
            state,
            request.tenant_id,
            request.job_id,
            Some(job.version),
            TransitionCommand::Assign {
                driver_id: candidate.contractor_id,
            },
            Utc::now(),
        ) {
            Ok(updated) => {
                info!(
                    job_id = %updated.id,
                    driver_id = %candidate.contractor_id,
                    distance_km = candidate.distance_km,
                    "job auto-assigned"
                );
                return Ok("assigned");
            }
            Err(AppError::ConcurrentModification) | Err(AppError::InvalidTransition { .. }) => {
                // The job moved under us (manual assign or cancel); it is
                // no longer ours to place.
                return Ok("lost_race");
            }
            Err(err) => {
                warn!(
                    job_id = %request.job_id,
                    driver_id = %candidate.contractor_id,
                    error = %err,
                    "assignment failed; trying next candidate"
                );
            }
        }
    }

    retry_later(state, request).await
}

async fn retry_later(
    state: &Arc<AppState>,
    request: &DispatchRequest,
) -> Result<&'static str, AppError> {
    let next_attempt = request.attempt + 1;
    if next_attempt >= state.config.dispatch_max_attempts {
        warn!(
            job_id = %request.job_id,
            attempts = next_attempt,
            "dispatch attempts exhausted; job left for manual dispatch"
        );
        return Ok("exhausted");
    }

    sleep(Duration::from_millis(state.config.dispatch_retry_ms)).await;
    enqueue_dispatch(
        state,
        DispatchRequest {
            tenant_id: request.tenant_id,
            job_id: request.job_id,
            attempt: next_attempt,
        },
    )
    .await?;

    Ok("requeued")
}
