use crate::error::AppError;
use crate::state::{AppState, DispatchRequest};

pub async fn enqueue_dispatch(state: &AppState, request: DispatchRequest) -> Result<(), AppError> {
    state
        .dispatch_tx
        .send(request)
        .await
        .map_err(|err| AppError::Internal(format!("dispatch queue send failed: {err}")))?;

    state.metrics.dispatch_queue_depth.inc();
    Ok(())
}
