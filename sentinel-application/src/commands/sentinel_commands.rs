use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info};

use crate::{AppError, AppState};
use sentinel_domain::{BalanceMonitor, SentinelPass};

/// Runs one monitor pass. Overlapping invocations are rejected.
///
/// The pass runs on its own task and owns the monitor lock, so a caller
/// that stops waiting (request timeout, client disconnect) does not abandon
/// status, metrics or notification for freezes already written.
pub async fn run_sentinel_pass(state: &AppState) -> Result<SentinelPass, AppError> {
    let monitor = state
        .monitor
        .clone()
        .try_lock_owned()
        .map_err(|_| AppError::Conflict("sentinel pass already running".to_string()))?;

    let task_state = state.clone();
    match tokio::spawn(async move { execute_pass(&task_state, monitor).await }).await {
        Ok(result) => result,
        Err(err) => {
            error!("sentinel pass task aborted: {}", err);
            state.metrics.record_pass_failure();
            state
                .sentinel_status
                .write()
                .await
                .fail(Utc::now(), format!("pass task aborted: {}", err));
            Err(AppError::Internal(anyhow::anyhow!(
                "sentinel pass task aborted: {}",
                err
            )))
        }
    }
}

async fn execute_pass(
    state: &AppState,
    monitor: OwnedMutexGuard<BalanceMonitor>,
) -> Result<SentinelPass, AppError> {
    let started_at = Utc::now();
    state.sentinel_status.write().await.start(started_at);

    match monitor.analyze_at(started_at).await {
        Ok(pass) => {
            state.metrics.record_pass(&pass);
            state.sentinel_status.write().await.finish(Utc::now(), &pass);
            if !pass.reports.is_empty() {
                info!(freezes = pass.reports.len(), "sentinel froze accounts");
                state.notifier.spawn_notify(pass.reports.clone());
            }
            Ok(pass)
        }
        Err(err) => {
            error!("sentinel pass failed: {:#}", err);
            state.metrics.record_pass_failure();
            state
                .sentinel_status
                .write()
                .await
                .fail(Utc::now(), format!("{:#}", err));
            Err(AppError::Internal(err))
        }
    }
}
