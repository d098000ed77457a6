use std::time::Duration;

use tracing::{error, info, warn};

use sentinel_application::commands::sentinel_commands::run_sentinel_pass;
use sentinel_application::{AppError, AppState};

/// Runs a sentinel pass every `scan_interval_seconds`. Never returns.
pub async fn schedule_sentinel(state: AppState) {
    let interval = Duration::from_secs(state.config.scan_interval_seconds.max(1));
    info!(interval_seconds = interval.as_secs(), "sentinel scheduler started");
    loop {
        tokio::time::sleep(interval).await;
        run_scheduled_pass(&state).await;
    }
}

async fn run_scheduled_pass(state: &AppState) {
    match run_sentinel_pass(state).await {
        Ok(pass) => info!(
            users_scanned = pass.users_scanned,
            users_failed = pass.users_failed,
            freezes = pass.reports.len(),
            "scheduled sentinel pass complete"
        ),
        Err(AppError::Conflict(reason)) => warn!("scheduled sentinel pass skipped: {}", reason),
        Err(err) => error!("scheduled sentinel pass failed: {}", err),
    }
}
