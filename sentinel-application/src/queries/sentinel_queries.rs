use crate::{AppError, AppState};
use sentinel_domain::{BalanceSnapshot, SentinelStatus, UserId};

pub async fn get_sentinel_status(state: &AppState) -> SentinelStatus {
    state.sentinel_status.read().await.clone()
}

pub async fn get_snapshot(
    state: &AppState,
    user_id: &str,
) -> Result<Option<BalanceSnapshot>, AppError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user id is required".to_string()));
    }
    let snapshot = state.store.get_snapshot(&UserId::from(user_id)).await?;
    Ok(snapshot)
}
