use tracing::error;

use crate::{AppError, AppState};
use sentinel_domain::{AlertFilter, AlertQuery, AlertRecord, AlertRule, UserId};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

pub async fn list_alerts(
    state: &AppState,
    query: AlertQuery,
) -> Result<Vec<AlertRecord>, AppError> {
    let filter = build_filter(query)?;
    let rows = state.store.list_alerts(&filter).await.map_err(|err| {
        error!("failed to fetch alerts: {}", err);
        AppError::Internal(err)
    })?;
    Ok(rows)
}

fn build_filter(query: AlertQuery) -> Result<AlertFilter, AppError> {
    let rule = match query.rule.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<AlertRule>()
                .map_err(|err| AppError::BadRequest(err.to_string()))?,
        ),
        _ => None,
    };
    let user_id = query
        .user
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(UserId);
    Ok(AlertFilter {
        user_id,
        rule,
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    })
}
