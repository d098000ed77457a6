use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use sentinel_application::commands::sentinel_commands;
use sentinel_application::queries::{alert_queries, sentinel_queries};
use sentinel_application::AppState;
use sentinel_domain::{AlertQuery, AlertRecord, BalanceSnapshot, SentinelPass, SentinelStatus};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn run_sentinel(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SentinelPass>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let pass = sentinel_commands::run_sentinel_pass(&state).await?;
    Ok(Json(pass))
}

pub async fn get_sentinel_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SentinelStatus>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let status = sentinel_queries::get_sentinel_status(&state).await;
    Ok(Json(status))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<AlertRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let alerts = alert_queries::list_alerts(&state, query).await?;
    Ok(Json(alerts))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceSnapshot>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    sentinel_queries::get_snapshot(&state, &user_id)
        .await?
        .map(Json)
        .ok_or(HttpError::NotFound)
}
