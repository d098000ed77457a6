use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tokio::time::{timeout, Duration};
use tracing::error;

use sentinel_application::AppState;

use crate::middleware::authorize;

#[derive(serde::Serialize)]
struct AlertStatus {
    status: String,
    mode: String,
}

pub async fn alert_target_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(AlertStatus {
                status: "unauthorized".to_string(),
                mode: "unset".to_string(),
            }),
        )
            .into_response();
    }

    let mode = state.notifier.mode();
    if mode == "unset" {
        return (
            StatusCode::OK,
            Json(AlertStatus {
                status: "unset".to_string(),
                mode: mode.to_string(),
            }),
        )
            .into_response();
    }

    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    let (status_code, status) = match timeout(timeout_duration, state.notifier.check_target()).await
    {
        Ok(Ok(_)) => (StatusCode::OK, "ok"),
        Ok(Err(err)) => {
            error!("alert target check failed: {:#}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
        Err(_) => {
            error!("alert target check timeout after {}s", timeout_secs);
            (StatusCode::SERVICE_UNAVAILABLE, "timeout")
        }
    };
    (
        status_code,
        Json(AlertStatus {
            status: status.to_string(),
            mode: mode.to_string(),
        }),
    )
        .into_response()
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    match timeout(timeout_duration, state.store.ping()).await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(err)) => {
            error!("ready check failed: {:#}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
