use axum::Router;

use sentinel_application::AppState;

use crate::handlers::{ops_handlers, sentinel_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sentinel/run",
            axum::routing::post(sentinel_handlers::run_sentinel),
        )
        .route(
            "/v1/sentinel/status",
            axum::routing::get(sentinel_handlers::get_sentinel_status),
        )
        .route(
            "/v1/sentinel/alerts",
            axum::routing::get(sentinel_handlers::list_alerts),
        )
        .route(
            "/v1/sentinel/snapshots/:user_id",
            axum::routing::get(sentinel_handlers::get_snapshot),
        )
        .route(
            "/v1/ops/alert-target/check",
            axum::routing::get(ops_handlers::alert_target_check),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
