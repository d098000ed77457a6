use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    NotFound,
    Conflict(String),
    Internal(String),
}

impl From<sentinel_application::AppError> for HttpError {
    fn from(value: sentinel_application::AppError) -> Self {
        match value {
            sentinel_application::AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            sentinel_application::AppError::Conflict(msg) => HttpError::Conflict(msg),
            sentinel_application::AppError::Internal(err) => {
                HttpError::Internal(format!("{:#}", err))
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, format!("bad request: {}", msg))
            }
            HttpError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
