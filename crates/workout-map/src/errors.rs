use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::UnknownActivityType;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("A workout fetch is already in flight")]
    FetchInFlight,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<UnknownActivityType> for AppError {
    fn from(e: UnknownActivityType) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::FetchInFlight => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Config(msg) => {
                error!("Configuration error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let status = |e: AppError| e.into_response().status();

        assert_eq!(status(AppError::FetchInFlight), StatusCode::CONFLICT);
        assert_eq!(
            status(AppError::InvalidInput("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AppError::Config("PORT".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unknown_activity_type_is_invalid_input() {
        let err: AppError = "swimming"
            .parse::<crate::models::ActivityType>()
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg.contains("swimming")));
    }
}
