use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{blog::BlogError, weather::WeatherError};

/// Error type for HTTP handlers. Every variant renders as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Blog(#[from] BlogError),

    #[error("Invalid host header")]
    InvalidHost,

    #[error("Not found.")]
    NotFound,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Weather(err) => match err {
                WeatherError::LocationUnresolvable => (StatusCode::BAD_REQUEST, err.to_string()),
                WeatherError::ServiceUnavailable => (StatusCode::BAD_GATEWAY, err.to_string()),
                WeatherError::Unexpected(msg) => {
                    tracing::error!(error = %msg, "Weather lookup failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
                }
            },
            ApiError::Blog(err) => match err {
                BlogError::NotFound | BlogError::InvalidPage => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                BlogError::Storage(e) => {
                    tracing::error!(error = %e, "Blog storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "A server error occurred.".to_string(),
                    )
                }
            },
            ApiError::InvalidHost => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
