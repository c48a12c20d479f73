//! Control API (C10)
//!
//! Synchronous HTTP surface over every other component, one route per
//! operation, grouped under `/api/v1`. Errors are never opaque strings
//! — every failure carries the crate's typed `ErrorKind` as `code`.

mod handlers;
mod routes;
mod state;

pub use state::ApiState;

use axum::Router;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::error::{CladcError, ErrorKind};

pub fn create_app(state: ApiState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Uniform error envelope for every Control API response, in the
/// `{status, message, code}` shape used throughout the dashboard layer.
#[derive(Debug)]
pub struct ApiError {
    pub status: axum::http::StatusCode,
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::BAD_REQUEST,
            message: message.into(),
            code: "validation".to_string(),
        }
    }
}

impl From<CladcError> for ApiError {
    fn from(err: CladcError) -> Self {
        let status = match err.kind() {
            ErrorKind::BusUnavailable => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Serialization | ErrorKind::Fatal => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Timeout => axum::http::StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Validation | ErrorKind::CapacityExceeded => axum::http::StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => axum::http::StatusCode::NOT_FOUND,
            ErrorKind::Conflict => axum::http::StatusCode::CONFLICT,
            ErrorKind::StepFailed => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
            code: err.kind().to_string(),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, axum::Json(body)).into_response()
    }
}
