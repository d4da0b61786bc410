use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use heatmap_core::HeatmapError;
use serde_json::json;

/// Request errors. Upstream failures only make tickers absent, so every
/// error a handler returns is the caller's.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
    }
}

impl From<HeatmapError> for AppError {
    fn from(e: HeatmapError) -> Self {
        Self::BadRequest(e.to_string())
    }
}
