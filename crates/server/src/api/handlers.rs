use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use local_converter_core::{Format, SanitizedConfig};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub pool_size: usize,
    pub pool_available: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        pool_size: state.pool().size(),
        pool_available: state.pool().available(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// One registered format.
#[derive(Debug, Serialize)]
pub struct FormatInfo {
    pub mime: &'static str,
    pub extension: &'static str,
    pub multi_frame: bool,
}

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatInfo>,
}

/// GET /api/v1/formats
pub async fn list_formats() -> Json<FormatsResponse> {
    let formats = Format::ALL
        .iter()
        .map(|format| FormatInfo {
            mime: format.mime(),
            extension: format.extension(),
            multi_frame: format.is_multi_frame(),
        })
        .collect();
    Json(FormatsResponse { formats })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
