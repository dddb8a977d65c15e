//! Conversion API handler.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use local_converter_core::{ConvertError, InputFile, OutputFile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::state::AppState;

/// Declared type when the upload carries none.
const FALLBACK_MIME: &str = "application/octet-stream";

// ============================================================================
// Request/Response Types
// ============================================================================

/// A converted file in the response
#[derive(Debug, Serialize)]
pub struct ConvertedFile {
    pub name: String,
    pub mime: String,
    pub size: usize,
    pub data_base64: String,
}

impl From<OutputFile> for ConvertedFile {
    fn from(file: OutputFile) -> Self {
        Self {
            size: file.size(),
            data_base64: STANDARD.encode(&file.data),
            name: file.name,
            mime: file.mime,
        }
    }
}

/// Response for a successful conversion
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub files: Vec<ConvertedFile>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ConvertErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Failures of the convert endpoint.
#[derive(Debug)]
pub enum ConvertApiError {
    BadRequest(String),
    Convert(ConvertError),
}

impl IntoResponse for ConvertApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ConvertErrorResponse {
                    error,
                    detail: None,
                },
            ),
            Self::Convert(e) => {
                let status = match e {
                    ConvertError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    ConvertError::Execution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (
                    status,
                    ConvertErrorResponse {
                        error: e.code().to_string(),
                        detail: Some(e.detail()),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/convert
///
/// Multipart form with a `file` part and an `output_mime` text part.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ConvertApiError> {
    let mut input: Option<InputFile> = None;
    let mut output_mime: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(ConvertApiError::BadRequest(format!(
                    "Malformed multipart body: {}",
                    e
                )))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("input").to_string();
                let mime = field.content_type().unwrap_or(FALLBACK_MIME).to_string();
                let data: Bytes = field.bytes().await.map_err(|e| {
                    ConvertApiError::BadRequest(format!("Failed to read file: {}", e))
                })?;
                input = Some(InputFile::new(file_name, mime, data));
            }
            "output_mime" => {
                let text = field.text().await.map_err(|e| {
                    ConvertApiError::BadRequest(format!("Failed to read output_mime: {}", e))
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    output_mime = Some(text.to_string());
                }
            }
            other => debug!(field = other, "Ignoring multipart field"),
        }
    }

    let input = match input {
        Some(input) if !input.data.is_empty() => input,
        _ => return Err(ConvertApiError::BadRequest("No file provided".to_string())),
    };
    let output_mime = output_mime
        .ok_or_else(|| ConvertApiError::BadRequest("No output_mime provided".to_string()))?;

    info!(
        file = %input.name,
        input = %input.mime,
        output = %output_mime,
        bytes = input.data.len(),
        "Conversion requested"
    );

    let files = state
        .pool()
        .execute(input, &output_mime)
        .await
        .map_err(ConvertApiError::Convert)?;

    Ok(Json(ConvertResponse {
        files: files.into_iter().map(ConvertedFile::from).collect(),
    }))
}
