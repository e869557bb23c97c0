//! Request handlers for the worksheet API.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use schulaufgabe_core::{PipelineError, SessionId};

use crate::auth::authorize;
use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the worksheet photo.
pub const UPLOAD_FIELD: &str = "file";
/// File name offered to the browser for the compiled PDF.
pub const DOWNLOAD_FILE_NAME: &str = "mathecheck-worksheet.pdf";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateLatexRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CompilePdfRequest {
    pub session_id: String,
    pub latex: String,
}

/// Outcome of `/api/compile-pdf`. Compile failures are reported here with
/// HTTP 200 rather than as an error status.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CompilePdfResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompilePdfResponse {
    fn succeeded(pdf_path: String) -> Self {
        Self {
            success: true,
            pdf_path: Some(pdf_path),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            pdf_path: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderPdfQuery {
    pub session_id: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "schulaufgabe-backend".to_string(),
    })
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        let id = state.pipeline.upload(&data).await?;
        tracing::info!(session_id = %id, "[Upload] Returning session_id");
        return Ok(Json(UploadResponse {
            session_id: id.to_string(),
        }));
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Multipart {
        status: err.status(),
        message: err.body_text(),
    }
}

pub async fn generate_latex(
    State(state): State<AppState>,
    Json(request): Json<GenerateLatexRequest>,
) -> Result<String, ApiError> {
    let id = SessionId::parse(&request.session_id)?;
    let markup = state.pipeline.transcribe(&id).await?;
    Ok(markup)
}

pub async fn compile_pdf(
    State(state): State<AppState>,
    Json(request): Json<CompilePdfRequest>,
) -> Result<Json<CompilePdfResponse>, ApiError> {
    let id = SessionId::parse(&request.session_id)?;

    match state.pipeline.render(&id, &request.latex).await {
        Ok(path) => Ok(Json(CompilePdfResponse::succeeded(
            path.display().to_string(),
        ))),
        Err(PipelineError::CompilationFailed { diagnostics }) => {
            Ok(Json(CompilePdfResponse::failed(diagnostics)))
        }
        Err(PipelineError::ArtifactMissing { .. }) => {
            Ok(Json(CompilePdfResponse::failed("PDF not generated".to_string())))
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn render_pdf(
    State(state): State<AppState>,
    Query(query): Query<RenderPdfQuery>,
) -> Result<Response, ApiError> {
    let id = SessionId::parse(&query.session_id)?;
    let path = state.pipeline.retrieve(&id).await?;

    tracing::info!(session_id = %id, "[Render] Streaming PDF: {}", path.display());
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(PipelineError::from)?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn metrics(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    authorize(state.metrics_credentials.as_ref(), &headers)?;

    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok(([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
