//! HTTP surface for the PDF question-answering service.
//!
//! - `GET /` – Static greeting used as a smoke test.
//! - `GET /health` – Static liveness payload.
//! - `POST /upload` – Multipart upload with a `file` part; replaces the current document.
//! - `POST /ask` – JSON `{"question": ...}`; answers from the current document.
//!
//! Failures are returned as `{"detail": "<message>"}` with a status picked from the error kind.
//! Cross-origin requests are allowed from anywhere, credentials included.

use crate::qa::{QaApi, QaError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Multipart part that carries the uploaded PDF.
const FILE_FIELD: &str = "file";

/// Build the HTTP router around a question-answering service.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: QaApi + 'static,
{
    Router::new()
        .route("/", get(read_root))
        .route("/health", get(health_check))
        .route("/upload", post(upload_pdf::<S>))
        .route("/ask", post(ask_question::<S>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer())
        .with_state(service)
}

/// Any origin, method, and header, with credentials.
///
/// Wildcards cannot be combined with credentials, so request values are mirrored instead.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello, World!",
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Accept a PDF upload and install its text as the current document.
async fn upload_pdf<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError>
where
    S: QaApi,
{
    let (file_name, bytes) = read_file_part(multipart).await?;
    let outcome = service.ingest_pdf(&file_name, bytes).await?;
    tracing::info!(
        file_name,
        pages = outcome.pages,
        characters = outcome.characters,
        "Upload processed"
    );
    Ok(Json(MessageResponse {
        message: "PDF uploaded and processed successfully",
    }))
}

/// Pull the `file` part out of the multipart body. A part without a file name yields an empty
/// name, which the service rejects as a non-PDF.
async fn read_file_part(mut multipart: Multipart) -> Result<(String, Bytes), QaError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| QaError::InvalidUpload(err.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| QaError::InvalidUpload(err.body_text()))?;
        return Ok((file_name, bytes));
    }
    Err(QaError::MissingFile)
}

/// Answer a question about the current document.
async fn ask_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError>
where
    S: QaApi,
{
    let answer = service.answer(&request.question).await?;
    Ok(Json(AskResponse { answer }))
}

struct AppError(QaError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.0.kind().status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, kind = ?self.0.kind(), "Request failed");
        } else {
            tracing::info!(error = %self.0, kind = ?self.0.kind(), "Request rejected");
        }
        let body = ErrorResponse {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<QaError> for AppError {
    fn from(inner: QaError) -> Self {
        Self(inner)
    }
}
