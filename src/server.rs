//! HTTP API server.
//!
//! Exposes the [`Pipeline`] as a JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/documents/upload/` | Multipart upload (`file`, optional `document_type`) |
//! | `POST` | `/documents/embed/` | Embed a document's chunks |
//! | `POST` | `/documents/query/` | Ask a question |
//! | `GET`  | `/documents/list/` | List documents |
//! | `GET`  | `/documents/{id}/` | Document metadata and chunks |
//! | `PATCH`| `/documents/{id}/type/` | Correct the document type |
//! | `DELETE` | `/documents/{id}/` | Delete a document |
//! | `GET`  | `/documents/health/` | Service health |
//! | `POST` | `/webhook` | Liveness ping |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "document not found: 42" } }
//! ```
//!
//! The code is [`docqa_core::Error::code`]; the status is chosen by
//! [`status_for`].
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use docqa_core::models::{Answer, Document, DocumentType, QueryRequest};
use docqa_core::Error;

use crate::config::Config;
use crate::pipeline::{DocumentDetail, EmbedReceipt, HealthReport, Pipeline, UploadReceipt};

const LIVENESS_MESSAGE: &str = "Document Processing API is up!";

/// Build the pipeline from `config`, bind `[server].bind` and serve until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config).await?);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "docqa server listening");
    serve(listener, pipeline, config.server.max_upload_bytes).await
}

/// Serve on an already-bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    pipeline: Arc<Pipeline>,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    axum::serve(listener, router(pipeline, max_upload_bytes)).await?;
    Ok(())
}

pub fn router(pipeline: Arc<Pipeline>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/documents/upload/", post(handle_upload))
        .route("/documents/embed/", post(handle_embed))
        .route("/documents/query/", post(handle_query))
        .route("/documents/list/", get(handle_list))
        .route("/documents/health/", get(handle_health))
        .route(
            "/documents/{id}/",
            get(handle_get).delete(handle_delete),
        )
        .route("/documents/{id}/type/", patch(handle_set_type))
        .route("/webhook", post(handle_webhook))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(pipeline)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Converts pipeline errors into HTTP responses.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            error!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// HTTP status for each error variant.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Error::CorruptInput(_) | Error::EmptyContent => StatusCode::UNPROCESSABLE_ENTITY,
        Error::ChunkingFailure(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::SynthesisFailed(_) => StatusCode::BAD_GATEWAY,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ Handlers ============

async fn handle_upload(
    State(pipeline): State<Arc<Pipeline>>,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut document_type = DocumentType::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| bad_request("file field has no filename"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("document_type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("invalid document_type field: {}", e)))?;
                document_type = value.parse()?;
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| bad_request("multipart field 'file' is required"))?;
    let receipt = pipeline.upload(&filename, &bytes, document_type).await?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
struct EmbedRequest {
    document_id: String,
    #[serde(default)]
    document_type: Option<DocumentType>,
}

async fn handle_embed(
    State(pipeline): State<Arc<Pipeline>>,
    Json(req): Json<EmbedRequest>,
) -> Result<Json<EmbedReceipt>, AppError> {
    let receipt = pipeline.embed(&req.document_id, req.document_type).await?;
    Ok(Json(receipt))
}

async fn handle_query(
    State(pipeline): State<Arc<Pipeline>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Answer>, AppError> {
    Ok(Json(pipeline.query(&req).await?))
}

#[derive(Serialize)]
struct ListResponse {
    documents: Vec<Document>,
    total: usize,
}

async fn handle_list(State(pipeline): State<Arc<Pipeline>>) -> Result<Json<ListResponse>, AppError> {
    let documents = pipeline.list().await?;
    let total = documents.len();
    Ok(Json(ListResponse { documents, total }))
}

async fn handle_get(
    State(pipeline): State<Arc<Pipeline>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>, AppError> {
    Ok(Json(pipeline.get(&id).await?))
}

#[derive(Deserialize)]
struct SetTypeRequest {
    document_type: DocumentType,
}

async fn handle_set_type(
    State(pipeline): State<Arc<Pipeline>>,
    Path(id): Path<String>,
    Json(req): Json<SetTypeRequest>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(pipeline.set_document_type(&id, req.document_type).await?))
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_delete(
    State(pipeline): State<Arc<Pipeline>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    pipeline.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Document deleted successfully".to_string(),
    }))
}

async fn handle_health(State(pipeline): State<Arc<Pipeline>>) -> Json<HealthReport> {
    Json(pipeline.health().await)
}

async fn handle_webhook() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: LIVENESS_MESSAGE.to_string(),
    })
}
