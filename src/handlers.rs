use crate::error::ApiError;
use crate::models::{GalleryResponse, UploadResponse};
use crate::storage::StorageBackend;
use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Maximum size of an uploaded image (10 MiB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Request body limit: one maximal image plus room for multipart framing
pub const MAX_UPLOAD_BODY: usize = MAX_FILE_SIZE + 1024 * 1024;

const NO_FILE_PROVIDED: &str = "No file provided";
const NO_FILE_SELECTED: &str = "No file selected";
const IMAGES_ONLY: &str = "Only image files allowed";
const FILE_TOO_LARGE: &str = "File too large (max 10MB)";

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
}

/// A validated `file` part, fully buffered
struct ImageUpload {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

/// GET / - Landing page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// GET /health - Liveness probe, never touches storage
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// POST /api/v1/upload - Upload an image from the `file` form field
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload = read_upload(multipart).await.map_err(|e| {
        tracing::debug!("Rejected upload: {}", e);
        e
    })?;

    let name = object_name(Utc::now(), &upload.file_name);
    let size = upload.bytes.len();

    let url = state
        .storage
        .upload(&name, upload.bytes, &upload.content_type)
        .await
        .map_err(|e| {
            tracing::error!("Upload error: {}", e);
            ApiError::from(e)
        })?;

    tracing::info!("Uploaded {} ({} bytes, {})", name, size, upload.content_type);

    Ok(Json(UploadResponse::new(url)))
}

/// GET /api/v1/gallery - Public URLs of every stored image
pub async fn gallery(State(state): State<AppState>) -> Result<Json<GalleryResponse>, ApiError> {
    let urls = state.storage.list().await.map_err(|e| {
        tracing::error!("Gallery error: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(GalleryResponse::new(urls)))
}

/// GET /files/:name - Serve a stored object with its original content type
pub async fn serve_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let object = state.storage.fetch(&name).await.map_err(|e| {
        let e = ApiError::from(e);
        if e.status() != StatusCode::NOT_FOUND {
            tracing::error!("Failed to get file {}: {}", name, e);
        }
        e
    })?;

    Ok(([(header::CONTENT_TYPE, object.content_type)], object.bytes).into_response())
}

/// Storage key for an upload: UTC timestamp, a dash, then the client's filename
pub fn object_name(now: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "{}-{}",
        now.format("%Y%m%dT%H%M%S"),
        sanitize_file_name(file_name)
    )
}

/// Path separators become `_` and control characters are dropped
fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Find the `file` part and validate it: presence, name, type, then size
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ImageUpload, ApiError> {
    // Anything that is not multipart carries no file at all
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::InvalidRequest(NO_FILE_PROVIDED.to_string()));
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        if file_name.is_empty() {
            return Err(ApiError::InvalidRequest(NO_FILE_SELECTED.to_string()));
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::InvalidRequest(IMAGES_ONLY.to_string()));
        }

        let bytes = read_limited(field, MAX_FILE_SIZE).await?;

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(ApiError::InvalidRequest(NO_FILE_PROVIDED.to_string()))
}

/// Buffer a part, failing as soon as it grows past `limit` bytes
async fn read_limited(mut field: Field<'_>, limit: usize) -> Result<Bytes, ApiError> {
    let mut buffer = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buffer.len() + chunk.len() > limit {
            return Err(ApiError::InvalidRequest(FILE_TOO_LARGE.to_string()));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffer))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::InvalidRequest(FILE_TOO_LARGE.to_string())
    } else {
        ApiError::InvalidRequest(format!("Invalid multipart data: {}", err.body_text()))
    }
}
