use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
}

impl UploadResponse {
    pub fn new(url: String) -> Self {
        UploadResponse { ok: true, url }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GalleryResponse {
    pub ok: bool,
    pub gallery: Vec<String>,
}

impl GalleryResponse {
    pub fn new(gallery: Vec<String>) -> Self {
        GalleryResponse { ok: true, gallery }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        ErrorResponse { ok: false, error }
    }
}

/// Object bytes together with the content type they were uploaded with
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}
