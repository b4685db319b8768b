//! HLS origin: serves manifests and segments from the per-stream artifact
//! directories.
//!
//! The cache contract is the CDN contract: manifests are polled and must
//! never be cached, segments are immutable once written. Filenames with
//! traversal characters are rejected outright; no further normalization is
//! done.

use actix_files::NamedFile;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::AppError;
use crate::AppState;

const MANIFEST_CACHE: &str = "no-cache, no-store, must-revalidate";
const SEGMENT_CACHE: &str = "public, max-age=31536000, immutable";

fn is_unsafe(component: &str) -> bool {
    component.contains("..") || component.contains('/') || component.contains('\\')
}

pub async fn serve_hls_file(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (stream_id, filename) = path.into_inner();

    if is_unsafe(&stream_id) || is_unsafe(&filename) {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }

    let file_path = state.config.hls.storage_path.join(&stream_id).join(&filename);

    let is_file = tokio::fs::metadata(&file_path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(AppError::NotFound("Segment not found".to_string()));
    }

    let (content_type, cache_control) = if filename.ends_with(".m3u8") {
        ("application/vnd.apple.mpegurl", MANIFEST_CACHE)
    } else if filename.ends_with(".ts") {
        ("video/mp2t", SEGMENT_CACHE)
    } else {
        ("application/octet-stream", MANIFEST_CACHE)
    };

    // NamedFile uses the efficient file-transmission path of the server.
    let file = NamedFile::open_async(&file_path)
        .await
        .map_err(|_| AppError::NotFound("Segment not found".to_string()))?;

    let mut response = file.into_response(&req);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static(cache_control),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static("Content-Type"),
    );
    Ok(response)
}
