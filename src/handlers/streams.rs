//! HTTP surface of the stream control plane.
//!
//! Thin handlers over the stream manager, viewer tracker, chat moderator
//! and transcoder supervisor. Every route is tenant-scoped through the
//! path; a stream belonging to another tenant is indistinguishable from a
//! missing one.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::error::AppError;
use crate::services::streaming::StreamRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateStreamRequest {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct StartHlsRequest {
    pub input_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BanParams {
    pub ttl_seconds: Option<u64>,
}

async fn tenant_stream(
    state: &AppState,
    tenant_id: &str,
    stream_id: &str,
) -> Result<StreamRecord, AppError> {
    state
        .streams
        .get_stream(stream_id)
        .await
        .filter(|record| record.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound("Stream not found".to_string()))
}

pub async fn create_stream(
    path: web::Path<String>,
    body: web::Json<CreateStreamRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tenant_id = path.into_inner();
    let body = body.into_inner();
    let (stream_id, stream_key) = state
        .streams
        .create_stream(&tenant_id, &body.user_id, &body.title, body.metadata)
        .await?;

    // The stream key is returned here and never again.
    Ok(HttpResponse::Created().json(json!({
        "stream_id": stream_id,
        "stream_key": stream_key,
        "status": "pending",
    })))
}

pub async fn get_stream(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    let record = tenant_stream(&state, &tenant_id, &stream_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn live_streams(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tenant_id = path.into_inner();
    let streams = state.streams.get_live_streams(&tenant_id).await;
    Ok(HttpResponse::Ok().json(streams))
}

/// Cross-worker view, read from the KV mirror.
pub async fn active_streams(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let streams = state.streams.get_all_active_streams().await?;
    Ok(HttpResponse::Ok().json(streams))
}

pub async fn start_stream(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    tenant_stream(&state, &tenant_id, &stream_id).await?;
    let started = state.streams.start_stream(&stream_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "started": started })))
}

/// End a stream and tear down everything attached to it: the encoder, the
/// HLS artifacts, and the viewer presence set. Chat bans and filters
/// persist until explicitly cleared.
pub async fn end_stream(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    tenant_stream(&state, &tenant_id, &stream_id).await?;
    let ended = state.streams.end_stream(&stream_id).await?;

    if ended {
        state.transcoder.stop(&stream_id).await;
        if let Err(e) = state.transcoder.cleanup(&stream_id).await {
            tracing::warn!(%stream_id, "failed to clean HLS artifacts: {e}");
        }
        state.viewers.clear_stream(&tenant_id, &stream_id).await?;
    }

    Ok(HttpResponse::Ok().json(json!({ "ended": ended })))
}

pub async fn start_hls(
    path: web::Path<(String, String)>,
    body: web::Json<StartHlsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    tenant_stream(&state, &tenant_id, &stream_id).await?;
    let started = state.transcoder.start(&stream_id, &body.input_url).await;
    Ok(HttpResponse::Ok().json(json!({ "started": started })))
}

pub async fn stop_hls(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    tenant_stream(&state, &tenant_id, &stream_id).await?;
    let stopped = state.transcoder.stop(&stream_id).await;
    if stopped {
        if let Err(e) = state.transcoder.cleanup(&stream_id).await {
            tracing::warn!(%stream_id, "failed to clean HLS artifacts: {e}");
        }
    }
    Ok(HttpResponse::Ok().json(json!({ "stopped": stopped })))
}

pub async fn viewer_heartbeat(
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id, viewer_id) = path.into_inner();
    state
        .viewers
        .heartbeat(&tenant_id, &stream_id, &viewer_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn remove_viewer(
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id, viewer_id) = path.into_inner();
    state
        .viewers
        .remove(&tenant_id, &stream_id, &viewer_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_viewers(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    let viewers = state.viewers.get_viewers(&tenant_id, &stream_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "count": viewers.len(),
        "viewers": viewers,
    })))
}

pub async fn validate_chat_message(
    path: web::Path<(String, String)>,
    body: web::Json<ChatMessageRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id) = path.into_inner();
    let verdict = state
        .chat
        .validate(&tenant_id, &stream_id, &body.user_id, &body.message)
        .await?;
    Ok(HttpResponse::Ok().json(verdict))
}

pub async fn ban_chat_user(
    path: web::Path<(String, String, String)>,
    query: web::Query<BanParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id, user_id) = path.into_inner();
    state
        .chat
        .ban(&tenant_id, &stream_id, &user_id, query.ttl_seconds)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn unban_chat_user(
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id, user_id) = path.into_inner();
    state.chat.unban(&tenant_id, &stream_id, &user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn add_chat_filter(
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id, word) = path.into_inner();
    state
        .chat
        .add_filter(&tenant_id, &stream_id, &word)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn remove_chat_filter(
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (tenant_id, stream_id, word) = path.into_inner();
    state
        .chat
        .remove_filter(&tenant_id, &stream_id, &word)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
