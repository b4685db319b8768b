//! Operational stats surface.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::AppError;
use crate::AppState;

pub async fn stats(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let streams = state.streams.stats().await;
    let transcodes = state.transcoder.stats().await;
    let router = state.router.stats().await;

    Ok(HttpResponse::Ok().json(json!({
        "streams": streams,
        "transcodes": transcodes,
        "signaling": router,
    })))
}
