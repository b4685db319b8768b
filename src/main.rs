use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use fabriq_streaming::kv::{KvStore, RedisKv};
use fabriq_streaming::{handlers, jobs, logging, AppState, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    logging::init_tracing();

    let config = Config::from_env();
    tracing::info!(
        host = %config.app.host,
        port = config.app.port,
        "starting fabriq-streaming"
    );

    let kv: Arc<dyn KvStore> = Arc::new(
        RedisKv::connect(&config.redis.url)
            .await
            .expect("failed to connect to Redis"),
    );

    tokio::fs::create_dir_all(&config.hls.storage_path).await?;

    let state = AppState::new(config.clone(), kv);

    let reaper = jobs::spawn_transcode_reaper(
        state.transcoder.clone(),
        state.streams.clone(),
        config.transcode.reaper_interval_secs,
    );

    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(handlers::configure)
    })
    .bind((config.app.host.as_str(), config.app.port))?
    .run();

    let result = server.await;

    reaper.abort();
    state.transcoder.stop_all().await;

    result
}
