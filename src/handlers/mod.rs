pub mod hls;
pub mod signaling_ws;
pub mod stats;
pub mod streams;

use actix_web::web;

/// Register every route on the given service config. Shared by the server
/// binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/hls/{stream_id}/{filename}",
        web::get().to(hls::serve_hls_file),
    )
    .route(
        "/ws/{tenant_id}/{user_id}",
        web::get().to(signaling_ws::signaling_ws),
    )
    .route("/api/streams/active", web::get().to(streams::active_streams))
    .route("/api/stats", web::get().to(stats::stats))
    .service(
        web::scope("/api/{tenant_id}")
            .route("/streams", web::post().to(streams::create_stream))
            .route("/streams", web::get().to(streams::live_streams))
            .route("/streams/{stream_id}", web::get().to(streams::get_stream))
            .route(
                "/streams/{stream_id}/start",
                web::post().to(streams::start_stream),
            )
            .route(
                "/streams/{stream_id}/end",
                web::post().to(streams::end_stream),
            )
            .route(
                "/streams/{stream_id}/hls/start",
                web::post().to(streams::start_hls),
            )
            .route(
                "/streams/{stream_id}/hls/stop",
                web::post().to(streams::stop_hls),
            )
            .route(
                "/streams/{stream_id}/viewers",
                web::get().to(streams::list_viewers),
            )
            .route(
                "/streams/{stream_id}/viewers/{viewer_id}/heartbeat",
                web::post().to(streams::viewer_heartbeat),
            )
            .route(
                "/streams/{stream_id}/viewers/{viewer_id}",
                web::delete().to(streams::remove_viewer),
            )
            .route(
                "/streams/{stream_id}/chat",
                web::post().to(streams::validate_chat_message),
            )
            .route(
                "/streams/{stream_id}/chat/bans/{user_id}",
                web::post().to(streams::ban_chat_user),
            )
            .route(
                "/streams/{stream_id}/chat/bans/{user_id}",
                web::delete().to(streams::unban_chat_user),
            )
            .route(
                "/streams/{stream_id}/chat/filters/{word}",
                web::post().to(streams::add_chat_filter),
            )
            .route(
                "/streams/{stream_id}/chat/filters/{word}",
                web::delete().to(streams::remove_chat_filter),
            ),
    );
}
