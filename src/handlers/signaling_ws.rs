//! WebSocket endpoint for signaling.
//!
//! Each accepted socket becomes an actor holding its connection id. Inbound
//! text frames are handed to the router; outbound frames arrive on the
//! per-connection channel the router writes to and are pushed down the
//! socket in order. Closing the socket, a protocol error, or an unsupported
//! frame kind stops the actor, which converges router state.

use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::services::streaming::{ConnectionId, SignalingRouter};
use crate::AppState;

pub struct SignalingSession {
    conn_id: ConnectionId,
    router: SignalingRouter,
    outbound: Option<UnboundedReceiver<String>>,
}

impl Actor for SignalingSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(rx) = self.outbound.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let router = self.router.clone();
        let conn_id = self.conn_id;
        actix_rt::spawn(async move {
            router.disconnect(conn_id).await;
        });
    }
}

/// Outbound frames from the router.
impl StreamHandler<String> for SignalingSession {
    fn handle(&mut self, frame: String, ctx: &mut Self::Context) {
        ctx.text(frame);
    }
}

/// Inbound frames from the socket.
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for SignalingSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                let router = self.router.clone();
                let conn_id = self.conn_id;
                actix_rt::spawn(async move {
                    router.handle_frame(conn_id, &text).await;
                });
            }
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Pong(_)) | Ok(ws::Message::Nop) => {}
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) | Ok(ws::Message::Continuation(_)) => {
                tracing::warn!(conn = %self.conn_id, "unsupported frame kind, closing");
                ctx.stop();
            }
            Err(e) => {
                tracing::error!(conn = %self.conn_id, "websocket protocol error: {e}");
                ctx.stop();
            }
        }
    }
}

/// GET /ws/{tenant_id}/{user_id}
///
/// Tenant and user identity come from the path; resolving them is the outer
/// middleware's concern.
pub async fn signaling_ws(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (tenant_id, user_id) = path.into_inner();
    let router = state.router.clone();
    let (conn_id, outbound) = router.connect(&tenant_id, &user_id).await;

    match ws::start(
        SignalingSession {
            conn_id,
            router: router.clone(),
            outbound: Some(outbound),
        },
        &req,
        stream,
    ) {
        Ok(response) => Ok(response),
        Err(e) => {
            // The upgrade failed before the actor ran; unregister now.
            router.disconnect(conn_id).await;
            Err(e)
        }
    }
}
