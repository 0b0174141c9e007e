use std::{net::SocketAddr, sync::Arc};

use axum::extract::ws::{Message, WebSocket};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    protocol::{Connection, Envelope, OutgoingEvent},
    server::AppState,
    ws::connection::WsConnection,
};

pub async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, remote: SocketAddr) {
    let (tx, rx) = flume::unbounded();
    let conn: Arc<dyn Connection> = Arc::new(WsConnection::new(Some(remote), tx));
    let connection_id = conn.id().clone();

    info!("WebSocket connected: connection={} remote={}", connection_id, remote);

    loop {
        tokio::select! {
            Ok(msg) = rx.recv_async() => {
                if let Err(e) = socket.send(msg).await {
                    error!("Socket send error: connection={} err={}", connection_id, e);
                    break;
                }
            }
            msg = socket.recv() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("WebSocket error: connection={} err={}", connection_id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<Envelope>(text.as_str()) {
                            Ok(envelope) => {
                                state.router.dispatch(&conn, &envelope.event, envelope.data);
                            }
                            Err(e) => {
                                warn!("Bad WS msg: connection={} err={}", connection_id, e);
                                let reply = OutgoingEvent::InvalidData(Value::String(text.to_string()));
                                if let Err(e) = conn.send(&reply) {
                                    debug!("invalid data reply failed: connection={} err={}", connection_id, e);
                                }
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket closed: connection={}", connection_id);
    state.router.disconnect(&connection_id);
}
