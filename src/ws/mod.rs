use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, State, ws::WebSocketUpgrade},
    response::IntoResponse,
};

use crate::server::AppState;

pub mod connection;
pub mod handler;
pub mod router;

pub use connection::WsConnection;
pub use router::EventRouter;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handler::handle_socket(socket, state, remote))
}
