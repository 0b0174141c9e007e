use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::{
    server::AppState,
    transport::{middleware::add_response_headers, routes::sessions},
    ws,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(sessions::index))
        .route("/status", get(sessions::get_status))
        .route("/sessions/{session_id}", get(sessions::redirect_session))
        .route("/socket", get(ws::websocket_handler))
        .layer(middleware::from_fn(add_response_headers))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
