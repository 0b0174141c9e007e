use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{OriginalUri, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    common::{ErrorResponse, SessionId},
    protocol::WireSession,
    server::AppState,
};

pub async fn index() -> &'static str {
    "Hi!"
}

/// Every live session.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, WireSession>> {
    Json(state.registry.snapshot())
}

/// Redirects to the session's watch URL, with the session as the body.
pub async fn redirect_session(
    Path(session_id): Path<String>,
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.registry.get(&SessionId::from(session_id)) {
        Ok(session) => {
            let location = session.watch_url();
            debug!("Redirecting session {} to {}", session.id(), location);
            (
                StatusCode::FOUND,
                [(header::LOCATION, location)],
                Json(session.wire_session()),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(e.to_string(), uri.path())),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{configs::Config, protocol::connection::testing::RecordingConnection, transport};

    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()))
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        transport::router(state.clone()).oneshot(req).await.unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let body = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn index_says_hi() {
        let resp = get(&state(), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Flixy-Api-Version"], "1");
        let body = to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Hi!");
    }

    #[tokio::test]
    async fn status_lists_sessions() {
        let state = state();
        let session = state.registry.create(42, 1000);
        session
            .add_member(RecordingConnection::new("a"), "alice")
            .unwrap();

        let resp = get(&state, "/status").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        let listed = &body[session.id().to_string()];
        assert_eq!(listed["video_id"], 42);
        assert_eq!(listed["time"], 1000);
        assert_eq!(listed["members"]["a"]["nick"], "alice");
    }

    #[tokio::test]
    async fn known_session_redirects_to_the_watch_url() {
        let state = state();
        let session = state.registry.create(80_117_470, 0);

        let resp = get(&state, &format!("/sessions/{}", session.id())).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers()[header::LOCATION],
            format!(
                "https://www.netflix.com/watch/80117470?flixySessionId={}",
                session.id()
            )
            .as_str()
        );

        let body = json_body(resp).await;
        assert_eq!(body["session_id"], session.id().to_string());
        assert_eq!(body["video_id"], 80_117_470);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let resp = get(&state(), "/sessions/0000-0000-0000-0000").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = json_body(resp).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["path"], "/sessions/0000-0000-0000-0000");
    }
}
