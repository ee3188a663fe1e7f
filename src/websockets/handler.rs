use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use futures::StreamExt;
use tracing::info;
use uuid::Uuid;

use crate::shared::AppState;

use super::connection::Connection;

/// Upgrades the request and hands the socket over to a player connection.
///
/// Name and session checks happen after the upgrade so the client always
/// receives a structured error message.
pub async fn join_session(
    ws: WebSocketUpgrade,
    Path((session_id, player_name)): Path<(Uuid, String)>,
    State(app_state): State<AppState>,
) -> Response {
    info!(
        session_id = %session_id,
        player = %player_name,
        "WebSocket connection requested"
    );

    ws.on_upgrade(move |socket| async move {
        let (sender, receiver) = socket.split();
        Connection::new(&app_state, session_id, player_name)
            .run(sender, receiver)
            .await;
    })
}
