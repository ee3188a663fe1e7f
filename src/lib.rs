// Library crate for the tic-tac-toe session server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod game;
pub mod session;
pub mod shared;
pub mod websockets;

use axum::{
    routing::{get, post},
    Router,
};

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, ConnectionConfig};
pub use event::{EventBus, SessionEvent, Subscription};
pub use game::{Game, GameplayError, Sign, TicTacToe};
pub use session::{Session, SessionError, SessionRegistry};
pub use shared::{AppError, AppState};
pub use websockets::{Connection, ConnectionError, SocketReceiver, SocketSender};

/// All HTTP and WebSocket routes, without middleware
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sessions", post(session::create_session))
        .route("/sessions/:session_id", get(session::get_session))
        .route(
            "/sessions/:session_id/players/:player_name/join",
            get(websockets::join_session),
        )
        .with_state(app_state)
}
