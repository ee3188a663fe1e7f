use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ConnectionConfig;
use crate::event::EventBus;
use crate::session::{SessionError, SessionRegistry};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub event_bus: EventBus,
    pub connection_config: ConnectionConfig,
}

impl AppState {
    pub fn new(
        registry: Arc<SessionRegistry>,
        event_bus: EventBus,
        connection_config: ConnectionConfig,
    ) -> Self {
        Self {
            registry,
            event_bus,
            connection_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound(_) => AppError::NotFound(error.to_string()),
            SessionError::SessionFull | SessionError::AlreadyActive(_) => {
                AppError::BadRequest(error.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
