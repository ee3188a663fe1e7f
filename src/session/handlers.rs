use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::types::{CreateSessionRequest, CreateSessionResponse, SessionResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new session
///
/// POST /sessions
/// Returns the id players use to join
#[instrument(name = "create_session", skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let config = request.into_config()?;
    let session = state.registry.create(config);

    info!(
        session_id = %session.id(),
        field_size = config.field_size,
        "Session created successfully"
    );

    Ok(Json(CreateSessionResponse { id: session.id() }))
}

/// HTTP handler for looking up a session
///
/// GET /sessions/:session_id
#[instrument(name = "get_session", skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.registry.get(session_id)?;
    Ok(Json(SessionResponse::new(session.id(), &session.snapshot())))
}
