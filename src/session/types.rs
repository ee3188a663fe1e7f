use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{Player, SessionConfig, SessionSnapshot};
use crate::shared::AppError;

/// Smallest and largest accepted board sizes
pub const MIN_FIELD_SIZE: usize = 3;
pub const MAX_FIELD_SIZE: usize = 10;

/// Request body for session creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Side length of the board
    pub field: usize,
}

impl CreateSessionRequest {
    pub fn into_config(self) -> Result<SessionConfig, AppError> {
        if !(MIN_FIELD_SIZE..=MAX_FIELD_SIZE).contains(&self.field) {
            return Err(AppError::BadRequest(format!(
                "Field size must be between {MIN_FIELD_SIZE} and {MAX_FIELD_SIZE}"
            )));
        }
        Ok(SessionConfig {
            field_size: self.field,
        })
    }
}

/// Response structure for session creation endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateSessionResponse {
    pub id: Uuid,
}

/// Seat as reported over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerResponse {
    pub name: String,
    pub sign: Option<String>,
}

impl From<&Player> for PlayerResponse {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            sign: player.sign.as_str().map(str::to_string),
        }
    }
}

/// Summary of a session for the lookup endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub id: Uuid,
    pub players: Vec<PlayerResponse>,
    pub game_over: bool,
    /// Name of the winning player
    pub winner: Option<String>,
}

impl SessionResponse {
    pub fn new(id: Uuid, snapshot: &SessionSnapshot) -> Self {
        Self {
            id,
            players: snapshot.players.iter().map(PlayerResponse::from).collect(),
            game_over: snapshot.game_over,
            winner: snapshot.winner_name().map(str::to_string),
        }
    }
}
