use serde::{Deserialize, Serialize};

use crate::game::Sign;
use crate::session::{Player, SessionSnapshot};

/// Client -> Server: place the player's sign on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub row: i64,
    pub col: i64,
}

/// Server -> Client: the session as seen by one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStateMessage {
    pub you: String,
    pub state: Vec<Vec<Sign>>,
    pub your_turn: bool,
    pub your_sign: Sign,
    pub game_over: bool,
    pub winner: Sign,
    pub active_players: Vec<Player>,
}

impl GameStateMessage {
    /// Render `snapshot` for `player`
    pub fn for_player(player: &str, snapshot: &SessionSnapshot) -> Self {
        let your_sign = snapshot.sign_of(player);
        Self {
            you: player.to_string(),
            state: snapshot.state.clone(),
            your_turn: !your_sign.is_none() && your_sign == snapshot.turn,
            your_sign,
            game_over: snapshot.game_over,
            winner: snapshot.winner,
            active_players: snapshot.active_players.clone(),
        }
    }
}

/// Server -> Client: something the client asked for was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
