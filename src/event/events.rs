use serde::{Deserialize, Serialize};

/// Change signals published on a session topic
///
/// Subscribers treat every variant the same way ("something changed, render
/// again"); the variant only tells the logs what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A player's connection was activated
    PlayerJoined { player: String },

    /// A player's connection ended
    PlayerLeft { player: String },

    /// A move was applied to the game
    MovePlayed { player: String, row: i64, col: i64 },
}

impl SessionEvent {
    /// Get a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::PlayerJoined { .. } => "player_joined",
            SessionEvent::PlayerLeft { .. } => "player_left",
            SessionEvent::MovePlayed { .. } => "move_played",
        }
    }
}
