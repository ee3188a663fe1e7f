use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::SessionError;
use crate::game::{Game, GameplayError, Sign, TicTacToe};

/// Seats available in every session
pub const MAX_PLAYERS: usize = 2;

/// Settings for a newly created session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Side length of the board
    pub field_size: usize,
}

impl SessionConfig {
    pub fn build_game(&self) -> Box<dyn Game> {
        Box::new(TicTacToe::new(self.field_size))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { field_size: 3 }
    }
}

/// A named seat in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub name: String,
    pub sign: Sign,
}

/// Point-in-time copy of a session, taken under its lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: Vec<Vec<Sign>>,
    pub turn: Sign,
    pub game_over: bool,
    pub winner: Sign,
    /// Every seated player, in join order
    pub players: Vec<Player>,
    /// Seated players that currently hold a connection, in join order
    pub active_players: Vec<Player>,
}

impl SessionSnapshot {
    pub fn sign_of(&self, name: &str) -> Sign {
        self.players
            .iter()
            .find(|p| p.name == name)
            .map_or(Sign::None, |p| p.sign)
    }

    /// Name of the player holding the winning sign, if any.
    pub fn winner_name(&self) -> Option<&str> {
        if self.winner.is_none() {
            return None;
        }
        self.players
            .iter()
            .find(|p| p.sign == self.winner)
            .map(|p| p.name.as_str())
    }
}

struct SessionState {
    game: Box<dyn Game>,
    /// Join order decides the sign; a seat is never given away
    players: Vec<Player>,
    active_players: HashSet<String>,
    released_at: DateTime<Utc>,
    next_sign: Sign,
    /// Set by the sweep once the session is condemned
    reclaimed: bool,
}

impl SessionState {
    fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }
}

/// One match plus the bookkeeping of who is connected to it
///
/// All mutable state sits behind a single mutex; sessions never share a lock,
/// so activity in one session does not contend with another.
pub struct Session {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(id: Uuid, game: Box<dyn Game>) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState {
                game,
                players: Vec::with_capacity(MAX_PLAYERS),
                active_players: HashSet::new(),
                released_at: Utc::now(),
                next_sign: Sign::Cross,
                reclaimed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the bus topic carrying this session's change signals
    pub fn topic(&self) -> String {
        self.id.to_string()
    }

    pub fn released_at(&self) -> DateTime<Utc> {
        self.lock().released_at
    }

    pub fn players(&self) -> Vec<Player> {
        self.lock().players.clone()
    }

    pub fn active_player_names(&self) -> HashSet<String> {
        self.lock().active_players.clone()
    }

    pub fn sign_of(&self, name: &str) -> Option<Sign> {
        self.lock().player(name).map(|p| p.sign)
    }

    pub fn is_players_turn(&self, name: &str) -> bool {
        let state = self.lock();
        state
            .player(name)
            .is_some_and(|p| p.sign == state.game.turn())
    }

    /// Claims the connection slot for `name`.
    ///
    /// Unknown names take the next free seat. The slot stays claimed until
    /// the returned guard is dropped.
    pub fn activate(self: &Arc<Self>, name: &str) -> Result<ActivationGuard, SessionError> {
        let mut state = self.lock();

        if state.reclaimed {
            return Err(SessionError::NotFound(self.id));
        }

        if state.player(name).is_none() {
            if state.players.len() >= MAX_PLAYERS {
                debug!(session_id = %self.id, player = %name, "Session is full");
                return Err(SessionError::SessionFull);
            }
            let sign = state.next_sign;
            state.next_sign = sign.opponent();
            state.players.push(Player {
                name: name.to_string(),
                sign,
            });
            info!(session_id = %self.id, player = %name, sign = ?sign, "Player took a seat");
        }

        if !state.active_players.insert(name.to_string()) {
            debug!(session_id = %self.id, player = %name, "Player is already active");
            return Err(SessionError::AlreadyActive(name.to_string()));
        }

        debug!(
            session_id = %self.id,
            player = %name,
            active = state.active_players.len(),
            "Player activated"
        );

        Ok(ActivationGuard {
            session: Arc::clone(self),
            player: name.to_string(),
        })
    }

    /// Applies a move on behalf of `name`, checking the turn and the move
    /// under the same lock.
    pub fn play_move(&self, name: &str, row: i64, col: i64) -> Result<(), GameplayError> {
        let mut state = self.lock();

        let sign = state.player(name).map_or(Sign::None, |p| p.sign);
        if sign.is_none() || sign != state.game.turn() {
            return Err(GameplayError::NotPlayersTurn);
        }

        state.game.make_move(row, col)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            state: state.game.state(),
            turn: state.game.turn(),
            game_over: state.game.game_over(),
            winner: state.game.winner(),
            players: state.players.clone(),
            active_players: state
                .players
                .iter()
                .filter(|p| state.active_players.contains(&p.name))
                .cloned()
                .collect(),
        }
    }

    /// Whether nobody is connected and the last connection ended more than
    /// `timeout` before `now`.
    pub fn is_dead(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let state = self.lock();
        state.active_players.is_empty() && Self::expired(state.released_at, timeout, now)
    }

    fn expired(released_at: DateTime<Utc>, timeout: Duration, now: DateTime<Utc>) -> bool {
        (now - released_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed > timeout)
    }

    /// Condemns the session if it is dead; a condemned session refuses all
    /// further activations. Returns whether it was condemned.
    pub(crate) fn reclaim_if_dead(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        if state.reclaimed {
            return true;
        }
        if state.active_players.is_empty() && Self::expired(state.released_at, timeout, now) {
            state.reclaimed = true;
        }
        state.reclaimed
    }

    fn release(&self, name: &str) {
        let mut state = self.lock();
        state.active_players.remove(name);
        state.released_at = Utc::now();
        debug!(
            session_id = %self.id,
            player = %name,
            active = state.active_players.len(),
            "Player released"
        );
    }
}

/// Proof that a player currently holds its connection slot in a session
///
/// Dropping the guard frees the slot and refreshes the session's release
/// timestamp, whichever way the owning connection ends.
#[must_use = "the player is deactivated as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ActivationGuard {
    session: Arc<Session>,
    player: String,
}

impl ActivationGuard {
    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        self.session.release(&self.player);
    }
}
