// Public API
pub use sign::Sign;
pub use tic_tac_toe::TicTacToe;

// Internal modules
mod sign;
mod tic_tac_toe;

use thiserror::Error;

/// Errors raised by an in-progress match.
///
/// These are always recoverable: the offending player is told what went
/// wrong and the match carries on unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameplayError {
    #[error("Field (row={row};col={col}) is used")]
    CellOccupied { row: usize, col: usize },

    #[error("Field (row={row};col={col}) is outside of the board")]
    OutOfBounds { row: i64, col: i64 },

    #[error("Wait for second player's move")]
    NotPlayersTurn,

    #[error("The game is over")]
    GameOver,
}

/// A two-player, turn-based board game that a session can host.
///
/// Implementations are plain state machines; sessions serialize access to
/// them, so no internal locking is needed.
pub trait Game: Send {
    /// Places the sign of whoever's turn it is at (`row`, `col`) and passes
    /// the turn to the opponent.
    fn make_move(&mut self, row: i64, col: i64) -> Result<(), GameplayError>;

    /// Board cells, row by row.
    fn state(&self) -> Vec<Vec<Sign>>;

    /// The sign expected to move next.
    fn turn(&self) -> Sign;

    /// The sign holding a winning line, or `Sign::None`.
    fn winner(&self) -> Sign;

    fn game_over(&self) -> bool;

    /// Side length of the square board.
    fn size(&self) -> usize;
}
