// TicTacToe is a single match on an N x N board.
// Cross always opens; every successful move hands the turn to the other sign.
// A line is won by filling a whole row, column or one of the two diagonals.

use super::{Game, GameplayError, Sign};

#[derive(Debug, Clone)]
pub struct TicTacToe {
    board: Vec<Vec<Sign>>,
    turn: Sign,
}

impl TicTacToe {
    pub fn new(size: usize) -> Self {
        Self {
            board: vec![vec![Sign::None; size]; size],
            turn: Sign::Cross,
        }
    }

    fn cell_index(&self, row: i64, col: i64) -> Result<(usize, usize), GameplayError> {
        let size = self.board.len();
        match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < size && c < size => Ok((r, c)),
            _ => Err(GameplayError::OutOfBounds { row, col }),
        }
    }

    /// The sign owning every cell yielded by `line`, if there is one.
    fn line_owner(&self, mut line: impl Iterator<Item = (usize, usize)>) -> Sign {
        let Some((r, c)) = line.next() else {
            return Sign::None;
        };
        let first = self.board[r][c];
        if first.is_none() {
            return Sign::None;
        }
        if line.all(|(r, c)| self.board[r][c] == first) {
            first
        } else {
            Sign::None
        }
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Game for TicTacToe {
    fn make_move(&mut self, row: i64, col: i64) -> Result<(), GameplayError> {
        let (r, c) = self.cell_index(row, col)?;
        if self.game_over() {
            return Err(GameplayError::GameOver);
        }
        if !self.board[r][c].is_none() {
            return Err(GameplayError::CellOccupied { row: r, col: c });
        }

        self.board[r][c] = self.turn;
        self.turn = self.turn.opponent();
        Ok(())
    }

    fn state(&self) -> Vec<Vec<Sign>> {
        self.board.clone()
    }

    fn turn(&self) -> Sign {
        self.turn
    }

    fn winner(&self) -> Sign {
        let n = self.board.len();

        for i in 0..n {
            let row = self.line_owner((0..n).map(|j| (i, j)));
            if !row.is_none() {
                return row;
            }
            let col = self.line_owner((0..n).map(|j| (j, i)));
            if !col.is_none() {
                return col;
            }
        }

        let diagonal = self.line_owner((0..n).map(|i| (i, i)));
        if !diagonal.is_none() {
            return diagonal;
        }
        self.line_owner((0..n).map(|i| (n - i - 1, i)))
    }

    fn game_over(&self) -> bool {
        let board_full = self.board.iter().flatten().all(|cell| !cell.is_none());
        board_full || !self.winner().is_none()
    }

    fn size(&self) -> usize {
        self.board.len()
    }
}
