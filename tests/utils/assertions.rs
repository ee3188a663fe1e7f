//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde::Deserialize;
use std::collections::HashSet;

use tictactoe::Session;

/// Client-side decoding of a game view
#[derive(Debug, Clone, Deserialize)]
pub struct GameView {
    pub you: String,
    pub state: Vec<Vec<Option<String>>>,
    pub your_turn: bool,
    pub your_sign: Option<String>,
    pub game_over: bool,
    pub winner: Option<String>,
    pub active_players: Vec<ViewPlayer>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ViewPlayer {
    pub name: String,
    pub sign: Option<String>,
}

impl GameView {
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.state[row][col].as_deref()
    }

    pub fn active_names(&self) -> Vec<&str> {
        self.active_players.iter().map(|p| p.name.as_str()).collect()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct StateAssertion<'a> {
    session: &'a Session,
}

impl<'a> StateAssertion<'a> {
    pub fn for_session(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn has_active_players(self, expected: &[&str]) -> Self {
        let expected: HashSet<String> = expected.iter().map(|s| s.to_string()).collect();
        assert_eq!(self.session.active_player_names(), expected);
        self
    }

    pub fn has_seated_players(self, expected: &[&str]) -> Self {
        let names: Vec<String> = self.session.players().into_iter().map(|p| p.name).collect();
        assert_eq!(names, expected);
        self
    }

    pub fn cell_is_empty(self, row: usize, col: usize) -> Self {
        assert!(self.session.snapshot().state[row][col].is_none());
        self
    }
}
