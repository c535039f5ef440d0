//! Game phases and turn ownership

use crate::core::Side;
use serde::{Deserialize, Serialize};

/// Match-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Mulligan,
    Play,
    GameOver,
}

/// Turn counter and the side whose turn it is
///
/// Only the turn lifecycle controller advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStructure {
    turn_number: u32,
    current_turn: Side,
}

impl TurnStructure {
    pub fn new(first: Side) -> Self {
        TurnStructure {
            turn_number: 0,
            current_turn: first,
        }
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn current_turn(&self) -> Side {
        self.current_turn
    }

    /// Enter the first turn of the match
    pub(crate) fn begin(&mut self) {
        self.turn_number = 1;
    }

    /// Pass the turn to the other side
    pub(crate) fn next_turn(&mut self) {
        self.current_turn = self.current_turn.other();
        self.turn_number += 1;
    }
}
