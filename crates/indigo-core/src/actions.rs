//! Game actions that teams can take.
//!
//! This module defines the three kinds of action a host can submit and the
//! events that result from applying them.

use crate::board::GemColor;
use crate::hex::{Cell, Edge};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};

/// All possible actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Rotate a tile in the team's hand one step clockwise (does not use a turn)
    RotateTile { team: String, tile: Tile },

    /// Place a tile from the team's hand, oriented as given
    PlaceTile {
        team: String,
        tile: Tile,
        row: i32,
        column: i32,
    },

    /// Force the winners and end the game
    SetWinners { winners: Vec<String> },
}

impl GameAction {
    /// The acting team, if the action has one
    pub fn team(&self) -> Option<&str> {
        match self {
            GameAction::RotateTile { team, .. } | GameAction::PlaceTile { team, .. } => Some(team),
            GameAction::SetWinners { .. } => None,
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A hand tile was rotated; `tile` is the new orientation
    TileRotated { team: String, tile: Tile },

    /// A tile was placed on the board
    TilePlaced { team: String, tile: Tile, cell: Cell },

    /// A gem crossed a tile
    GemMoved { gem: usize, cell: Cell, edge: Edge },

    /// Two gems met and left play
    GemsCollided { first: usize, second: usize },

    /// A gem reached a gateway and scored for its owners
    GemScored {
        gem: usize,
        color: GemColor,
        gateway: usize,
        teams: Vec<String>,
        points: u32,
    },

    /// A replacement tile was drawn
    TileDrawn { team: String },

    /// Turn passed to the next team
    TurnEnded { team: String, next_team: String },

    /// Play returned to the first team
    RoundCompleted { round: u32 },

    /// The game ended normally
    GameFinished { winners: Vec<String> },

    /// Winners were set directly
    WinnersSet { winners: Vec<String> },
}
