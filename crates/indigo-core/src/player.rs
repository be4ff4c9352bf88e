//! Team state, hands and the tile deck.
//!
//! This module contains:
//! - `Hand`: the tiles a team holds
//! - `Deck`: the shuffled supply of undealt tiles
//! - `Team`: a team's name, hand and score

use crate::tile::Tile;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from drawing tiles
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DeckError {
    #[error("deck is empty so cannot draw")]
    Empty,
}

/// The undealt tiles.
///
/// Tiles are drawn from the end, so the draw order depends only on the seed
/// and the sequence of draws and adds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    tiles: Vec<Tile>,
    rng: ChaCha8Rng,
}

impl Deck {
    /// Build the standard deck and shuffle it with `seed`
    pub fn new(seed: u64) -> Self {
        let mut deck = Self {
            tiles: Tile::standard_set(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        deck.shuffle();
        deck
    }

    /// A deck that deals `tiles` in the given order, first element first.
    ///
    /// `seed` only affects reshuffles after `add`.
    pub fn from_draw_order(tiles: Vec<Tile>, seed: u64) -> Self {
        let mut tiles = tiles;
        tiles.reverse();
        Self {
            tiles,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Remove and return the next tile
    pub fn draw(&mut self) -> Result<Tile, DeckError> {
        self.tiles.pop().ok_or(DeckError::Empty)
    }

    /// Return tiles to the deck and reshuffle
    pub fn add(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        self.tiles.extend(tiles);
        self.shuffle();
    }

    fn shuffle(&mut self) {
        self.tiles.shuffle(&mut self.rng);
    }

    /// Number of tiles left
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no tiles are left
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// The tiles held by one team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    tiles: Vec<Tile>,
}

impl Hand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile
    pub fn add(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    /// Remove the tile at `index`
    pub fn remove(&mut self, index: usize) -> Option<Tile> {
        (index < self.tiles.len()).then(|| self.tiles.remove(index))
    }

    /// Index of a tile that is the same piece as `tile`, in any rotation
    pub fn find(&self, tile: &Tile) -> Option<usize> {
        self.tiles.iter().position(|t| t.is_same_piece(tile))
    }

    /// Mutable access to the tile at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    /// The held tiles
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of held tiles
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the hand is empty
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// A team taking part in the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team name, unique within a game
    pub name: String,
    /// Tiles available to place
    pub hand: Hand,
    /// Points from gems reaching owned gateways
    pub points: u32,
    /// Number of gems that scored for this team
    pub gems_scored: u32,
}

impl Team {
    /// Create a team with an empty hand and no score
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hand: Hand::new(),
            points: 0,
            gems_scored: 0,
        }
    }

    /// Credit a gem worth `points`
    pub fn score_gem(&mut self, points: u32) {
        self.points += points;
        self.gems_scored += 1;
    }
}
