//! Indigo - a hex tile-laying game of gems and gateways
//!
//! This crate provides the core game logic for Indigo, including:
//! - Hex cells and edge adjacency for the 61-cell board
//! - Path tiles and the fixed tile catalog
//! - Gem movement, collisions and gateway scoring
//! - Team hands and the seeded tile deck
//! - Turn and round state machine with winner determination
//!
//! # Architecture
//!
//! The engine is host-agnostic: it takes actions and returns events and
//! snapshots, leaving transport and persistence to the caller. Games can be
//! stored and replayed through the compact log in [`notation`].
//!
//! # Modules
//!
//! - [`hex`]: Board geometry, cells and edges
//! - [`tile`]: Path tiles and the tile catalog
//! - [`board`]: Tile placement, gems and gateways
//! - [`player`]: Teams, hands and the deck
//! - [`actions`]: Actions and the events they produce
//! - [`game`]: Game state machine
//! - [`notation`]: Replay log encoding and decoding

pub mod actions;
pub mod board;
pub mod game;
pub mod hex;
pub mod notation;
pub mod player;
pub mod tile;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use board::{Board, BoardError, Gateway, Gem, GemColor, GemStatus, Propagation, GATEWAYS};
pub use game::{ConfigError, GameConfig, GameError, GameSnapshot, GameState, Variant};
pub use hex::{Cell, Edge};
pub use notation::{LogEntry, NotationError, ReplayLog};
pub use player::{Deck, DeckError, Hand, Team};
pub use tile::{Tile, TileError};
