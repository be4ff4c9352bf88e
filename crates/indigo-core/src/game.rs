//! Core game state machine.
//!
//! This module contains the main `GameState` struct and all turn logic:
//! dealing, placement, scoring, round counting and winner determination.

use crate::actions::{GameAction, GameEvent};
use crate::board::{gateway_owners, Board, BoardError};
use crate::hex::Cell;
use crate::notation::LogEntry;
use crate::player::{Deck, Team};
use crate::tile::{Tile, TileError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Fewest teams in a game
pub const MIN_TEAMS: usize = 2;

/// Most teams in a game
pub const MAX_TEAMS: usize = 4;

/// Rule variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum Variant {
    /// One tile per hand
    #[default]
    Classic,
    /// Three tiles per hand
    LargeHands,
}

impl Variant {
    /// All variants
    pub const ALL: [Variant; 2] = [Variant::Classic, Variant::LargeHands];

    /// Number of tiles dealt to each team
    pub fn hand_size(&self) -> usize {
        match self {
            Variant::Classic => 1,
            Variant::LargeHands => 3,
        }
    }

    /// Tag used in options and replay logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classic => "Classic",
            Variant::LargeHands => "LargeHands",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    /// An empty tag selects `Classic`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Variant::Classic);
        }
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidVariant(s.to_string()))
    }
}

impl TryFrom<String> for Variant {
    type Error = ConfigError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// Errors building a game
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("at least 2 teams required, got {0}")]
    TooFewTeams(usize),

    #[error("at most 4 teams allowed, got {0}")]
    TooManyTeams(usize),

    #[error("duplicate team {0}")]
    DuplicateTeam(String),

    #[error("invalid variant {0}")]
    InvalidVariant(String),

    #[error("malformed options: {0}")]
    MalformedOptions(String),

    #[error("deck holds {available} tiles but {needed} are needed to deal")]
    DeckTooSmall { needed: usize, available: usize },
}

/// Options for creating a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Teams in turn order
    pub teams: Vec<String>,
    /// Rule variant
    #[serde(default)]
    pub variant: Variant,
    /// Deck shuffle seed
    pub seed: u64,
    /// Rounds before the game ends; 0 never ends on rounds
    #[serde(default)]
    pub rounds_until_end: u32,
}

impl GameConfig {
    /// Classic game with no round limit
    pub fn new<S: Into<String>>(teams: impl IntoIterator<Item = S>, seed: u64) -> Self {
        Self {
            teams: teams.into_iter().map(Into::into).collect(),
            variant: Variant::Classic,
            seed,
            rounds_until_end: 0,
        }
    }

    /// Set the variant
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the round limit
    pub fn with_rounds_until_end(mut self, rounds: u32) -> Self {
        self.rounds_until_end = rounds;
        self
    }

    /// Parse host options from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::MalformedOptions(e.to_string()))
    }

    /// Check team count and uniqueness
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.teams.len();
        if count < MIN_TEAMS {
            return Err(ConfigError::TooFewTeams(count));
        }
        if count > MAX_TEAMS {
            return Err(ConfigError::TooManyTeams(count));
        }
        let mut seen = HashSet::new();
        for team in &self.teams {
            if !seen.insert(team.as_str()) {
                return Err(ConfigError::DuplicateTeam(team.clone()));
            }
        }
        Ok(())
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("unknown team {0}")]
    UnknownTeam(String),

    #[error("{found} cannot play during {expected}'s turn")]
    WrongTurn { expected: String, found: String },

    #[error("{0} not in hand")]
    TileNotInHand(String),

    #[error(transparent)]
    InvalidTilePattern(#[from] TileError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("invalid action details: {0}")]
    InvalidActionDetails(String),

    #[error("game already over")]
    GameOver,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// All teams, in turn order
    pub teams: Vec<Team>,
    /// Index of the team to place next
    pub turn: usize,
    /// Completed rounds
    pub round: u32,
    /// Winners; empty while the game is in progress
    pub winners: Vec<String>,
    /// Undealt tiles
    deck: Deck,
    /// Options the game was created with
    config: GameConfig,
    /// Recorded placements and winner overrides, for replay
    history: Vec<LogEntry>,
}

impl GameState {
    /// Create a new game with a deck shuffled from the configured seed
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let deck = Deck::new(config.seed);
        Self::with_deck(config, deck)
    }

    /// Create a new game dealing from a prepared deck
    pub fn with_deck(config: GameConfig, mut deck: Deck) -> Result<Self, ConfigError> {
        config.validate()?;

        let hand_size = config.variant.hand_size();
        let needed = hand_size * config.teams.len();
        if deck.len() < needed {
            return Err(ConfigError::DeckTooSmall {
                needed,
                available: deck.len(),
            });
        }

        let mut teams = Vec::with_capacity(config.teams.len());
        for name in &config.teams {
            let mut team = Team::new(name.clone());
            for _ in 0..hand_size {
                let tile = deck.draw().map_err(|e| ConfigError::MalformedOptions(e.to_string()))?;
                team.hand.add(tile);
            }
            teams.push(team);
        }

        debug!(teams = ?config.teams, variant = %config.variant, seed = config.seed, "game created");

        Ok(Self {
            board: Board::new(),
            teams,
            turn: 0,
            round: 0,
            winners: Vec::new(),
            deck,
            config,
            history: Vec::new(),
        })
    }

    /// Options the game was created with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Team names in turn order
    pub fn team_names(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.name.clone()).collect()
    }

    /// Name of the team to place next
    pub fn current_team(&self) -> &str {
        &self.teams[self.turn].name
    }

    /// Index of a team by name
    pub fn team_index(&self, team: &str) -> Result<usize, GameError> {
        self.teams
            .iter()
            .position(|t| t.name == team)
            .ok_or_else(|| GameError::UnknownTeam(team.to_string()))
    }

    /// Get a team by name
    pub fn get_team(&self, team: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == team)
    }

    /// Tiles left in the deck
    pub fn deck_remaining(&self) -> usize {
        self.deck.len()
    }

    /// Placements and winner overrides applied so far
    pub fn history(&self) -> &[LogEntry] {
        &self.history
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        !self.winners.is_empty()
    }

    // ==================== Actions ====================

    /// Rotate a hand tile one step clockwise
    pub fn rotate_tile(&mut self, team: &str, tile: &str) -> Result<Vec<GameEvent>, GameError> {
        self.acting_team(team)?;
        let tile = Tile::new(tile)?;
        self.apply_action(GameAction::RotateTile {
            team: team.to_string(),
            tile,
        })
    }

    /// Place a hand tile, oriented as written, at `(row, column)`
    pub fn place_tile(
        &mut self,
        team: &str,
        tile: &str,
        row: i32,
        column: i32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.placing_team(team)?;
        let tile = Tile::new(tile)?;
        self.apply_action(GameAction::PlaceTile {
            team: team.to_string(),
            tile,
            row,
            column,
        })
    }

    /// Force the winners, ending the game
    pub fn set_winners(&mut self, winners: Vec<String>) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(GameAction::SetWinners { winners })
    }

    /// Apply an action to the game state.
    ///
    /// On error the state is left untouched.
    pub fn apply_action(&mut self, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::RotateTile { team, tile } => self.apply_rotate(team, tile),
            GameAction::PlaceTile {
                team,
                tile,
                row,
                column,
            } => self.apply_place(team, tile, row, column),
            GameAction::SetWinners { winners } => self.apply_set_winners(winners),
        }
    }

    /// Index of a team allowed to act at all: the game is running and the team exists
    fn acting_team(&self, team: &str) -> Result<usize, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        self.team_index(team)
    }

    /// Index of a team allowed to place: it must also be that team's turn
    fn placing_team(&self, team: &str) -> Result<usize, GameError> {
        let team_idx = self.acting_team(team)?;
        if team_idx != self.turn {
            return Err(GameError::WrongTurn {
                expected: self.current_team().to_string(),
                found: team.to_string(),
            });
        }
        Ok(team_idx)
    }

    fn apply_rotate(&mut self, team: String, tile: Tile) -> Result<Vec<GameEvent>, GameError> {
        let team_idx = self.acting_team(&team)?;
        let not_in_hand = || GameError::TileNotInHand(tile.to_string());
        let hand = &mut self.teams[team_idx].hand;
        let idx = hand.find(&tile).ok_or_else(not_in_hand)?;
        let slot = hand.get_mut(idx).ok_or_else(not_in_hand)?;
        slot.rotate_clockwise();
        let rotated = slot.clone();

        debug!(%team, tile = %rotated, "tile rotated");
        Ok(vec![GameEvent::TileRotated {
            team,
            tile: rotated,
        }])
    }

    fn apply_place(
        &mut self,
        team: String,
        tile: Tile,
        row: i32,
        column: i32,
    ) -> Result<Vec<GameEvent>, GameError> {
        let team_idx = self.placing_team(&team)?;
        if tile.is_treasure() || !tile.is_valid_shape() {
            return Err(TileError::InvalidPattern(tile.to_string()).into());
        }
        let hand_idx = self.teams[team_idx]
            .hand
            .find(&tile)
            .ok_or_else(|| GameError::TileNotInHand(tile.to_string()))?;
        self.board.check_placement(row, column)?;

        // Validation done; from here on nothing can fail
        let mut events = Vec::new();
        self.teams[team_idx].hand.remove(hand_idx);
        let cell = self.board.place(tile.clone(), row, column)?;
        debug!(%team, %tile, %cell, "tile placed");

        self.history.push(LogEntry {
            team: team_idx,
            action: GameAction::PlaceTile {
                team: team.clone(),
                tile: tile.clone(),
                row,
                column,
            },
        });
        events.push(GameEvent::TilePlaced {
            team: team.clone(),
            tile,
            cell,
        });

        events.extend(self.move_gems(cell));

        match self.deck.draw() {
            Ok(drawn) => {
                self.teams[team_idx].hand.add(drawn);
                events.push(GameEvent::TileDrawn { team: team.clone() });
            }
            Err(e) => debug!(%team, "{e}, no replacement drawn"),
        }

        events.extend(self.advance_turn());
        events.extend(self.check_game_end());

        Ok(events)
    }

    fn apply_set_winners(&mut self, winners: Vec<String>) -> Result<Vec<GameEvent>, GameError> {
        if let Some(unknown) = winners.iter().find(|w| self.get_team(w).is_none()) {
            return Err(GameError::InvalidActionDetails(format!(
                "winner {unknown} not in teams"
            )));
        }

        info!(?winners, "winners set");
        self.history.push(LogEntry {
            team: self.turn,
            action: GameAction::SetWinners {
                winners: winners.clone(),
            },
        });
        self.winners = winners.clone();
        Ok(vec![GameEvent::WinnersSet { winners }])
    }

    // ==================== Helper Methods ====================

    /// Run gem propagation from a fresh placement and credit any scores
    fn move_gems(&mut self, placed: Cell) -> Vec<GameEvent> {
        let report = self.board.propagate_gems(placed);
        let mut events: Vec<GameEvent> = report
            .hops
            .iter()
            .map(|hop| GameEvent::GemMoved {
                gem: hop.gem,
                cell: hop.cell,
                edge: hop.edge,
            })
            .collect();

        for &(first, second) in &report.collisions {
            events.push(GameEvent::GemsCollided { first, second });
        }

        for &gem_idx in &report.scored {
            let gem = &self.board.gems()[gem_idx];
            let Some(gateway) = gem.gateway() else {
                continue;
            };
            let color = gem.color;
            let points = color.points();
            let mut credited = Vec::new();
            for &owner in gateway_owners(self.teams.len(), gateway) {
                if let Some(team) = self.teams.get_mut(owner) {
                    team.score_gem(points);
                    credited.push(team.name.clone());
                }
            }
            debug!(gem = gem_idx, gateway, ?credited, points, "gem scored");
            events.push(GameEvent::GemScored {
                gem: gem_idx,
                color,
                gateway,
                teams: credited,
                points,
            });
        }

        events
    }

    /// Pass the turn on, skipping teams left without tiles once the deck runs out
    fn advance_turn(&mut self) -> Vec<GameEvent> {
        let team = self.current_team().to_string();
        let mut rounds = Vec::new();
        for _ in 0..self.teams.len() {
            self.turn = (self.turn + 1) % self.teams.len();
            if self.turn == 0 {
                self.round += 1;
                rounds.push(GameEvent::RoundCompleted { round: self.round });
            }
            if !self.teams[self.turn].hand.is_empty() {
                break;
            }
        }

        debug!(%team, next = self.current_team(), round = self.round, "turn ended");
        let mut events = vec![GameEvent::TurnEnded {
            team,
            next_team: self.current_team().to_string(),
        }];
        events.extend(rounds);
        events
    }

    fn check_game_end(&mut self) -> Vec<GameEvent> {
        let rounds_over =
            self.config.rounds_until_end > 0 && self.round >= self.config.rounds_until_end;
        let gems_gone = self.board.gems_still_in_play() == 0;
        let tiles_gone = self.teams.iter().all(|t| t.hand.is_empty());

        if !(rounds_over || gems_gone || tiles_gone) {
            return Vec::new();
        }

        self.winners = self.leaders();
        info!(winners = ?self.winners, round = self.round, "game finished");
        vec![GameEvent::GameFinished {
            winners: self.winners.clone(),
        }]
    }

    /// Teams with the most points, ties broken by most gems scored
    fn leaders(&self) -> Vec<String> {
        let best_points = self.teams.iter().map(|t| t.points).max().unwrap_or(0);
        let tied: Vec<&Team> = self.teams.iter().filter(|t| t.points == best_points).collect();
        let best_gems = tied.iter().map(|t| t.gems_scored).max().unwrap_or(0);
        tied.into_iter()
            .filter(|t| t.gems_scored == best_gems)
            .map(|t| t.name.clone())
            .collect()
    }

    // ==================== Queries ====================

    /// All currently legal actions, optionally for one team only.
    ///
    /// Every team may rotate its tiles at any time; only the team whose turn
    /// it is may place. Nothing is legal once the game is over.
    pub fn legal_actions(&self, team: Option<&str>) -> Vec<GameAction> {
        let mut actions = Vec::new();
        if self.is_finished() {
            return actions;
        }

        let empty_cells = self.board.empty_cells();
        for (idx, t) in self.teams.iter().enumerate() {
            if team.is_some_and(|name| name != t.name) {
                continue;
            }
            let mut seen: Vec<&Tile> = Vec::new();
            for tile in t.hand.tiles() {
                if seen.contains(&tile) {
                    continue;
                }
                seen.push(tile);

                actions.push(GameAction::RotateTile {
                    team: t.name.clone(),
                    tile: tile.clone(),
                });
                if idx == self.turn {
                    for cell in &empty_cells {
                        actions.push(GameAction::PlaceTile {
                            team: t.name.clone(),
                            tile: tile.clone(),
                            row: cell.row as i32,
                            column: cell.column as i32,
                        });
                    }
                }
            }
        }

        actions
    }

    /// A read-only view of the game, with hands limited to `team` if given
    pub fn snapshot(&self, team: Option<&str>) -> Result<GameSnapshot, GameError> {
        if let Some(name) = team {
            self.team_index(name)?;
        }

        let hands = self
            .teams
            .iter()
            .filter(|t| team.map_or(true, |name| name == t.name))
            .map(|t| (t.name.clone(), t.hand.tiles().to_vec()))
            .collect();

        Ok(GameSnapshot {
            turn: self.current_team().to_string(),
            teams: self.team_names(),
            winners: self.winners.clone(),
            points: self.teams.iter().map(|t| (t.name.clone(), t.points)).collect(),
            gems_scored: self
                .teams
                .iter()
                .map(|t| (t.name.clone(), t.gems_scored))
                .collect(),
            round: self.round,
            rounds_until_end: self.config.rounds_until_end,
            variant: self.config.variant,
            board: self.board.clone(),
            hands,
            deck_remaining: self.deck.len(),
            actions: self.legal_actions(team),
            history: self.history.clone(),
            message: self.message(),
        })
    }

    /// Short status line for display
    pub fn message(&self) -> String {
        match self.winners.as_slice() {
            [] => format!("{} must place a tile", self.current_team()),
            [winner] => format!("{winner} wins"),
            winners => format!("{} tie", winners.join(", ")),
        }
    }
}

/// Read-only view of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: String,
    pub teams: Vec<String>,
    pub winners: Vec<String>,
    pub points: BTreeMap<String, u32>,
    pub gems_scored: BTreeMap<String, u32>,
    pub round: u32,
    pub rounds_until_end: u32,
    pub variant: Variant,
    pub board: Board,
    pub hands: BTreeMap<String, Vec<Tile>>,
    pub deck_remaining: usize,
    /// Legal actions for the viewer
    pub actions: Vec<GameAction>,
    /// Actions applied so far, in order
    pub history: Vec<LogEntry>,
    pub message: String,
}

impl GameSnapshot {
    /// Serialize the snapshot as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the snapshot as indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GemStatus;
    use crate::tile::DECK_SIZE;

    fn two_teams() -> GameState {
        GameState::new(GameConfig::new(["red", "blue"], 42)).unwrap()
    }

    /// A game whose deck deals `order` first, padded with the standard set
    fn stacked(config: GameConfig, order: &[&str]) -> GameState {
        let mut tiles: Vec<Tile> = order.iter().map(|p| Tile::new(p).unwrap()).collect();
        tiles.extend(Tile::standard_set().into_iter().skip(order.len()));
        GameState::with_deck(config, Deck::from_draw_order(tiles, 0)).unwrap()
    }

    #[test]
    fn test_new_game_deals_hands() {
        let game = two_teams();
        assert_eq!(game.teams.len(), 2);
        assert!(game.teams.iter().all(|t| t.hand.len() == 1));
        assert_eq!(game.deck_remaining(), DECK_SIZE - 2);
        assert_eq!(game.current_team(), "red");
        assert_eq!(game.round, 0);
        assert!(!game.is_finished());
    }

    #[test]
    fn test_large_hands_variant() {
        let config = GameConfig::new(["a", "b", "c", "d"], 9).with_variant(Variant::LargeHands);
        let game = GameState::new(config).unwrap();
        assert!(game.teams.iter().all(|t| t.hand.len() == 3));
        assert_eq!(game.deck_remaining(), DECK_SIZE - 12);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            GameState::new(GameConfig::new(["solo"], 1)).unwrap_err(),
            ConfigError::TooFewTeams(1)
        );
        assert_eq!(
            GameState::new(GameConfig::new(["a", "b", "c", "d", "e"], 1)).unwrap_err(),
            ConfigError::TooManyTeams(5)
        );
        assert_eq!(
            GameState::new(GameConfig::new(["a", "b", "a"], 1)).unwrap_err(),
            ConfigError::DuplicateTeam("a".into())
        );
    }

    #[test]
    fn test_config_from_json() {
        let config = GameConfig::from_json(r#"{"teams":["red","blue"],"seed":5}"#).unwrap();
        assert_eq!(config.variant, Variant::Classic);
        assert_eq!(config.rounds_until_end, 0);

        let config = GameConfig::from_json(
            r#"{"teams":["red","blue"],"seed":5,"variant":"LargeHands","rounds_until_end":3}"#,
        )
        .unwrap();
        assert_eq!(config.variant, Variant::LargeHands);
        assert_eq!(config.rounds_until_end, 3);

        assert!(matches!(
            GameConfig::from_json(r#"{"teams":["red","blue"],"seed":5,"variant":"Huge"}"#),
            Err(ConfigError::MalformedOptions(_))
        ));
        let config =
            GameConfig::from_json(r#"{"teams":["red","blue"],"seed":5,"variant":""}"#).unwrap();
        assert_eq!(config.variant, Variant::Classic);

        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(ConfigError::MalformedOptions(_))
        ));
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("".parse::<Variant>(), Ok(Variant::Classic));
        assert_eq!("LargeHands".parse::<Variant>(), Ok(Variant::LargeHands));
        assert_eq!(
            "Huge".parse::<Variant>(),
            Err(ConfigError::InvalidVariant("Huge".into()))
        );
    }

    #[test]
    fn test_deck_too_small() {
        let deck = Deck::from_draw_order(vec![Tile::new("ABCDEF").unwrap()], 0);
        assert_eq!(
            GameState::with_deck(GameConfig::new(["red", "blue"], 0), deck).unwrap_err(),
            ConfigError::DeckTooSmall {
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_wrong_turn_and_unknown_team() {
        let mut game = stacked(GameConfig::new(["red", "blue"], 0), &["ABCDEF", "ADBFCE"]);
        assert_eq!(
            game.place_tile("blue", "ADBFCE", 2, 2),
            Err(GameError::WrongTurn {
                expected: "red".into(),
                found: "blue".into()
            })
        );
        assert_eq!(
            game.place_tile("green", "ABCDEF", 2, 2),
            Err(GameError::UnknownTeam("green".into()))
        );
        assert_eq!(
            game.rotate_tile("green", "ABCDEF"),
            Err(GameError::UnknownTeam("green".into()))
        );
    }

    #[test]
    fn test_tile_not_in_hand() {
        let mut game = stacked(GameConfig::new(["red", "blue"], 0), &["ABCDEF", "ADBFCE"]);
        assert_eq!(
            game.place_tile("red", "ADBFCE", 2, 2),
            Err(GameError::TileNotInHand("ADBFCE".into()))
        );
        assert_eq!(
            game.rotate_tile("red", "ADBFCE"),
            Err(GameError::TileNotInHand("ADBFCE".into()))
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let mut game = two_teams();
        assert!(matches!(
            game.place_tile("red", "AABBCC", 2, 2),
            Err(GameError::InvalidTilePattern(TileError::InvalidPattern(_)))
        ));
    }

    #[test]
    fn test_rotate_keeps_turn() {
        let mut game = stacked(GameConfig::new(["red", "blue"], 0), &["AFBCDE", "ADBFCE"]);
        let events = game.rotate_tile("blue", "ADBFCE").unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TileRotated {
                team: "blue".into(),
                tile: Tile::new("BECADF").unwrap()
            }]
        );
        assert_eq!(game.current_team(), "red");
        assert_eq!(game.teams[1].hand.tiles()[0].to_string(), "BECADF");
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_failed_placement_leaves_state_unchanged() {
        let mut game = stacked(GameConfig::new(["red", "blue"], 0), &["ABCDEF", "ADBFCE", "AFBCDE"]);
        game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        let before = game.clone();

        assert_eq!(
            game.place_tile("blue", "ADBFCE", 2, 2),
            Err(GameError::Board(BoardError::CellOccupied(Cell::new(2, 2))))
        );
        assert_eq!(
            game.place_tile("blue", "ADBFCE", 9, 0),
            Err(GameError::Board(BoardError::OutOfBounds { row: 9, column: 0 }))
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_placement_any_rotation_placed_as_written() {
        let mut game = stacked(GameConfig::new(["red", "blue"], 0), &["ABCDEF", "ADBFCE"]);
        game.place_tile("red", "BCDEFA", 2, 2).unwrap();
        assert_eq!(
            game.board.tile(Cell::new(2, 2)).map(|t| t.to_string()),
            Some("BCDEFA".to_string())
        );
    }

    #[test]
    fn test_turns_rounds_and_draws() {
        let mut game = stacked(
            GameConfig::new(["red", "blue"], 0),
            &["ABCDEF", "ADBFCE", "AFBCDE", "BECFDA"],
        );
        let events = game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        assert!(events.contains(&GameEvent::TileDrawn { team: "red".into() }));
        assert_eq!(game.current_team(), "blue");
        assert_eq!(game.round, 0);
        assert_eq!(game.teams[0].hand.tiles()[0].to_string(), "AFBCDE");

        let events = game.place_tile("blue", "ADBFCE", 2, 3).unwrap();
        assert!(events.contains(&GameEvent::RoundCompleted { round: 1 }));
        assert_eq!(game.current_team(), "red");
        assert_eq!(game.round, 1);
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_turn_skips_empty_hands() {
        let mut game = stacked(
            GameConfig::new(["red", "blue", "green"], 0),
            &["ABCDEF", "ADBFCE", "AFBCDE"],
        );
        game.teams[1].hand.remove(0);
        let events = game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        assert_eq!(game.current_team(), "green");
        assert!(events.contains(&GameEvent::TurnEnded {
            team: "red".into(),
            next_team: "green".into()
        }));
    }

    #[test]
    fn test_scoring_credits_gateway_owner() {
        // The amber on (8, 4) is routed to the C-D gateway, owned by red in a
        // two-team game, by a tile blue places.
        let mut game = stacked(
            GameConfig::new(["red", "blue"], 0),
            &["CDABEF", "ABCEDF", "BECFDA", "BECFDA"],
        );
        game.place_tile("red", "CDABEF", 7, 4).unwrap();
        let events = game.place_tile("blue", "ABCEDF", 7, 5).unwrap();

        assert!(events.contains(&GameEvent::GemScored {
            gem: 3,
            color: crate::board::GemColor::Amber,
            gateway: 2,
            teams: vec!["red".into()],
            points: 1,
        }));
        assert_eq!(game.teams[0].points, 1);
        assert_eq!(game.teams[0].gems_scored, 1);
        assert_eq!(game.teams[1].points, 0);
        assert_eq!(game.board.gems()[3].status, GemStatus::Scored { gateway: 2 });
    }

    #[test]
    fn test_scoring_credits_every_owner() {
        // With four teams the C-D gateway is shared by teams 0 and 3
        let mut game = stacked(
            GameConfig::new(["a", "b", "c", "d"], 0),
            &["CDABEF", "ABCEDF", "BECFDA", "BECFDA", "BECFDA", "BECFDA"],
        );
        game.place_tile("a", "CDABEF", 7, 4).unwrap();
        game.place_tile("b", "ABCEDF", 7, 5).unwrap();
        let points: Vec<u32> = game.teams.iter().map(|t| t.points).collect();
        assert_eq!(points, vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_round_limit_ends_game() {
        let config = GameConfig::new(["red", "blue"], 0).with_rounds_until_end(1);
        let mut game = stacked(config, &["ABCDEF", "ADBFCE", "AFBCDE", "BECFDA"]);
        game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        assert!(!game.is_finished());
        let events = game.place_tile("blue", "ADBFCE", 2, 3).unwrap();
        assert!(game.is_finished());
        assert_eq!(game.winners, vec!["red".to_string(), "blue".to_string()]);
        assert!(events.contains(&GameEvent::GameFinished {
            winners: vec!["red".into(), "blue".into()]
        }));
        assert_eq!(game.message(), "red, blue tie");

        assert_eq!(game.place_tile("red", "AFBCDE", 3, 3), Err(GameError::GameOver));
        assert_eq!(game.rotate_tile("red", "AFBCDE"), Err(GameError::GameOver));
        assert!(game.legal_actions(None).is_empty());
    }

    #[test]
    fn test_tie_broken_by_gems_scored() {
        let config = GameConfig::new(["red", "blue", "green"], 1).with_rounds_until_end(1);
        let mut game = stacked(config, &["ABCDEF", "ADBFCE", "AFBECD"]);
        for (team, (points, gems)) in game.teams.iter_mut().zip([(6, 2), (6, 3), (4, 4)]) {
            team.points = points;
            team.gems_scored = gems;
        }

        // None of these cells touch a gem, so the scores stay as set
        game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        game.place_tile("blue", "ADBFCE", 2, 3).unwrap();
        assert!(!game.is_finished());
        let events = game.place_tile("green", "AFBECD", 2, 4).unwrap();

        assert_eq!(game.round, 1);
        assert_eq!(game.winners, vec!["blue".to_string()]);
        assert!(events.contains(&GameEvent::GameFinished {
            winners: vec!["blue".into()]
        }));
        assert_eq!(game.message(), "blue wins");
    }

    #[test]
    fn test_equal_points_and_gems_share_the_win() {
        let config = GameConfig::new(["red", "blue", "green"], 1).with_rounds_until_end(1);
        let mut game = stacked(config, &["ABCDEF", "ADBFCE", "AFBECD"]);
        for (team, (points, gems)) in game.teams.iter_mut().zip([(6, 3), (6, 3), (4, 4)]) {
            team.points = points;
            team.gems_scored = gems;
        }

        game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        game.place_tile("blue", "ADBFCE", 2, 3).unwrap();
        game.place_tile("green", "AFBECD", 2, 4).unwrap();
        assert_eq!(game.winners, vec!["red".to_string(), "blue".to_string()]);
    }

    #[test]
    fn test_last_gem_leaving_play_ends_game() {
        let mut game = stacked(
            GameConfig::new(["red", "blue"], 0),
            &["CDABEF", "ABCEDF", "BECFDA", "BECFDA"],
        );
        // Only the amber on (8, 4) is left in play
        for (idx, gem) in game.board.gems_mut().iter_mut().enumerate() {
            if idx != 3 {
                gem.status = GemStatus::Collided;
            }
        }

        game.place_tile("red", "CDABEF", 7, 4).unwrap();
        assert!(!game.is_finished());
        assert_eq!(game.board.gems_still_in_play(), 1);

        let events = game.place_tile("blue", "ABCEDF", 7, 5).unwrap();
        assert_eq!(game.board.gems_still_in_play(), 0);
        assert!(game.is_finished());
        assert_eq!(game.winners, vec!["red".to_string()]);
        assert!(events.contains(&GameEvent::GameFinished {
            winners: vec!["red".into()]
        }));
        assert!(game.teams.iter().all(|t| !t.hand.is_empty()));
    }

    #[test]
    fn test_game_over_checked_before_pattern() {
        let mut game = two_teams();
        game.set_winners(vec!["red".into()]).unwrap();
        assert_eq!(game.rotate_tile("red", "AABBCC"), Err(GameError::GameOver));
        assert_eq!(game.place_tile("red", "AABBCC", 2, 2), Err(GameError::GameOver));
        assert_eq!(game.rotate_tile("green", "AABBCC"), Err(GameError::GameOver));
    }

    #[test]
    fn test_team_checked_before_pattern() {
        let mut game = two_teams();
        assert_eq!(
            game.place_tile("green", "AABBCC", 2, 2),
            Err(GameError::UnknownTeam("green".into()))
        );
        assert_eq!(
            game.rotate_tile("green", "AABBCC"),
            Err(GameError::UnknownTeam("green".into()))
        );
        assert_eq!(
            game.place_tile("blue", "AABBCC", 2, 2),
            Err(GameError::WrongTurn {
                expected: "red".into(),
                found: "blue".into()
            })
        );
        assert!(matches!(
            game.rotate_tile("blue", "AABBCC"),
            Err(GameError::InvalidTilePattern(TileError::InvalidPattern(_)))
        ));
    }

    #[test]
    fn test_set_winners() {
        let mut game = two_teams();
        assert!(matches!(
            game.set_winners(vec!["green".into()]),
            Err(GameError::InvalidActionDetails(_))
        ));
        assert!(!game.is_finished());

        let events = game.set_winners(vec!["blue".into()]).unwrap();
        assert_eq!(events, vec![GameEvent::WinnersSet { winners: vec!["blue".into()] }]);
        assert_eq!(game.message(), "blue wins");

        // The override stays available after the game ends
        game.set_winners(vec!["red".into(), "blue".into()]).unwrap();
        assert_eq!(game.winners.len(), 2);
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_legal_actions() {
        let game = stacked(GameConfig::new(["red", "blue"], 0), &["ABCDEF", "ADBFCE"]);
        let red = game.legal_actions(Some("red"));
        let places = red
            .iter()
            .filter(|a| matches!(a, GameAction::PlaceTile { .. }))
            .count();
        assert_eq!(places, 54);
        assert_eq!(red.len(), 55);

        let blue = game.legal_actions(Some("blue"));
        assert_eq!(
            blue,
            vec![GameAction::RotateTile {
                team: "blue".into(),
                tile: Tile::new("ADBFCE").unwrap()
            }]
        );
        assert_eq!(game.legal_actions(None).len(), 56);
    }

    #[test]
    fn test_snapshot_hides_other_hands() {
        let game = two_teams();
        let full = game.snapshot(None).unwrap();
        assert_eq!(full.hands.len(), 2);
        assert_eq!(full.turn, "red");
        assert_eq!(full.message, "red must place a tile");

        let red = game.snapshot(Some("red")).unwrap();
        assert_eq!(red.hands.keys().collect::<Vec<_>>(), vec!["red"]);
        assert!(red.actions.iter().all(|a| a.team() == Some("red")));

        assert_eq!(
            game.snapshot(Some("green")),
            Err(GameError::UnknownTeam("green".into()))
        );
        assert!(full.to_json().unwrap().contains("\"turn\":\"red\""));
        assert!(full.history.is_empty());
    }

    #[test]
    fn test_snapshot_carries_history() {
        let mut game = stacked(GameConfig::new(["red", "blue"], 0), &["ABCDEF", "ADBFCE"]);
        game.place_tile("red", "ABCDEF", 2, 2).unwrap();
        game.set_winners(vec!["blue".into()]).unwrap();

        let snapshot = game.snapshot(Some("blue")).unwrap();
        assert_eq!(snapshot.history, game.history().to_vec());
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(
            snapshot.history[0],
            LogEntry {
                team: 0,
                action: GameAction::PlaceTile {
                    team: "red".into(),
                    tile: Tile::new("ABCDEF").unwrap(),
                    row: 2,
                    column: 2
                }
            }
        );
    }
}
