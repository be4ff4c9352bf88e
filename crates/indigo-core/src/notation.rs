//! Compact text log of a game, used to store and replay matches.
//!
//! A log starts with tag lines describing the setup, then a blank line, then
//! one whitespace separated token per action:
//!
//! ```text
//! [Game "Indigo"]
//! [Teams "red, blue"]
//! [Seed "1696338136223"]
//!
//! 0p&8.3.ADBFCE 1p&8.1.FEABCD 0w&0
//! ```
//!
//! A token is the acting team's index, the action key (`p` to place a tile,
//! `w` to set winners) and optional `&`-prefixed details joined by `.`.
//! Placements carry `row.column.pattern`; winner tokens carry team indices.

use crate::actions::GameAction;
use crate::game::{ConfigError, GameConfig, GameError, GameState, Variant};
use crate::player::Deck;
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Value of the `Game` tag
pub const GAME_KEY: &str = "Indigo";

const PLACE_KEY: char = 'p';
const WINNERS_KEY: char = 'w';

/// Errors reading or replaying a log
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NotationError {
    #[error("malformed tag line {0:?}")]
    MalformedTag(String),

    #[error("missing {0} tag")]
    MissingTag(String),

    #[error("log is for {0}, not Indigo")]
    WrongGame(String),

    #[error("invalid {tag} value {value:?}")]
    InvalidTagValue { tag: String, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("malformed action token {0:?}")]
    MalformedToken(String),

    #[error("unknown action key {0:?}")]
    UnknownAction(char),

    #[error("team index {0} out of range")]
    TeamOutOfRange(usize),

    #[error("invalid details in {token:?}: {reason}")]
    InvalidDetails { token: String, reason: String },

    #[error("action {index} rejected: {error}")]
    Rejected { index: usize, error: GameError },
}

/// One recorded action and the index of the team that took it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub team: usize,
    pub action: GameAction,
}

/// A parsed log: the game setup and its actions in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub config: GameConfig,
    pub entries: Vec<LogEntry>,
}

impl ReplayLog {
    /// Rebuild the game from its seed by applying every action in order
    pub fn replay(&self) -> Result<GameState, NotationError> {
        let game = GameState::new(self.config.clone())?;
        self.apply_entries(game)
    }

    /// Rebuild the game dealing from `deck` instead of the seeded deck
    pub fn replay_with_deck(&self, deck: Deck) -> Result<GameState, NotationError> {
        let game = GameState::with_deck(self.config.clone(), deck)?;
        self.apply_entries(game)
    }

    fn apply_entries(&self, mut game: GameState) -> Result<GameState, NotationError> {
        for (index, entry) in self.entries.iter().enumerate() {
            game.apply_action(entry.action.clone())
                .map_err(|error| NotationError::Rejected { index, error })?;
        }
        debug!(actions = self.entries.len(), "log replayed");
        Ok(game)
    }

    fn team_name(&self, index: usize) -> Result<String, NotationError> {
        self.config
            .teams
            .get(index)
            .cloned()
            .ok_or(NotationError::TeamOutOfRange(index))
    }

    /// Token for one entry; rotations only change a hand and are not logged
    fn encode(&self, entry: &LogEntry) -> Option<String> {
        match &entry.action {
            GameAction::PlaceTile {
                tile, row, column, ..
            } => Some(format!("{}{PLACE_KEY}&{row}.{column}.{tile}", entry.team)),
            GameAction::SetWinners { winners } => {
                let indices: Vec<String> = winners
                    .iter()
                    .filter_map(|w| self.config.teams.iter().position(|t| t == w))
                    .map(|i| i.to_string())
                    .collect();
                if indices.is_empty() {
                    Some(format!("{}{WINNERS_KEY}", entry.team))
                } else {
                    Some(format!("{}{WINNERS_KEY}&{}", entry.team, indices.join(".")))
                }
            }
            GameAction::RotateTile { .. } => None,
        }
    }

    fn parse_token(&self, token: &str) -> Result<LogEntry, NotationError> {
        let malformed = || NotationError::MalformedToken(token.to_string());

        let digits = token.chars().take_while(char::is_ascii_digit).count();
        let team: usize = token[..digits].parse().map_err(|_| malformed())?;
        let mut rest = token[digits..].chars();
        let key = rest.next().ok_or_else(malformed)?;
        let rest = rest.as_str();

        let details: Vec<&str> = match rest.strip_prefix('&') {
            Some(details) => details.split('.').collect(),
            None if rest.is_empty() => Vec::new(),
            None => return Err(malformed()),
        };
        let invalid = |reason: String| NotationError::InvalidDetails {
            token: token.to_string(),
            reason,
        };

        let team_name = self.team_name(team)?;
        let action = match key {
            PLACE_KEY => {
                let [row, column, pattern] = details.as_slice() else {
                    return Err(invalid(format!("expected 3 details, found {}", details.len())));
                };
                GameAction::PlaceTile {
                    team: team_name,
                    tile: Tile::new(pattern).map_err(|e| invalid(e.to_string()))?,
                    row: row.parse().map_err(|_| invalid(format!("bad row {row:?}")))?,
                    column: column
                        .parse()
                        .map_err(|_| invalid(format!("bad column {column:?}")))?,
                }
            }
            WINNERS_KEY => {
                let winners = details
                    .iter()
                    .map(|d| {
                        let idx: usize = d.parse().map_err(|_| invalid(format!("bad team {d:?}")))?;
                        self.team_name(idx)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                GameAction::SetWinners { winners }
            }
            other => return Err(NotationError::UnknownAction(other)),
        };

        Ok(LogEntry { team, action })
    }
}

impl fmt::Display for ReplayLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Game \"{GAME_KEY}\"]")?;
        writeln!(f, "[Teams \"{}\"]", self.config.teams.join(", "))?;
        writeln!(f, "[Seed \"{}\"]", self.config.seed)?;
        if self.config.variant != Variant::Classic {
            writeln!(f, "[Variant \"{}\"]", self.config.variant)?;
        }
        if self.config.rounds_until_end > 0 {
            writeln!(f, "[RoundsUntilEnd \"{}\"]", self.config.rounds_until_end)?;
        }
        writeln!(f)?;

        let tokens: Vec<String> = self.entries.iter().filter_map(|e| self.encode(e)).collect();
        write!(f, "{}", tokens.join(" "))
    }
}

impl FromStr for ReplayLog {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut game = None;
        let mut teams = None;
        let mut seed = None;
        let mut variant = Variant::Classic;
        let mut rounds_until_end = 0;
        let mut body = Vec::new();

        for line in s.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !line.starts_with('[') {
                body.extend(line.split_whitespace());
                continue;
            }
            let (tag, value) = parse_tag(line)?;
            let invalid = || NotationError::InvalidTagValue {
                tag: tag.to_string(),
                value: value.to_string(),
            };
            match tag {
                "Game" => game = Some(value.to_string()),
                "Teams" => {
                    teams = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(String::from)
                            .collect::<Vec<_>>(),
                    )
                }
                "Seed" => seed = Some(value.parse::<u64>().map_err(|_| invalid())?),
                "Variant" => variant = value.parse()?,
                "RoundsUntilEnd" => rounds_until_end = value.parse().map_err(|_| invalid())?,
                // Unknown tags such as dates or event names are ignored
                _ => {}
            }
        }

        let game = game.ok_or_else(|| NotationError::MissingTag("Game".into()))?;
        if game != GAME_KEY {
            return Err(NotationError::WrongGame(game));
        }
        let teams = teams.ok_or_else(|| NotationError::MissingTag("Teams".into()))?;
        let seed = seed.ok_or_else(|| NotationError::MissingTag("Seed".into()))?;

        let config = GameConfig {
            teams,
            variant,
            seed,
            rounds_until_end,
        };
        config.validate()?;

        let mut log = ReplayLog {
            config,
            entries: Vec::with_capacity(body.len()),
        };
        for token in body {
            let entry = log.parse_token(token)?;
            log.entries.push(entry);
        }
        Ok(log)
    }
}

/// Split `[Key "Value"]` into its key and unquoted value
fn parse_tag(line: &str) -> Result<(&str, &str), NotationError> {
    let malformed = || NotationError::MalformedTag(line.to_string());
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (key, value) = inner.split_once(' ').ok_or_else(malformed)?;
    let value = value
        .trim()
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(malformed)?;
    Ok((key, value))
}

impl GameState {
    /// The log of every placement and winner override so far
    pub fn to_log(&self) -> ReplayLog {
        ReplayLog {
            config: self.config().clone(),
            entries: self.history().to_vec(),
        }
    }
}
