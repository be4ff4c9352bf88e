//! Path tiles and the fixed tile catalog.
//!
//! A playable tile joins its six edges into three paths. The paths are written
//! as six edge letters where positions `2k` and `2k + 1` form one path, so
//! `ABCDEF` connects A to B, C to D and E to F.

use crate::hex::Edge;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The five distinct path layouts and how many copies of each are in the deck
pub const CATALOG: [(&str, usize); 5] = [
    ("AFBCDE", 6),
    ("BECFDA", 6),
    ("AFBECD", 14),
    ("ABCEDF", 14),
    ("ADBFCE", 14),
];

/// Total number of playable tiles
pub const DECK_SIZE: usize = 54;

/// Errors produced while building or reading tiles
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TileError {
    #[error("paths {0} are not a valid tile configuration")]
    InvalidPattern(String),

    #[error("edge {0} has no path on this tile")]
    NoSuchEdge(Edge),
}

/// A hex tile with paths running between its edges.
///
/// Treasure tiles are fixed at setup. They list the edges facing the board
/// instead of paths and are never drawn or rotated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Edge labels; consecutive pairs are connected on playable tiles
    paths: Vec<Edge>,
    /// Fixed setup tile
    treasure: bool,
}

impl Tile {
    /// Create a playable tile, checking the layout against the catalog
    pub fn new(paths: &str) -> Result<Self, TileError> {
        let edges = parse_edges(paths).ok_or_else(|| TileError::InvalidPattern(paths.to_string()))?;
        let tile = Self {
            paths: edges,
            treasure: false,
        };
        if !tile.is_valid_shape() {
            return Err(TileError::InvalidPattern(paths.to_string()));
        }
        Ok(tile)
    }

    /// Create a treasure tile from its inward-facing edges.
    ///
    /// Treasure tiles skip catalog validation.
    pub fn treasure(edges: &[Edge]) -> Self {
        Self {
            paths: edges.to_vec(),
            treasure: true,
        }
    }

    /// Whether this is a fixed treasure tile
    pub fn is_treasure(&self) -> bool {
        self.treasure
    }

    /// The edge labels in path order
    pub fn paths(&self) -> &[Edge] {
        &self.paths
    }

    /// Rotate the tile one step clockwise in place
    pub fn rotate_clockwise(&mut self) {
        for edge in &mut self.paths {
            *edge = edge.clockwise();
        }
    }

    /// A copy of this tile rotated one step clockwise
    pub fn rotated(&self) -> Self {
        let mut tile = self.clone();
        tile.rotate_clockwise();
        tile
    }

    /// The edge a gem leaves by after entering through `entry`
    pub fn destination_of(&self, entry: Edge) -> Result<Edge, TileError> {
        if self.treasure {
            return Err(TileError::NoSuchEdge(entry));
        }
        let idx = self
            .paths
            .iter()
            .position(|&e| e == entry)
            .ok_or(TileError::NoSuchEdge(entry))?;
        let partner = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
        self.paths
            .get(partner)
            .copied()
            .ok_or(TileError::NoSuchEdge(entry))
    }

    /// Whether some rotation of this layout is in the catalog.
    ///
    /// Treasure tiles always pass.
    pub fn is_valid_shape(&self) -> bool {
        if self.treasure {
            return true;
        }
        CATALOG.iter().any(|(pattern, _)| {
            parse_edges(pattern)
                .map(|edges| self.same_layout_as(&edges))
                .unwrap_or(false)
        })
    }

    /// Whether `other` is the same piece, in any rotation.
    ///
    /// Swapping the two ends of a path or reordering the paths does not change
    /// the piece, so `ABCDEF`, `BADCFE` and `BCDEFA` all match.
    pub fn is_same_piece(&self, other: &Tile) -> bool {
        if self.treasure || other.treasure {
            return self == other;
        }
        self.same_layout_as(&other.paths)
    }

    fn same_layout_as(&self, edges: &[Edge]) -> bool {
        let Some(target) = path_set(edges) else {
            return false;
        };
        let mut rotated = self.paths.clone();
        for _ in 0..6 {
            if path_set(&rotated).as_ref() == Some(&target) {
                return true;
            }
            for edge in &mut rotated {
                *edge = edge.clockwise();
            }
        }
        false
    }

    /// The full set of playable tiles, unshuffled
    pub fn standard_set() -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(DECK_SIZE);
        for (pattern, copies) in CATALOG {
            let edges = parse_edges(pattern).unwrap_or_default();
            let tile = Tile {
                paths: edges,
                treasure: false,
            };
            tiles.extend(std::iter::repeat(tile).take(copies));
        }
        tiles
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edge in &self.paths {
            write!(f, "{edge}")?;
        }
        Ok(())
    }
}

impl FromStr for Tile {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tile::new(s)
    }
}

/// Parse six distinct edge letters
fn parse_edges(paths: &str) -> Option<Vec<Edge>> {
    let edges: Vec<Edge> = paths.chars().map(Edge::from_char).collect::<Option<_>>()?;
    if edges.len() != 6 {
        return None;
    }
    let mut seen = [false; 6];
    for edge in &edges {
        let idx = edge.index()?;
        if seen[idx] {
            return None;
        }
        seen[idx] = true;
    }
    Some(edges)
}

/// Order-independent form of a path layout: each pair sorted, pairs sorted
fn path_set(edges: &[Edge]) -> Option<[(Edge, Edge); 3]> {
    if edges.len() != 6 {
        return None;
    }
    let mut pairs = [(Edge::A, Edge::A); 3];
    for (slot, chunk) in pairs.iter_mut().zip(edges.chunks(2)) {
        let (a, b) = (chunk[0], chunk[1]);
        *slot = if a <= b { (a, b) } else { (b, a) };
    }
    pairs.sort();
    Some(pairs)
}
