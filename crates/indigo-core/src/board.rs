//! Game board representation: tile slots, gems and gateways.
//!
//! This module contains:
//! - Gem colors, point values and per-gem status
//! - The six gateways and their per-team-count ownership tables
//! - Tile placement on the diamond grid
//! - Gem propagation after each placement

use crate::hex::{adjacent_cell, Cell, Edge, CELL_COUNT, ROW_WIDTHS};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

/// The central treasure cell, surrounded by six neighbours
pub const CENTRE: Cell = Cell::new(4, 4);

/// Upper bound on propagation passes for a single placement.
///
/// A gem walk can never revisit a spot, so this is never reached on a
/// consistent board.
const MAX_PASSES: usize = CELL_COUNT * 6;

/// Fixed treasure tiles: location and inward-facing edges
const TREASURE_TILES: [(Cell, &[Edge]); 7] = [
    (Cell::new(0, 0), &[Edge::C, Edge::E, Edge::D]),
    (Cell::new(0, 4), &[Edge::D, Edge::F, Edge::E]),
    (Cell::new(4, 8), &[Edge::A, Edge::E, Edge::F]),
    (Cell::new(8, 4), &[Edge::B, Edge::F, Edge::A]),
    (Cell::new(8, 0), &[Edge::A, Edge::C, Edge::B]),
    (Cell::new(4, 0), &[Edge::B, Edge::D, Edge::C]),
    (CENTRE, &[Edge::Special]),
];

/// Starting gems. Emeralds precede the Sapphire so it leaves the centre last.
const INITIAL_GEMS: [(GemColor, Cell, Edge); 12] = [
    (GemColor::Amber, Cell::new(0, 0), Edge::D),
    (GemColor::Amber, Cell::new(0, 4), Edge::E),
    (GemColor::Amber, Cell::new(4, 8), Edge::F),
    (GemColor::Amber, Cell::new(8, 4), Edge::A),
    (GemColor::Amber, Cell::new(8, 0), Edge::B),
    (GemColor::Amber, Cell::new(4, 0), Edge::C),
    (GemColor::Emerald, CENTRE, Edge::Special),
    (GemColor::Emerald, CENTRE, Edge::Special),
    (GemColor::Emerald, CENTRE, Edge::Special),
    (GemColor::Emerald, CENTRE, Edge::Special),
    (GemColor::Emerald, CENTRE, Edge::Special),
    (GemColor::Sapphire, CENTRE, Edge::Special),
];

/// The six gateways around the perimeter, clockwise from the top
pub const GATEWAYS: [Gateway; 6] = [
    Gateway {
        edges: [Edge::A, Edge::B],
        cells: [Cell::new(0, 1), Cell::new(0, 2), Cell::new(0, 3)],
    },
    Gateway {
        edges: [Edge::B, Edge::C],
        cells: [Cell::new(1, 5), Cell::new(2, 6), Cell::new(3, 7)],
    },
    Gateway {
        edges: [Edge::C, Edge::D],
        cells: [Cell::new(5, 7), Cell::new(6, 6), Cell::new(7, 5)],
    },
    Gateway {
        edges: [Edge::D, Edge::E],
        cells: [Cell::new(8, 3), Cell::new(8, 2), Cell::new(8, 1)],
    },
    Gateway {
        edges: [Edge::E, Edge::F],
        cells: [Cell::new(7, 0), Cell::new(6, 0), Cell::new(5, 0)],
    },
    Gateway {
        edges: [Edge::F, Edge::A],
        cells: [Cell::new(3, 0), Cell::new(2, 0), Cell::new(1, 0)],
    },
];

// Team indices owning each gateway, by number of teams
const OWNERS_2: [&[usize]; 6] = [&[0], &[1], &[0], &[1], &[0], &[1]];
const OWNERS_3: [&[usize]; 6] = [&[0], &[0, 1], &[2], &[2, 0], &[1], &[1, 2]];
const OWNERS_4: [&[usize]; 6] = [&[0, 1], &[1, 2], &[0, 3], &[3, 1], &[2, 0], &[2, 3]];

/// Gem colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemColor {
    /// Starts on the outer treasure tiles
    Amber,
    /// Starts on the centre
    Emerald,
    /// Starts on the centre and leaves it last
    Sapphire,
}

impl GemColor {
    /// Points credited to each owner of the gateway the gem reaches
    pub fn points(&self) -> u32 {
        match self {
            GemColor::Amber => 1,
            GemColor::Emerald => 2,
            GemColor::Sapphire => 3,
        }
    }
}

/// Where a gem stands in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GemStatus {
    /// Still travelling
    #[default]
    InPlay,
    /// Removed after meeting another gem
    Collided,
    /// Reached the gateway with this index
    Scored { gateway: usize },
}

/// A gem sitting on the edge of a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gem {
    pub color: GemColor,
    pub cell: Cell,
    /// The edge the gem rests on and will leave by
    pub edge: Edge,
    pub status: GemStatus,
}

impl Gem {
    fn new(color: GemColor, cell: Cell, edge: Edge) -> Self {
        Self {
            color,
            cell,
            edge,
            status: GemStatus::InPlay,
        }
    }

    /// Whether the gem can still move
    pub fn is_in_play(&self) -> bool {
        self.status == GemStatus::InPlay
    }

    /// The gateway this gem scored at, if any
    pub fn gateway(&self) -> Option<usize> {
        match self.status {
            GemStatus::Scored { gateway } => Some(gateway),
            _ => None,
        }
    }
}

/// A scoring exit on the board perimeter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    /// The two outward edges gems leave through
    pub edges: [Edge; 2],
    /// The three border cells along this gateway
    pub cells: [Cell; 3],
}

impl Gateway {
    /// Whether a gem resting at `edge` of `cell` has reached this gateway
    pub fn accepts(&self, cell: Cell, edge: Edge) -> bool {
        self.cells.contains(&cell) && self.edges.contains(&edge)
    }
}

/// Team indices owning `gateway` in a game with `team_count` teams.
///
/// Returns an empty slice for unsupported team counts or gateway indices.
pub fn gateway_owners(team_count: usize, gateway: usize) -> &'static [usize] {
    let table = match team_count {
        2 => &OWNERS_2,
        3 => &OWNERS_3,
        4 => &OWNERS_4,
        _ => return &[],
    };
    table.get(gateway).copied().unwrap_or(&[])
}

/// Errors from placing tiles on the board
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("position ({row}, {column}) is out of bounds")]
    OutOfBounds { row: i32, column: i32 },

    #[error("tile already exists at {0}")]
    CellOccupied(Cell),
}

/// A single step of a gem across one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemHop {
    pub gem: usize,
    pub cell: Cell,
    pub edge: Edge,
}

/// Everything that happened to the gems after one placement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Gems that moved in the first pass
    pub moved: Vec<usize>,
    /// Every hop, in order
    pub hops: Vec<GemHop>,
    /// Pairs of gems removed by meeting each other
    pub collisions: Vec<(usize, usize)>,
    /// Gems that reached a gateway
    pub scored: Vec<usize>,
}

/// The complete game board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Tile slots, one row per board row
    tiles: Vec<Vec<Option<Tile>>>,
    /// All gems, in setup order
    gems: Vec<Gem>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create the starting board: treasure tiles placed and gems on them
    pub fn new() -> Self {
        let mut tiles: Vec<Vec<Option<Tile>>> =
            ROW_WIDTHS.iter().map(|&width| vec![None; width]).collect();
        for (cell, edges) in TREASURE_TILES {
            tiles[cell.row][cell.column] = Some(Tile::treasure(edges));
        }
        let gems = INITIAL_GEMS
            .iter()
            .map(|&(color, cell, edge)| Gem::new(color, cell, edge))
            .collect();
        Self { tiles, gems }
    }

    // ==================== Query Methods ====================

    /// The tile at a cell, if one has been placed
    pub fn tile(&self, cell: Cell) -> Option<&Tile> {
        self.tiles.get(cell.row)?.get(cell.column)?.as_ref()
    }

    /// All tile slots, row by row
    pub fn rows(&self) -> &[Vec<Option<Tile>>] {
        &self.tiles
    }

    /// All gems in setup order
    pub fn gems(&self) -> &[Gem] {
        &self.gems
    }

    #[cfg(test)]
    pub(crate) fn gems_mut(&mut self) -> &mut [Gem] {
        &mut self.gems
    }

    /// Cells that do not hold a tile yet
    pub fn empty_cells(&self) -> Vec<Cell> {
        Cell::all().filter(|&cell| self.tile(cell).is_none()).collect()
    }

    /// Number of gems that have neither collided nor scored
    pub fn gems_still_in_play(&self) -> usize {
        self.gems.iter().filter(|g| g.is_in_play()).count()
    }

    /// Check that a tile could be placed at `(row, column)` without placing it
    pub fn check_placement(&self, row: i32, column: i32) -> Result<Cell, BoardError> {
        let cell = Cell::checked(row, column).ok_or(BoardError::OutOfBounds { row, column })?;
        if self.tile(cell).is_some() {
            return Err(BoardError::CellOccupied(cell));
        }
        Ok(cell)
    }

    // ==================== Placement ====================

    /// Place a tile. Placed tiles are never replaced or removed.
    pub fn place(&mut self, tile: Tile, row: i32, column: i32) -> Result<Cell, BoardError> {
        let cell = self.check_placement(row, column)?;
        self.tiles[cell.row][cell.column] = Some(tile);
        Ok(cell)
    }

    /// Move gems after a tile was placed at `placed`, until nothing moves.
    ///
    /// The first pass may also release one gem from the centre onto the new
    /// tile, when that tile borders the centre.
    pub fn propagate_gems(&mut self, placed: Cell) -> Propagation {
        let mut report = Propagation::default();
        report.moved = self.propagation_pass(Some(placed), &mut report);

        let mut moving = !report.moved.is_empty();
        let mut passes = 1;
        while moving {
            if passes >= MAX_PASSES {
                warn!(passes, "gem propagation did not settle, stopping");
                break;
            }
            moving = !self.propagation_pass(None, &mut report).is_empty();
            passes += 1;
        }

        report
    }

    /// Advance every gem in play by at most one tile. Returns the gems moved.
    fn propagation_pass(&mut self, placed: Option<Cell>, report: &mut Propagation) -> Vec<usize> {
        let mut moved = Vec::new();
        let mut bridge = placed;

        for idx in 0..self.gems.len() {
            if !self.gems[idx].is_in_play() {
                continue;
            }
            let Some((cell, edge)) = self.next_hop(&self.gems[idx], bridge) else {
                continue;
            };
            if self.gems[idx].edge == Edge::Special {
                // Only one gem leaves the centre per placement
                bridge = None;
            }

            let collided_with = self.occupant(cell, edge, idx);
            let gem = &mut self.gems[idx];
            gem.cell = cell;
            gem.edge = edge;
            moved.push(idx);

            if let Some(other) = collided_with {
                gem.status = GemStatus::Collided;
                self.gems[other].status = GemStatus::Collided;
                trace!(gem = idx, other, %cell, %edge, "gems collided");
                report.collisions.push((idx, other));
                continue;
            }

            trace!(gem = idx, %cell, %edge, "gem moved");
            report.hops.push(GemHop { gem: idx, cell, edge });

            if let Some(gateway) = GATEWAYS.iter().position(|g| g.accepts(cell, edge)) {
                gem.status = GemStatus::Scored { gateway };
                trace!(gem = idx, gateway, "gem reached gateway");
                report.scored.push(idx);
            }
        }

        moved
    }

    /// Where a gem would move next, or `None` if it stays put
    fn next_hop(&self, gem: &Gem, bridge: Option<Cell>) -> Option<(Cell, Edge)> {
        let (cell, entry) = if gem.edge == Edge::Special {
            let placed = bridge?;
            Edge::ALL
                .iter()
                .filter_map(|&e| adjacent_cell(gem.cell, e))
                .find(|&(neighbor, _)| neighbor == placed)?
        } else {
            adjacent_cell(gem.cell, gem.edge)?
        };
        let exit = self.tile(cell)?.destination_of(entry).ok()?;
        Some((cell, exit))
    }

    /// An in-play gem other than `except` at the given spot.
    ///
    /// A spot is a shared border, so the same spot seen from the neighbouring
    /// cell counts too.
    fn occupant(&self, cell: Cell, edge: Edge, except: usize) -> Option<usize> {
        let mirror = adjacent_cell(cell, edge);
        self.gems.iter().enumerate().find_map(|(idx, gem)| {
            let here = (gem.cell == cell && gem.edge == edge)
                || mirror == Some((gem.cell, gem.edge));
            (idx != except && gem.is_in_play() && here).then_some(idx)
        })
    }
}
