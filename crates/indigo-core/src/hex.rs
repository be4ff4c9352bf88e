//! Hex edges and the fixed diamond-shaped grid.
//!
//! This module provides the geometry everything else is built on:
//! - `Edge`: the six sides of a pointy-top hex cell (plus the centre marker)
//! - `Cell`: a `(row, column)` slot on the board
//! - The static neighbour tables used to walk from one cell to the next
//!
//! The board is a diamond of 9 rows whose widths grow from 5 to 9 and shrink
//! back to 5. Column 0 is always the leftmost cell of its row, so moving up or
//! down a row shifts columns differently above, on and below the middle row.
//!
//! ```text
//!      A  B
//!     /    \
//!  F |      | C
//!     \    /
//!      E  D
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rows on the board
pub const ROWS: usize = 9;

/// Width of each row, top to bottom
pub const ROW_WIDTHS: [usize; ROWS] = [5, 6, 7, 8, 9, 8, 7, 6, 5];

/// Index of the widest row
pub const MIDDLE_ROW: usize = 4;

/// Total number of cells on the board
pub const CELL_COUNT: usize = 61;

/// One side of a hex cell.
///
/// Edges are labelled clockwise starting from the upper-left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Upper-left
    A,
    /// Upper-right
    B,
    /// Right
    C,
    /// Lower-right
    D,
    /// Lower-left
    E,
    /// Left
    F,
    /// Every side of the central treasure tile at once
    Special,
}

impl Edge {
    /// The six real edges in clockwise order starting from A
    pub const ALL: [Edge; 6] = [Edge::A, Edge::B, Edge::C, Edge::D, Edge::E, Edge::F];

    /// Position of this edge in clockwise order, `None` for `Special`
    pub const fn index(self) -> Option<usize> {
        match self {
            Edge::A => Some(0),
            Edge::B => Some(1),
            Edge::C => Some(2),
            Edge::D => Some(3),
            Edge::E => Some(4),
            Edge::F => Some(5),
            Edge::Special => None,
        }
    }

    /// The next edge clockwise. `Special` maps to itself.
    pub fn clockwise(self) -> Edge {
        match self.index() {
            Some(i) => Edge::ALL[(i + 1) % 6],
            None => Edge::Special,
        }
    }

    /// The edge on the far side of the cell. `Special` maps to itself.
    pub fn opposite(self) -> Edge {
        match self.index() {
            Some(i) => Edge::ALL[(i + 3) % 6],
            None => Edge::Special,
        }
    }

    /// Parse a single edge letter
    pub fn from_char(c: char) -> Option<Edge> {
        match c {
            'A' => Some(Edge::A),
            'B' => Some(Edge::B),
            'C' => Some(Edge::C),
            'D' => Some(Edge::D),
            'E' => Some(Edge::E),
            'F' => Some(Edge::F),
            _ => None,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Edge::A => "A",
            Edge::B => "B",
            Edge::C => "C",
            Edge::D => "D",
            Edge::E => "E",
            Edge::F => "F",
            Edge::Special => "Special",
        };
        f.write_str(label)
    }
}

/// A slot on the board. `(0, 0)` is the upper-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
}

impl Cell {
    /// Create a new cell coordinate
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Convert signed coordinates, returning `None` when off the board
    pub fn checked(row: i32, column: i32) -> Option<Cell> {
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        let width = *ROW_WIDTHS.get(row)?;
        (column < width).then_some(Cell { row, column })
    }

    /// Every cell on the board, row by row
    pub fn all() -> impl Iterator<Item = Cell> {
        ROW_WIDTHS
            .iter()
            .enumerate()
            .flat_map(|(row, &width)| (0..width).map(move |column| Cell::new(row, column)))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Neighbour offsets for edges A..F on rows above the middle row
const UPPER_OFFSETS: [(i32, i32); 6] = [(-1, -1), (-1, 0), (0, 1), (1, 1), (1, 0), (0, -1)];

/// Neighbour offsets for edges A..F on the middle row
const MIDDLE_OFFSETS: [(i32, i32); 6] = [(-1, -1), (-1, 0), (0, 1), (1, 0), (1, -1), (0, -1)];

/// Neighbour offsets for edges A..F on rows below the middle row
const LOWER_OFFSETS: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, 1), (1, 0), (1, -1), (0, -1)];

fn offsets_for_row(row: usize) -> &'static [(i32, i32); 6] {
    match row.cmp(&MIDDLE_ROW) {
        std::cmp::Ordering::Less => &UPPER_OFFSETS,
        std::cmp::Ordering::Equal => &MIDDLE_OFFSETS,
        std::cmp::Ordering::Greater => &LOWER_OFFSETS,
    }
}

/// The cell reached by leaving `cell` through `edge`, together with the edge
/// that neighbour is entered by.
///
/// Returns `None` when the neighbour is off the board or `edge` is `Special`.
pub fn adjacent_cell(cell: Cell, edge: Edge) -> Option<(Cell, Edge)> {
    let index = edge.index()?;
    let (dr, dc) = offsets_for_row(cell.row)[index];
    let row = i32::try_from(cell.row).ok()? + dr;
    let column = i32::try_from(cell.column).ok()? + dc;
    Cell::checked(row, column).map(|neighbor| (neighbor, edge.opposite()))
}
