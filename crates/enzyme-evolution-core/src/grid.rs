use crate::constants::MAX_GRID_EXTENT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row/column coordinates of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// One of the eight Chebyshev-1 neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    /// Scan order used when the arbiter collects free neighbors.
    pub const ALL: [Direction; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::West,
        Self::East,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
    ];

    /// (row, column) offset. North is the row above.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Self::NorthWest => (-1, -1),
            Self::North => (-1, 0),
            Self::NorthEast => (-1, 1),
            Self::West => (0, -1),
            Self::East => (0, 1),
            Self::SouthWest => (1, -1),
            Self::South => (1, 0),
            Self::SouthEast => (1, 1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NorthWest => "NW",
            Self::North => "N",
            Self::NorthEast => "NE",
            Self::West => "W",
            Self::East => "E",
            Self::SouthWest => "SW",
            Self::South => "S",
            Self::SouthEast => "SE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extent of the toroidal grid. Rows and columns wrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GridDims {
    rows: usize,
    columns: usize,
}

impl GridDims {
    /// Both extents must lie in `1..=MAX_GRID_EXTENT`; config validation enforces this before
    /// a grid is built.
    pub fn new(rows: usize, columns: usize) -> Self {
        assert!(
            (1..=MAX_GRID_EXTENT).contains(&rows) && (1..=MAX_GRID_EXTENT).contains(&columns),
            "grid extent out of range: {rows}x{columns}"
        );
        Self { rows, columns }
    }

    pub fn rows(self) -> usize {
        self.rows
    }

    pub fn columns(self) -> usize {
        self.columns
    }

    pub fn len(self) -> usize {
        self.rows * self.columns
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn contains(self, address: CellAddress) -> bool {
        address.row < self.rows && address.column < self.columns
    }

    /// Row-major index of `address`.
    pub fn index(self, address: CellAddress) -> usize {
        debug_assert!(self.contains(address), "address {address} outside grid");
        address.row * self.columns + address.column
    }

    pub fn address(self, index: usize) -> CellAddress {
        debug_assert!(index < self.len(), "index {index} outside grid");
        CellAddress::new(index / self.columns, index % self.columns)
    }

    /// Neighbor of `address` in `direction`, wrapping at the edges.
    pub fn neighbor(self, address: CellAddress, direction: Direction) -> CellAddress {
        let (dr, dc) = direction.delta();
        CellAddress::new(
            wrap(address.row, dr, self.rows),
            wrap(address.column, dc, self.columns),
        )
    }

    /// All eight neighbors in [`Direction::ALL`] order.
    pub fn neighbors(self, address: CellAddress) -> [(Direction, CellAddress); 8] {
        Direction::ALL.map(|direction| (direction, self.neighbor(address, direction)))
    }

    /// Every address in row-major order.
    pub fn addresses(self) -> impl Iterator<Item = CellAddress> {
        (0..self.len()).map(move |i| self.address(i))
    }
}

fn wrap(coordinate: usize, delta: isize, extent: usize) -> usize {
    // Extents are bounded by MAX_GRID_EXTENT so the casts cannot overflow.
    (coordinate as isize + delta).rem_euclid(extent as isize) as usize
}
