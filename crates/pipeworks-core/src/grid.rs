//! Grid coordinates and the six axis-aligned directions.
//!
//! Directions carry a fixed index (`Down, Up, North, South, West, East` =
//! `0..6`). That index is what the flow scheduler rotates over, so the order
//! is part of the persisted format and must not change.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GridPosition
// ---------------------------------------------------------------------------

/// A cell in the voxel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighboring cell one step in `direction`.
    pub fn offset(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// All six neighbors paired with the direction that reaches them.
    pub fn neighbors(self) -> impl Iterator<Item = (Direction, GridPosition)> {
        Direction::ALL.into_iter().map(move |d| (d, self.offset(d)))
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the six faces of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Number of directions.
    pub const COUNT: usize = 6;

    /// All directions in canonical index order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Canonical index in `0..6`.
    pub const fn index(self) -> usize {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
            Direction::North => 2,
            Direction::South => 3,
            Direction::West => 4,
            Direction::East => 5,
        }
    }

    /// Direction for a canonical index. Wraps modulo 6.
    pub const fn from_index(index: usize) -> Direction {
        Direction::ALL[index % Direction::COUNT]
    }

    /// Unit offset `(dx, dy, dz)`.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}

// ---------------------------------------------------------------------------
// DirectionSet
// ---------------------------------------------------------------------------

/// A set of directions packed into the low six bits of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    const MASK: u8 = 0b0011_1111;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::MASK)
    }

    /// Reconstruct from raw bits. Bits above the sixth are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & (1 << direction.index()) != 0
    }

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= 1 << direction.index();
    }

    pub fn remove(&mut self, direction: Direction) {
        self.0 &= !(1 << direction.index());
    }

    pub fn set(&mut self, direction: Direction, value: bool) {
        if value {
            self.insert(direction);
        } else {
            self.remove(direction);
        }
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.insert(direction);
        self
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate contained directions in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::empty();
        for d in iter {
            set.insert(d);
        }
        set
    }
}
