//! Diamond-grid geometry. Maps are 14x20 grids of 560 cells addressed by a
//! linear id; pathfinding and direction math work in a rotated coordinate
//! frame where the diamond becomes axis-aligned. In that frame the four
//! "orthogonal" unit steps are the on-screen diagonals and vice versa.

pub const MAP_WIDTH: i32 = 14;
pub const MAP_HEIGHT: i32 = 20;
pub const CELL_COUNT: i32 = MAP_WIDTH * MAP_HEIGHT * 2;

/// A position in the rotated coordinate frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        GridPoint { x, y }
    }
}

/// Compass direction of a single step, numbered clockwise from east.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Direction {
    East = 0,
    SouthEast = 1,
    South = 2,
    SouthWest = 3,
    West = 4,
    NorthWest = 5,
    North = 6,
    NorthEast = 7,
}

impl Direction {
    /// Total conversion from the low three bits of an index.
    pub fn from_index(index: i32) -> Direction {
        match index & 7 {
            0 => Direction::East,
            1 => Direction::SouthEast,
            2 => Direction::South,
            3 => Direction::SouthWest,
            4 => Direction::West,
            5 => Direction::NorthWest,
            6 => Direction::North,
            _ => Direction::NorthEast,
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }
}

/// Whether `(x, y)` falls inside the diamond covered by the cell grid.
pub fn is_in_map(x: i32, y: i32) -> bool {
    x + y >= 0 && x - y >= 0 && x - y < MAP_HEIGHT * 2 && x + y < MAP_WIDTH * 2
}

/// Linear cell id for a coordinate pair, or `None` outside the grid.
pub fn cell_from_coord(point: GridPoint) -> Option<i32> {
    if !is_in_map(point.x, point.y) {
        return None;
    }
    Some((point.x - point.y) * MAP_WIDTH + point.y + (point.x - point.y) / 2)
}

/// Rotated-frame coordinates of a cell id. Total for ids in `0..CELL_COUNT`.
pub fn coord_from_cell(cell_id: i32) -> GridPoint {
    let row = cell_id / MAP_WIDTH;
    let offset = (row + 1) / 2;
    let column = cell_id - row * MAP_WIDTH;
    GridPoint {
        x: offset + column,
        y: column - (row - offset),
    }
}

pub fn is_valid_cell(cell_id: i32) -> bool {
    (0..CELL_COUNT).contains(&cell_id)
}

/// Step distance between two cells: coordinate deltas accumulate, so this is
/// Manhattan distance in the rotated frame.
pub fn distance(a: i32, b: i32) -> i32 {
    let pa = coord_from_cell(a);
    let pb = coord_from_cell(b);
    (pa.x - pb.x).abs() + (pa.y - pb.y).abs()
}

/// Straight-line distance between two cells in the rotated frame.
pub fn euclidean_distance(a: GridPoint, b: GridPoint) -> f64 {
    let dx = f64::from(a.x - b.x);
    let dy = f64::from(a.y - b.y);
    (dx * dx + dy * dy).sqrt()
}

/// Direction from `from` to `to` when the pair lies on one of the eight
/// exact rays; `None` otherwise. Orthogonal rays win over diagonal ones.
pub fn exact_direction(from: GridPoint, to: GridPoint) -> Option<Direction> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }
    if dy == 0 {
        return Some(if dx < 0 {
            Direction::NorthWest
        } else {
            Direction::SouthEast
        });
    }
    if dx == 0 {
        return Some(if dy < 0 {
            Direction::SouthWest
        } else {
            Direction::NorthEast
        });
    }
    if dx == -dy {
        return Some(if dx < 0 {
            Direction::North
        } else {
            Direction::South
        });
    }
    if dx == dy {
        return Some(if dx < 0 {
            Direction::West
        } else {
            Direction::East
        });
    }
    None
}
