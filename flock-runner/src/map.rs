use std::str::FromStr;

use flock_core::pathfinding::Graph;
use flock_core::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} is {found} cells wide, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown cell {found:?} at row {row}, column {column}")]
    UnknownCell { row: usize, column: usize, found: char },
    #[error("invalid point {0:?}, expected x,y")]
    InvalidPoint(String),
    #[error("invalid obstacle {0:?}, expected x,y,radius")]
    InvalidObstacle(String),
}

/// Rectangular walkability grid read from rows of `.` (open) and `#`
/// (blocked). Blank lines are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMap {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl GridMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_walkable(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn to_graph(&self, diagonal: bool) -> Graph {
        Graph::grid(self.width, self.height, diagonal, |x, y| self.is_walkable(x, y))
    }

    /// Grid cell of a node in a graph built by [`GridMap::to_graph`]
    pub fn cell_of(&self, id: NodeId) -> (usize, usize) {
        (id.index() % self.width, id.index() / self.width)
    }

    /// The map with `path` cells drawn as `*`
    pub fn render(&self, path: &[(usize, usize)]) -> String {
        let mut rows: Vec<Vec<char>> = (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.is_walkable(x, y) { '.' } else { '#' })
                    .collect()
            })
            .collect();
        for &(x, y) in path {
            rows[y][x] = '*';
        }

        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in rows {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

impl FromStr for GridMap {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut width = None;
        let mut cells = Vec::new();
        let mut height = 0;

        for line in s.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            let row = height;
            let mut count = 0;
            for (column, c) in line.chars().enumerate() {
                cells.push(match c {
                    '.' => true,
                    '#' => false,
                    found => return Err(MapError::UnknownCell { row, column, found }),
                });
                count += 1;
            }

            let expected = *width.get_or_insert(count);
            if count != expected {
                return Err(MapError::Ragged { row, expected, found: count });
            }
            height += 1;
        }

        let width = width.ok_or(MapError::Empty)?;
        Ok(Self { width, height, cells })
    }
}

/// Parse a grid cell given as `x,y`
pub fn parse_point(s: &str) -> Result<(usize, usize), MapError> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| MapError::InvalidPoint(s.to_string()))?;
    match (x.trim().parse(), y.trim().parse()) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(MapError::InvalidPoint(s.to_string())),
    }
}
