//! Neighbour range queries.
//!
//! Every index answers the same question, "which tracked entities lie within
//! `radius` of `center`", and reports them in ascending entity order so that
//! callers see identical neighbour lists whichever backing structure is used.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use thiserror::Error;

use crate::math;
use crate::vector::Vector3D;

/// Errors emitted by spatial index implementations
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IndexError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Common behaviour exposed by neighbourhood indices
pub trait SpatialIndex {
    /// Rebuild internal structures from entity positions. Entity ids are
    /// indices into `positions`.
    fn rebuild(&mut self, positions: &[Vector3D]);

    /// Clear `out` and fill it with the ids of every entity whose distance to
    /// `center` is `<= radius`, skipping `exclude`, in ascending id order.
    fn query(&self, center: Vector3D, radius: f32, exclude: Option<usize>, out: &mut Vec<usize>);

    /// Number of tracked entities
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute force scan over every entity, O(N) per query
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    positions: Vec<Vector3D>,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for LinearIndex {
    fn rebuild(&mut self, positions: &[Vector3D]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }

    fn query(&self, center: Vector3D, radius: f32, exclude: Option<usize>, out: &mut Vec<usize>) {
        out.clear();
        let radius_sq = radius * radius;
        for (i, position) in self.positions.iter().enumerate() {
            if Some(i) != exclude && position.distance_squared(&center) <= radius_sq {
                out.push(i);
            }
        }
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}

type Cell = (i32, i32, i32);

/// Uniform grid bucketing entities by cell. Only the cells overlapping the
/// query sphere's bounding box are visited, so a cell size close to the
/// usual query radius keeps the candidate set small.
#[derive(Debug, Clone)]
pub struct UniformGridIndex {
    cell_size: f32,
    positions: Vec<Vector3D>,
    cells: BTreeMap<Cell, Vec<usize>>,
}

impl UniformGridIndex {
    pub fn new(cell_size: f32) -> Result<Self, IndexError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(IndexError::InvalidConfig("cell_size must be positive"));
        }
        Ok(Self {
            cell_size,
            positions: Vec::new(),
            cells: BTreeMap::new(),
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    fn cell_coord(&self, value: f32) -> i32 {
        math::floorf(value / self.cell_size) as i32
    }

    #[inline]
    fn cell_of(&self, position: Vector3D) -> Cell {
        (
            self.cell_coord(position.x),
            self.cell_coord(position.y),
            self.cell_coord(position.z),
        )
    }
}

impl SpatialIndex for UniformGridIndex {
    fn rebuild(&mut self, positions: &[Vector3D]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);

        // Keep bucket allocations around between ticks
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        for (i, position) in positions.iter().enumerate() {
            let cell = self.cell_of(*position);
            self.cells.entry(cell).or_default().push(i);
        }
        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    fn query(&self, center: Vector3D, radius: f32, exclude: Option<usize>, out: &mut Vec<usize>) {
        out.clear();
        let radius_sq = radius * radius;

        let (min_x, min_y, min_z) = self.cell_of(center - Vector3D::new(radius, radius, radius));
        let (max_x, max_y, max_z) = self.cell_of(center + Vector3D::new(radius, radius, radius));

        // A huge radius would visit more empty cells than there are entities
        let extent = |lo: i32, hi: i32| i64::from(hi) - i64::from(lo) + 1;
        let span = extent(min_x, max_x)
            .checked_mul(extent(min_y, max_y))
            .and_then(|area| area.checked_mul(extent(min_z, max_z)));
        if span.map_or(true, |span| span > self.cells.len() as i64) {
            for (cell, bucket) in &self.cells {
                let inside = (min_x..=max_x).contains(&cell.0)
                    && (min_y..=max_y).contains(&cell.1)
                    && (min_z..=max_z).contains(&cell.2);
                if inside {
                    out.extend_from_slice(bucket);
                }
            }
        } else {
            for x in min_x..=max_x {
                for y in min_y..=max_y {
                    for z in min_z..=max_z {
                        if let Some(bucket) = self.cells.get(&(x, y, z)) {
                            out.extend_from_slice(bucket);
                        }
                    }
                }
            }
        }

        out.retain(|&i| Some(i) != exclude && self.positions[i].distance_squared(&center) <= radius_sq);
        out.sort_unstable();
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}
