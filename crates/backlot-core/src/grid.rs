//! Grid occupancy registry: the authoritative map from cell to occupant.
//!
//! The registry only tracks occupancy; the backing state of an occupant
//! (crate uses, item definition) lives elsewhere and is looked up by id.
//! Callers unregister a cell before dropping the occupant's backing state,
//! so the registry never points at anything destroyed.

use crate::id::{CrateId, ItemDefId};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cell coordinate. Valid positions satisfy `x < columns && y < rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
}

impl GridPos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Grid dimensions, fixed at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub columns: u32,
    pub rows: u32,
}

impl GridDims {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.columns && pos.y < self.rows
    }

    pub fn cell_count(&self) -> u32 {
        self.columns * self.rows
    }
}

/// What a cell holds. Exhaustively matched at every access site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    Empty,
    Item(ItemDefId),
    Crate(CrateId),
}

impl Occupant {
    pub fn is_empty(self) -> bool {
        matches!(self, Occupant::Empty)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("position ({0}, {1}) is outside the grid")]
    OutOfBounds(u32, u32),
}

/// Authoritative cell-to-occupant map with free-cell queries.
///
/// Only occupied cells are stored; the key set is always a subset of the
/// configured bounds.
#[derive(Debug, Clone)]
pub struct GridRegistry {
    dims: GridDims,
    cells: HashMap<GridPos, Occupant>,
}

impl GridRegistry {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            cells: HashMap::new(),
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Place an occupant, overwriting any existing entry at the cell.
    /// Registering `Occupant::Empty` clears the cell.
    pub fn register(&mut self, pos: GridPos, occupant: Occupant) -> Result<(), GridError> {
        if !self.dims.contains(pos) {
            return Err(GridError::OutOfBounds(pos.x, pos.y));
        }
        match occupant {
            Occupant::Empty => {
                self.cells.remove(&pos);
            }
            other => {
                self.cells.insert(pos, other);
            }
        }
        Ok(())
    }

    /// Clear a cell. No-op if the cell is already free or out of bounds.
    pub fn unregister(&mut self, pos: GridPos) {
        self.cells.remove(&pos);
    }

    /// The occupant at a cell. Free and out-of-bounds cells both read empty.
    pub fn occupant_at(&self, pos: GridPos) -> Occupant {
        self.cells.get(&pos).copied().unwrap_or(Occupant::Empty)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_full(&self) -> bool {
        self.cells.len() as u32 >= self.dims.cell_count()
    }

    /// A uniformly random unoccupied cell, or `None` when the grid is full.
    pub fn random_free_cell(&self, rng: &mut SimRng) -> Option<GridPos> {
        self.random_free_cell_excluding(rng, None)
    }

    /// Like [`random_free_cell`](Self::random_free_cell), but never returns
    /// `exclude` (used so a crate cannot spawn into its own cell).
    pub fn random_free_cell_excluding(
        &self,
        rng: &mut SimRng,
        exclude: Option<GridPos>,
    ) -> Option<GridPos> {
        let free = self.free_cells(exclude);
        if free.is_empty() {
            return None;
        }
        Some(free[rng.next_index(free.len())])
    }

    /// All occupied cells in column-major scan order (deterministic, used by
    /// the snapshot collector).
    pub fn occupied_cells(&self) -> Vec<(GridPos, Occupant)> {
        let mut out = Vec::with_capacity(self.cells.len());
        for x in 0..self.dims.columns {
            for y in 0..self.dims.rows {
                let pos = GridPos::new(x, y);
                let occ = self.occupant_at(pos);
                if !occ.is_empty() {
                    out.push((pos, occ));
                }
            }
        }
        out
    }

    fn free_cells(&self, exclude: Option<GridPos>) -> Vec<GridPos> {
        let mut free = Vec::new();
        for x in 0..self.dims.columns {
            for y in 0..self.dims.rows {
                let pos = GridPos::new(x, y);
                if Some(pos) == exclude {
                    continue;
                }
                if self.occupant_at(pos).is_empty() {
                    free.push(pos);
                }
            }
        }
        free
    }
}
