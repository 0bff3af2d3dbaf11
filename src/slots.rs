use smallvec::SmallVec;

use crate::grid::GridShape;
use crate::{Direction, GridCoord, SlotId, MAX_SLOT_LENGTH, MIN_WORD_LENGTH};

/// A maximal run of white cells, in one direction, that must hold a single word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub direction: Direction,
    pub cells: SmallVec<[GridCoord; MAX_SLOT_LENGTH]>,
}

impl Slot {
    pub fn start(&self) -> GridCoord {
        self.cells[0]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.cells.contains(&coord)
    }

    /// If the two slots share a cell, return its index within this slot and within `other`.
    pub fn crossing(&self, other: &Slot) -> Option<(usize, usize)> {
        self.cells.iter().enumerate().find_map(|(cell_idx, coord)| {
            other.cells.iter().position(|other_coord| other_coord == coord).map(|other_idx| (cell_idx, other_idx))
        })
    }
}

/// Collect the white runs along one line of cells, keeping those long enough to be slots.
fn build_runs<I>(line: I, grid: &GridShape) -> Vec<SmallVec<[GridCoord; MAX_SLOT_LENGTH]>>
    where
        I: IntoIterator<Item=GridCoord>
{
    let mut result = vec![];
    let mut current: SmallVec<[GridCoord; MAX_SLOT_LENGTH]> = SmallVec::new();

    for coord in line {
        if grid.is_white(coord) {
            current.push(coord);
        } else {
            if current.len() >= MIN_WORD_LENGTH {
                result.push(current.clone());
            }
            current.clear();
        }
    }

    if current.len() >= MIN_WORD_LENGTH {
        result.push(current);
    }

    result
}

/// Enumerate the grid's slots: across runs scanning row by row, then down runs scanning column by
/// column. Slot ids are assigned in that order.
pub fn extract_slots(grid: &GridShape) -> Vec<Slot> {
    let mut slots: Vec<Slot> = vec![];

    for row in 0..grid.rows() {
        for cells in build_runs((0..grid.cols()).map(|col| (row, col)), grid) {
            slots.push(Slot { id: slots.len(), direction: Direction::Across, cells });
        }
    }

    for col in 0..grid.cols() {
        for cells in build_runs((0..grid.rows()).map(|row| (row, col)), grid) {
            slots.push(Slot { id: slots.len(), direction: Direction::Down, cells });
        }
    }

    slots
}

/// Count slots as (across, down).
pub fn count_by_direction(slots: &[Slot]) -> (usize, usize) {
    let across = slots.iter().filter(|slot| slot.direction == Direction::Across).count();
    (across, slots.len() - across)
}
