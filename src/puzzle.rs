use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::grid::GridShape;
use crate::word_index::{ClueText, WordIndex};
use crate::{Direction, GridCoord, MIN_WORD_LENGTH};

/// Fractions of white cells revealed up front for each difficulty tier.
const EASY_PREFILL_RATIO: f64 = 0.25;
const MEDIUM_PREFILL_RATIO: f64 = 0.15;
const HARD_PREFILL_RATIO: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("missing clue for word: {0}")]
    MissingClue(String),
    #[error("cell {0:?} is not filled")]
    Incomplete(GridCoord),
}

/// A numbered clue, positioned at the first cell of its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClueEntry {
    pub number: usize,
    pub row: usize,
    pub col: usize,
    pub answer: String,
    pub clue: ClueText,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clues {
    pub across: Vec<ClueEntry>,
    pub down: Vec<ClueEntry>,
}

/// Cells revealed at the start of play, per difficulty. Each tier is sampled independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefilled {
    pub easy: Vec<GridCoord>,
    pub medium: Vec<GridCoord>,
    pub hard: Vec<GridCoord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Puzzle {
    pub id: String,
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    /// The answer letter for each cell, `None` for blocks.
    pub solution: Vec<Vec<Option<char>>>,
    pub clues: Clues,
    pub prefilled: Prefilled,
    pub difficulty: Option<String>,
    pub grid_size: usize,
}

impl Puzzle {
    pub fn word_count(&self) -> usize {
        self.clues.across.len() + self.clues.down.len()
    }

    pub fn answer_at(&self, (row, col): GridCoord) -> Option<char> {
        self.solution.get(row).and_then(|cells| cells.get(col)).copied().flatten()
    }
}

/// Read the answer starting at `start`, if that cell begins a slot in `direction`.
fn answer_starting_at(grid: &GridShape, start: GridCoord, direction: Direction) -> Option<Vec<GridCoord>> {
    let (dr, dc) = direction.step();
    let (row, col) = start;
    let continues_previous = row >= dr && col >= dc && grid.is_white((row - dr, col - dc));
    if continues_previous || !grid.is_white(start) {
        return None;
    }

    let mut cells = vec![];
    let mut current = start;
    while grid.is_white(current) {
        cells.push(current);
        current = (current.0 + dr, current.1 + dc);
    }

    if cells.len() >= MIN_WORD_LENGTH { Some(cells) } else { None }
}

/// Sample `ratio` of the white cells (at least one) without replacement, in row-major order.
fn sample_cells<R: Rng + ?Sized>(white_cells: &[GridCoord], ratio: f64, rng: &mut R) -> Vec<GridCoord> {
    let count = ((white_cells.len() as f64 * ratio).floor() as usize).max(1).min(white_cells.len());
    let mut sample: Vec<GridCoord> = white_cells.choose_multiple(rng, count).cloned().collect();
    sample.sort_unstable();
    sample
}

/// Turn a filled grid into a puzzle: number the slots, attach a clue to each answer and choose the
/// prefilled cells. Fails without producing anything if a cell is empty or an answer has no clue.
pub fn assemble<R: Rng + ?Sized>(
    grid: &GridShape,
    index: &WordIndex,
    id: &str,
    title: &str,
    rng: &mut R,
) -> Result<Puzzle, AssembleError> {
    let white_cells = grid.white_cells();
    if let Some(&coord) = white_cells.iter().find(|&&coord| grid.read(&[coord]).is_none()) {
        return Err(AssembleError::Incomplete(coord));
    }

    let mut clues = Clues::default();
    let mut number = 0;

    for &start in &white_cells {
        let across = answer_starting_at(grid, start, Direction::Across);
        let down = answer_starting_at(grid, start, Direction::Down);
        if across.is_none() && down.is_none() {
            continue;
        }
        number += 1;

        for (cells, list) in [(across, &mut clues.across), (down, &mut clues.down)] {
            let Some(cells) = cells else {
                continue;
            };
            let answer = grid.read(&cells).ok_or(AssembleError::Incomplete(start))?;
            let clue = index.clue(&answer).ok_or_else(|| AssembleError::MissingClue(answer.clone()))?;

            list.push(ClueEntry { number, row: start.0, col: start.1, answer, clue: clue.clone() });
        }
    }

    let solution: Vec<Vec<Option<char>>> = (0..grid.rows())
        .map(|row| (0..grid.cols()).map(|col| grid.get((row, col)).and_then(|cell| cell.letter())).collect())
        .collect();

    let prefilled = Prefilled {
        easy: sample_cells(&white_cells, EASY_PREFILL_RATIO, rng),
        medium: sample_cells(&white_cells, MEDIUM_PREFILL_RATIO, rng),
        hard: sample_cells(&white_cells, HARD_PREFILL_RATIO, rng),
    };

    info!(
        "assembled {} ({}): {} across, {} down",
        id,
        title,
        clues.across.len(),
        clues.down.len(),
    );

    Ok(Puzzle {
        id: id.to_string(),
        title: title.to_string(),
        rows: grid.rows(),
        cols: grid.cols(),
        solution,
        clues,
        prefilled,
        difficulty: None,
        grid_size: grid.rows(),
    })
}
