//! Crossword puzzle generation: shape a block template into a valid grid, fill it from a word
//! pool with a bounded backtracking search, and assemble the clued puzzle a front end consumes.
//!
//! The pipeline for one puzzle is `GridShape` (pad + sanitize + connectivity) → `extract_slots` →
//! `find_fill` → `assemble`, with `Generator` driving template retries and session-wide word
//! de-duplication on top of it.

pub mod fill;
pub mod generator;
pub mod grid;
pub mod puzzle;
pub mod slots;
pub mod used_words;
pub mod word_index;

pub use fill::{find_fill, Choice, FillFailure, FillOptions, FillSuccess, Statistics};
pub use generator::{GenerateError, GeneratedGrid, Generator, GeneratorConfig, ShapeRejected, SizeProfile, Tier};
pub use grid::{Cell, GridShape, RunPolicy};
pub use puzzle::{assemble, AssembleError, ClueEntry, Clues, Prefilled, Puzzle};
pub use slots::{count_by_direction, extract_slots, Slot};
pub use used_words::UsedWordSet;
pub use word_index::{ClueText, Trie, WordEntry, WordIndex};

/// The shortest run of open cells that counts as a slot.
pub const MIN_WORD_LENGTH: usize = 3;

/// The longest word the word pool may contain.
pub const MAX_WORD_LENGTH: usize = 10;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 16;

/// The expected maximum number of slots appearing in a grid.
pub const MAX_SLOT_COUNT: usize = 64;

/// How many shuffled candidates the solver will consider for a single slot.
pub const DEFAULT_CANDIDATE_CAP: usize = 500;

/// How many templates the generator will try before giving up on a puzzle.
pub const DEFAULT_MAX_ATTEMPTS: usize = 200;

/// Grids up to this size are "small": intra-grid reuse is allowed and the node budget is lower.
pub const SMALL_GRID_MAX_SIZE: usize = 5;

pub const SMALL_GRID_NODE_BUDGET: usize = 80_000;
pub const LARGE_GRID_NODE_BUDGET: usize = 200_000;

/// An identifier for a given slot, based on its index in the extracted slot list.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// The (row, col) step taken to move one cell along this direction.
    pub fn step(self) -> (usize, usize) {
        match self {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        }
    }
}
