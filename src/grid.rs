use std::fmt;

use bit_set::BitSet;

use crate::{Direction, GridCoord, MIN_WORD_LENGTH};

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Block,
    Open,
    Filled(char),
}

impl Cell {
    pub fn is_block(self) -> bool {
        self == Cell::Block
    }

    pub fn letter(self) -> Option<char> {
        match self {
            Cell::Filled(letter) => Some(letter),
            _ => None,
        }
    }

    fn from_template_char(c: char) -> Cell {
        match c {
            '#' => Cell::Block,
            '.' | '_' | '?' | ' ' => Cell::Open,
            c if c.is_ascii_alphabetic() => Cell::Filled(c.to_ascii_uppercase()),
            _ => Cell::Block,
        }
    }
}

/// Which runs a white cell needs in order to survive sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Both the across run and the down run through the cell must reach the minimum length, so
    /// every white cell ends up checked by two slots.
    #[default]
    Both,
    /// Either run reaching the minimum length is enough; unchecked cells are allowed.
    Either,
}

impl RunPolicy {
    fn keeps(self, across: usize, down: usize) -> bool {
        match self {
            RunPolicy::Both => across >= MIN_WORD_LENGTH && down >= MIN_WORD_LENGTH,
            RunPolicy::Either => across >= MIN_WORD_LENGTH || down >= MIN_WORD_LENGTH,
        }
    }
}

/// A square (or rectangular) grid of cells. Shaping operations are pure in the sense that they
/// only ever turn cells into blocks; they never reject a shape themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridShape {
    cells: Vec<Vec<Cell>>,
}

impl GridShape {
    /// Build a grid from template rows, padding each row with blocks and adding all-block rows to
    /// reach `size`. Without a size, the template's own extent is used.
    pub fn from_template<S: AsRef<str>>(rows: &[S], size: Option<usize>) -> GridShape {
        let template: Vec<Vec<char>> = rows.iter().map(|row| row.as_ref().chars().collect()).collect();
        let widest = template.iter().map(|row| row.len()).max().unwrap_or(0);
        let (height, width) = match size {
            Some(size) => (size, size),
            None => (template.len(), widest),
        };

        let cells = (0..height).map(|row| {
            (0..width).map(|col| {
                template
                    .get(row)
                    .and_then(|chars| chars.get(col))
                    .map(|&c| Cell::from_template_char(c))
                    .unwrap_or(Cell::Block)
            }).collect()
        }).collect();

        GridShape { cells }
    }

    /// Parse a template string, with # representing blocks, . representing empty cells, and
    /// letters representing themselves. Blank lines are skipped and each line is trimmed.
    pub fn parse(template: &str, size: Option<usize>) -> GridShape {
        let rows: Vec<&str> = template
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect();

        GridShape::from_template(&rows, size)
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map(|row| row.len()).unwrap_or(0)
    }

    /// The cell at `coord`, or `None` if it's off the grid.
    pub fn get(&self, (row, col): GridCoord) -> Option<Cell> {
        self.cells.get(row).and_then(|cells| cells.get(col)).copied()
    }

    pub(crate) fn set(&mut self, (row, col): GridCoord, cell: Cell) {
        self.cells[row][col] = cell;
    }

    pub fn is_white(&self, coord: GridCoord) -> bool {
        self.get(coord).map(|cell| !cell.is_block()).unwrap_or(false)
    }

    /// All non-block cells in row-major order.
    pub fn white_cells(&self) -> Vec<GridCoord> {
        self.coords().filter(|&coord| self.is_white(coord)).collect()
    }

    pub fn white_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| !cell.is_block()).count()
    }

    pub fn white_ratio(&self) -> f64 {
        let total = self.rows() * self.cols();
        if total == 0 {
            return 0.0;
        }
        self.white_count() as f64 / total as f64
    }

    /// Does every white cell hold a letter?
    pub fn is_complete(&self) -> bool {
        !self.cells.iter().flatten().any(|&cell| cell == Cell::Open)
    }

    /// Read the letters at the given cells, or `None` if any of them is unfilled.
    pub fn read(&self, cells: &[GridCoord]) -> Option<String> {
        cells.iter().map(|&coord| self.get(coord).and_then(Cell::letter)).collect()
    }

    fn coords(&self) -> impl Iterator<Item=GridCoord> + '_ {
        (0..self.rows()).flat_map(move |row| (0..self.cols()).map(move |col| (row, col)))
    }

    /// Length of the maximal white run through `coord` in one direction.
    fn run_length(&self, (row, col): GridCoord, direction: Direction) -> usize {
        if !self.is_white((row, col)) {
            return 0;
        }

        let (dr, dc) = direction.step();
        let mut start = (row, col);
        while start.0 >= dr && start.1 >= dc && self.is_white((start.0 - dr, start.1 - dc)) {
            start = (start.0 - dr, start.1 - dc);
        }

        let mut length = 0;
        let mut current = start;
        while self.is_white(current) {
            length += 1;
            current = (current.0 + dr, current.1 + dc);
        }
        length
    }

    /// The (across, down) lengths of the maximal white runs through `coord`.
    pub fn run_lengths(&self, coord: GridCoord) -> (usize, usize) {
        (self.run_length(coord, Direction::Across), self.run_length(coord, Direction::Down))
    }

    /// Turn white cells that can't support a minimum-length word into blocks, repeating until
    /// nothing changes. Returns how many cells were blocked.
    pub fn sanitize(&mut self, policy: RunPolicy) -> usize {
        let mut blocked = 0;

        loop {
            let doomed: Vec<GridCoord> = self.coords().filter(|&coord| {
                if !self.is_white(coord) {
                    return false;
                }
                let (across, down) = self.run_lengths(coord);
                !policy.keeps(across, down)
            }).collect();

            if doomed.is_empty() {
                return blocked;
            }

            blocked += doomed.len();
            for coord in doomed {
                self.set(coord, Cell::Block);
            }
        }
    }

    /// Does every white cell satisfy the run-length policy?
    pub fn satisfies_min_runs(&self, policy: RunPolicy) -> bool {
        self.white_cells().into_iter().all(|coord| {
            let (across, down) = self.run_lengths(coord);
            policy.keeps(across, down)
        })
    }

    /// Do the white cells form a single 4-connected region? A grid without white cells is not
    /// considered connected.
    pub fn is_connected(&self) -> bool {
        let whites = self.white_cells();
        let Some(&origin) = whites.first() else {
            return false;
        };

        let cols = self.cols();
        let mut seen = BitSet::with_capacity(self.rows() * cols);
        let mut stack = vec![origin];
        seen.insert(origin.0 * cols + origin.1);

        while let Some((row, col)) = stack.pop() {
            let neighbors = [
                row.checked_sub(1).map(|r| (r, col)),
                Some((row + 1, col)),
                col.checked_sub(1).map(|c| (row, c)),
                Some((row, col + 1)),
            ];

            for neighbor in neighbors.into_iter().flatten() {
                if self.is_white(neighbor) && seen.insert(neighbor.0 * cols + neighbor.1) {
                    stack.push(neighbor);
                }
            }
        }

        seen.len() == whites.len()
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.cells.iter().map(|row| {
            row.iter().map(|cell| match cell {
                Cell::Block => '#',
                Cell::Open => '.',
                Cell::Filled(letter) => *letter,
            }).collect()
        }).collect();

        write!(f, "{}", lines.join("\n"))
    }
}
