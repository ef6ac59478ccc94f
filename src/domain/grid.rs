/// Maze grid: a rectangular block of cells plus the recorded goal.
///
/// A grid is built whole, either parsed from level text or carved by the
/// generator, and is read-only afterwards. Loading a new maze replaces the
/// grid value as a unit.
///
/// Queries take signed coordinates so callers can probe one step off the
/// edge without casting: anything outside the grid is an implicit wall.

use rand::Rng;
use thiserror::Error;

use super::cell::Cell;
use super::generator;

/// Smallest accepted size for a generated maze.
pub const MIN_MAZE_SIZE: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("level is empty")]
    Empty,
    /// `line` counts non-blank rows from 1.
    #[error("row {line} is {found} cells wide, expected {expected}")]
    Ragged { line: usize, expected: usize, found: usize },
    #[error("level has no goal cell ('G')")]
    MissingGoal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("maze size {0} is too small (minimum is 3)")]
    InvalidSize(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
    goal: Option<(usize, usize)>,
}

impl Default for Grid {
    /// A single path cell. Placeholder until the first level loads.
    fn default() -> Self {
        Grid {
            cells: vec![vec![Cell::Path]],
            width: 1,
            height: 1,
            goal: None,
        }
    }
}

// ── Construction ──

impl Grid {
    /// Parse level text: one row per line, one character per cell.
    ///
    /// Blank lines are skipped wherever they appear and a trailing `\r` is
    /// dropped from every row. Every row must be as wide as the first. With
    /// several `G` cells the last one read becomes the recorded goal.
    pub fn parse(text: &str) -> Result<Grid, ParseError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|r| r.trim_end_matches('\r'))
            .filter(|r| !r.is_empty())
            .collect();

        if rows.is_empty() {
            return Err(ParseError::Empty);
        }

        let width = rows[0].chars().count();
        let height = rows.len();
        let mut cells = Vec::with_capacity(height);
        let mut goal = None;

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(ParseError::Ragged { line: y + 1, expected: width, found });
            }
            let parsed: Vec<Cell> = row.chars().map(Cell::from_char).collect();
            for (x, cell) in parsed.iter().enumerate() {
                if cell.is_goal() {
                    goal = Some((x, y));
                }
            }
            cells.push(parsed);
        }

        if goal.is_none() {
            return Err(ParseError::MissingGoal);
        }

        Ok(Grid { cells, width, height, goal })
    }

    /// Carve a fresh `size × size` perfect maze.
    ///
    /// Start (1, 1) is path and (size-2, size-2) is the goal. Even sizes are
    /// bumped to the next odd size: the carver only reaches odd coordinates,
    /// so an even-sized goal cell would be sealed in.
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Grid, GridError> {
        if size < MIN_MAZE_SIZE {
            return Err(GridError::InvalidSize(size));
        }
        let size = if size % 2 == 0 { size + 1 } else { size };

        let mut cells = generator::carve(size, rng);
        cells[1][1] = Cell::Path;
        let goal = (size - 2, size - 2);
        cells[goal.1][goal.0] = Cell::Goal;

        log::debug!("generated {size}x{size} maze");
        Ok(Grid { cells, width: size, height: size, goal: Some(goal) })
    }
}

// ── Queries ──

impl Grid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Recorded goal coordinate, if the grid has one.
    pub fn goal(&self) -> Option<(usize, usize)> {
        self.goal
    }

    #[inline]
    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Cell at (x, y). Out of bounds reads as wall.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Cell {
        if self.is_valid_position(x, y) {
            self.cells[y as usize][x as usize]
        } else {
            Cell::Wall
        }
    }

    /// Unsigned variant of `cell()` for callers iterating the grid.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y][x]
        } else {
            Cell::Wall
        }
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        !self.cell(x, y).is_passable()
    }

    pub fn is_goal(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_goal()
    }
}
