/// Cell types and their properties.
/// Semantics are queried via methods so the level format and the
/// movement rules agree on one definition.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Wall,
    Path,
    Goal, // Passable, completes the level when entered
}

impl Cell {
    /// Map a level-file character to a cell.
    ///
    /// `P` marks the conventional player start but is plain path; the
    /// player always spawns at (1, 1). Unknown characters are path.
    pub fn from_char(c: char) -> Cell {
        match c {
            '#' => Cell::Wall,
            'G' => Cell::Goal,
            _ => Cell::Path,
        }
    }

    /// Can the player occupy this cell?
    pub fn is_passable(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Cell::Goal)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Path
    }
}
