/// Player entity: a single grid position, changed only through checks
/// against the current maze.

use thiserror::Error;

use super::grid::Grid;

/// Every maze starts the player here, whatever the level file marks with `P`.
pub const START: (usize, usize) = (1, 1);

/// Movement direction (one cell per step)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("cell ({x}, {y}) is a wall or off the grid")]
    Blocked { x: i32, y: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    x: usize,
    y: usize,
}

impl Default for Player {
    fn default() -> Self {
        Player { x: START.0, y: START.1 }
    }
}

impl Player {
    /// Place a player on the start cell of `grid`.
    pub fn spawn(grid: &Grid) -> Result<Player, PositionError> {
        let mut p = Player::default();
        p.set_position(grid, START.0 as i32, START.1 as i32)?;
        Ok(p)
    }

    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// Step one cell. Returns false (and stays put) when the target is a
    /// wall or off the grid.
    pub fn move_by(&mut self, grid: &Grid, dir: MoveDir) -> bool {
        let (dx, dy) = dir.delta();
        let (nx, ny) = (self.x as i32 + dx, self.y as i32 + dy);
        if grid.is_valid_position(nx, ny) && !grid.is_wall(nx, ny) {
            self.x = nx as usize;
            self.y = ny as usize;
            true
        } else {
            false
        }
    }

    /// Teleport to (x, y). Rejected positions leave the player where it was.
    pub fn set_position(&mut self, grid: &Grid, x: i32, y: i32) -> Result<(), PositionError> {
        if grid.is_valid_position(x, y) && !grid.is_wall(x, y) {
            self.x = x as usize;
            self.y = y as usize;
            Ok(())
        } else {
            log::warn!("rejected player position ({x}, {y})");
            Err(PositionError::Blocked { x, y })
        }
    }

    pub fn has_reached_goal(&self, grid: &Grid) -> bool {
        grid.is_goal(self.x as i32, self.y as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        Grid::parse("#####\n#P.G#\n#.#.#\n#...#\n#####").unwrap()
    }

    #[test]
    fn spawns_on_start_cell() {
        let p = Player::spawn(&sample()).unwrap();
        assert_eq!(p.pos(), (1, 1));
    }

    #[test]
    fn spawn_fails_on_walled_start() {
        let g = Grid::parse("####\n##G#\n####").unwrap();
        assert_eq!(Player::spawn(&g), Err(PositionError::Blocked { x: 1, y: 1 }));
    }

    #[test]
    fn move_into_open_cell() {
        let g = sample();
        let mut p = Player::spawn(&g).unwrap();
        assert!(p.move_by(&g, MoveDir::Right));
        assert_eq!(p.pos(), (2, 1));
        assert!(p.move_by(&g, MoveDir::Left));
        assert!(p.move_by(&g, MoveDir::Down));
        assert_eq!(p.pos(), (1, 2));
    }

    #[test]
    fn move_into_wall_is_noop() {
        let g = sample();
        let mut p = Player::spawn(&g).unwrap();
        assert!(!p.move_by(&g, MoveDir::Up));
        assert!(!p.move_by(&g, MoveDir::Left));
        assert_eq!(p.pos(), (1, 1));
    }

    #[test]
    fn move_off_grid_is_noop() {
        // open edge: the only thing stopping the player is the grid bound
        let g = Grid::parse("..G").unwrap();
        let mut p = Player::default();
        p.set_position(&g, 0, 0).unwrap();
        assert!(!p.move_by(&g, MoveDir::Left));
        assert!(!p.move_by(&g, MoveDir::Up));
        assert_eq!(p.pos(), (0, 0));
    }

    #[test]
    fn set_position_validates() {
        let g = sample();
        let mut p = Player::spawn(&g).unwrap();
        assert!(p.set_position(&g, 3, 3).is_ok());
        assert_eq!(p.pos(), (3, 3));
        assert_eq!(p.set_position(&g, 2, 2), Err(PositionError::Blocked { x: 2, y: 2 }));
        assert_eq!(p.set_position(&g, -1, 7), Err(PositionError::Blocked { x: -1, y: 7 }));
        assert_eq!(p.pos(), (3, 3));
    }

    #[test]
    fn reaches_goal() {
        let g = sample();
        let mut p = Player::spawn(&g).unwrap();
        assert!(!p.has_reached_goal(&g));
        p.move_by(&g, MoveDir::Right);
        p.move_by(&g, MoveDir::Right);
        assert!(p.has_reached_goal(&g));
    }
}
