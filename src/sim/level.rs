/// Level loader: campaign files plus generated endless rounds.
///
/// ## Sources (priority order):
///   1. `<levels_dir>/level{n}.txt`
///   2. Built-in embedded levels (first few only)
///
/// ## Level format (`.txt`):
///   One row per line, one character per cell.
///
/// ## Cell legend:
///   '#' = Wall     '.' = Path     'G' = Goal
///   'P' = Path (start marker, cosmetic: play always starts at (1, 1))
///   anything else reads as Path
///
/// Every load builds the grid and player first and only then swaps them
/// into the world, so an error leaves the current maze in place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::grid::{Grid, GridError, ParseError};
use crate::domain::player::Player;
use crate::sim::event::GameEvent;
use crate::sim::world::{Mode, WorldState};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {0} not found")]
    NotFound(u32),
    #[error("level {0} is locked")]
    Locked(u32),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("level {0} starts inside a wall")]
    BlockedStart(u32),
    #[error(transparent)]
    Grid(#[from] GridError),
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn level_path(dir: &Path, level: u32) -> PathBuf {
    dir.join(format!("level{level}.txt"))
}

/// Read and parse campaign level `level` without touching any game state.
pub fn read_level(dir: &Path, level: u32) -> Result<Grid, LevelError> {
    if level == 0 {
        return Err(LevelError::NotFound(level));
    }
    let path = level_path(dir, level);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(Grid::parse(&text)?),
        Err(e) if e.kind() == ErrorKind::NotFound => match embedded_level(level) {
            Some(rows) => {
                log::info!("{} missing, using built-in level {level}", path.display());
                Ok(Grid::parse(&rows.join("\n"))?)
            }
            None => Err(LevelError::NotFound(level)),
        },
        Err(source) => Err(LevelError::Io { path, source }),
    }
}

/// Load campaign level `level` into the world. Player, stats, hint and
/// trail are reset; on error the world is unchanged.
pub fn load_level(
    world: &mut WorldState,
    level: u32,
    config: &GameConfig,
) -> Result<Vec<GameEvent>, LevelError> {
    if level == 0 || level > world.max_level {
        return Err(LevelError::NotFound(level));
    }
    if world.is_locked(level) {
        return Err(LevelError::Locked(level));
    }

    let grid = read_level(&config.levels_dir, level)?;
    let player = Player::spawn(&grid).map_err(|_| LevelError::BlockedStart(level))?;

    log::info!("level {level} loaded ({}x{})", grid.width(), grid.height());
    world.install_maze(grid, player, Mode::Campaign { level });
    world.set_message(&format!("LEVEL {level}"), 90);
    Ok(vec![GameEvent::LevelStarted { level }])
}

/// Maze size for endless round `round` (1-based): grows by two per round
/// and stops at `max`.
pub fn endless_size(round: u32, start: usize, max: usize) -> usize {
    let grown = start.saturating_add(2 * round.saturating_sub(1) as usize);
    grown.min(max.max(start))
}

/// Generate and install endless round `round`. The reported size is the
/// generated one, which is one larger than `endless_size` when that is even.
pub fn start_endless<R: Rng + ?Sized>(
    world: &mut WorldState,
    round: u32,
    config: &GameConfig,
    rng: &mut R,
) -> Result<Vec<GameEvent>, LevelError> {
    let round = round.max(1);
    let size = endless_size(round, config.endless_start_size, config.endless_max_size);
    let grid = Grid::generate(size, rng)?;
    let player = Player::spawn(&grid).map_err(|_| LevelError::BlockedStart(0))?;
    let size = grid.width();

    log::info!("endless round {round}: {size}x{size}");
    world.install_maze(grid, player, Mode::Endless { round, size });
    world.set_message(&format!("ROUND {round}"), 90);
    Ok(vec![GameEvent::EndlessStarted { round, size }])
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_level(level: u32) -> Option<&'static [&'static str]> {
    EMBEDDED.get(level.checked_sub(1)? as usize).copied()
}

const EMBEDDED: [&[&str]; 3] = [
    &[
        "#######",
        "#P..#.#",
        "###.#.#",
        "#...#.#",
        "#.###.#",
        "#....G#",
        "#######",
    ],
    &[
        "#########",
        "#P....#.#",
        "#####.#.#",
        "#.....#.#",
        "#.#####.#",
        "#.#...#.#",
        "#.#.#.#.#",
        "#...#..G#",
        "#########",
    ],
    &[
        "###########",
        "#P#.....#.#",
        "#.#.###.#.#",
        "#...#...#.#",
        "#####.###.#",
        "#.....#...#",
        "#.#####.###",
        "#.#...#...#",
        "#.#.#.###.#",
        "#...#....G#",
        "###########",
    ],
];
