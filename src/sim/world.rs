/// WorldState: the complete snapshot of a running game.
///
/// ## Maze ownership
///
/// `grid` and `player` are plain values. A level load or endless round
/// builds the new grid and a validated player first, then swaps both in
/// through `install_maze()`, so a failed load never leaves a half-built
/// maze behind.
///
/// ## Session stats
///
/// `move_count`, `elapsed`, `trail` and the hint are per-maze and reset on
/// every install. `unlocked` mirrors the persisted progress record.

use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::grid::Grid;
use crate::domain::player::Player;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    LevelSelect,
    Playing,
    LevelComplete,
    EndlessComplete,
}

/// What the current maze belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Campaign { level: u32 },
    /// `size` is the side of the maze actually generated (always odd).
    Endless { round: u32, size: usize },
}

/// Title menu entries, top to bottom.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuItem {
    Levels,
    Endless,
    Quit,
}

pub const MENU_ITEMS: [MenuItem; 3] = [MenuItem::Levels, MenuItem::Endless, MenuItem::Quit];

pub struct WorldState {
    // ── Maze ──
    pub grid: Grid,
    pub player: Player,
    pub mode: Mode,

    // ── Session stats ──
    pub move_count: u32,
    /// Time spent in `Phase::Playing` on this maze.
    pub elapsed: Duration,
    /// Most recent cells the player left, newest last.
    pub trail: VecDeque<(usize, usize)>,
    pub trail_length: usize,

    // ── Hint ──
    pub show_hint: bool,
    /// Start-exclusive, goal-inclusive route from the player. Empty while hidden.
    pub hint_path: Vec<(usize, usize)>,

    // ── Progress ──
    pub unlocked: u32,
    pub max_level: u32,

    // ── Meta ──
    pub phase: Phase,
    pub anim_tick: u32,
    pub message: String,
    pub message_timer: u32,

    // ── Menus ──
    pub title_cursor: usize,
    pub select_cursor: u32,
}

// ── Construction ──

impl WorldState {
    pub fn new(unlocked: u32, max_level: u32, trail_length: usize) -> Self {
        let max_level = max_level.max(1);
        let unlocked = unlocked.clamp(1, max_level);
        WorldState {
            grid: Grid::default(),
            player: Player::default(),
            mode: Mode::Campaign { level: 1 },
            move_count: 0,
            elapsed: Duration::ZERO,
            trail: VecDeque::with_capacity(trail_length),
            trail_length,
            show_hint: false,
            hint_path: vec![],
            unlocked,
            max_level,
            phase: Phase::Title,
            anim_tick: 0,
            message: String::new(),
            message_timer: 0,
            title_cursor: 0,
            select_cursor: unlocked,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

// ── Maze lifecycle ──

impl WorldState {
    /// Replace the maze as a unit and reset everything tied to it.
    pub fn install_maze(&mut self, grid: Grid, player: Player, mode: Mode) {
        self.grid = grid;
        self.player = player;
        self.mode = mode;
        self.move_count = 0;
        self.elapsed = Duration::ZERO;
        self.trail.clear();
        self.show_hint = false;
        self.hint_path.clear();
        self.phase = Phase::Playing;
        self.anim_tick = 0;
    }

    /// Record a cell the player just left, dropping the oldest past the cap.
    pub fn push_trail(&mut self, pos: (usize, usize)) {
        if self.trail_length == 0 {
            return;
        }
        while self.trail.len() >= self.trail_length {
            self.trail.pop_front();
        }
        self.trail.push_back(pos);
    }

    pub fn current_level(&self) -> Option<u32> {
        match self.mode {
            Mode::Campaign { level } => Some(level),
            Mode::Endless { .. } => None,
        }
    }

    pub fn is_locked(&self, level: u32) -> bool {
        level == 0 || level > self.unlocked || level > self.max_level
    }
}
