/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each frame also rebuilds the list of clickable hotspots (menu entries,
/// level buttons, panel buttons), so mouse hits always match what is on
/// screen. Particles and flashes live in `Effects`, owned here.

use std::io::{self, BufWriter, Write};
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use rand::rngs::ThreadRng;

use crate::config::DisplayConfig;
use crate::domain::cell::Cell as MazeCell;
use crate::logging;
use crate::sim::event::GameEvent;
use crate::sim::world::{MenuItem, Mode, Phase, WorldState, MENU_ITEMS};
use crate::ui::effects::{self, Effects, Rgb};
use crate::ui::input::Action;

// ── Palette ──

const BASE_BG: Rgb = (22, 22, 35);
const PANEL_BG: Rgb = (30, 30, 52);
const BUTTON_BG: Rgb = (50, 50, 90);
const BUTTON_HOT: Rgb = (70, 110, 70);
const WALL: Rgb = (55, 62, 105);
const WALL_GLOW: Rgb = (85, 115, 200);
const GOAL_A: Rgb = (255, 200, 50);
const GOAL_B: Rgb = (255, 110, 40);
const PLAYER: Rgb = (120, 255, 140);
const HINT: Rgb = (80, 220, 255);
const BUMP: Rgb = (255, 70, 60);
const GOLD_TEXT: Rgb = (255, 200, 50);
const DIM: Rgb = (110, 110, 130);

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Color::Rgb { r: BASE_BG.0, g: BASE_BG.1, b: BASE_BG.2 },
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Rgb, bg: Rgb) -> Self {
        Cell { ch, fg: rgb(fg), bg: rgb(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Rgb, bg: Rgb) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// `put_str` centred on the whole buffer width.
    fn put_centered(&mut self, y: usize, s: &str, fg: Rgb, bg: Rgb) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Rgb) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, Cell::new(' ', DIM, bg));
            }
        }
    }

    /// Single-line box border.
    fn frame(&mut self, x: usize, y: usize, w: usize, h: usize, fg: Rgb, bg: Rgb) {
        if w < 2 || h < 2 { return; }
        for xx in x + 1..x + w - 1 {
            self.set(xx, y, Cell::new('─', fg, bg));
            self.set(xx, y + h - 1, Cell::new('─', fg, bg));
        }
        for yy in y + 1..y + h - 1 {
            self.set(x, yy, Cell::new('│', fg, bg));
            self.set(x + w - 1, yy, Cell::new('│', fg, bg));
        }
        self.set(x, y, Cell::new('┌', fg, bg));
        self.set(x + w - 1, y, Cell::new('┐', fg, bg));
        self.set(x, y + h - 1, Cell::new('└', fg, bg));
        self.set(x + w - 1, y + h - 1, Cell::new('┘', fg, bg));
    }
}

// ── Hotspots: clickable screen rectangles ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hotspot {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
    pub action: Action,
}

impl Hotspot {
    fn contains(&self, col: usize, row: usize) -> bool {
        col >= self.x && col < self.x + self.w && row >= self.y && row < self.y + self.h
    }
}

// ── Maze viewport ──

/// Terminal columns per maze cell.
const CELL_W: usize = 2;
/// Width of the stats panel on the left of the playing screen.
const PANEL_W: usize = 24;

/// Which part of the maze is visible and where it sits on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MazeView {
    col: usize,
    row: usize,
    first_x: usize,
    first_y: usize,
    cols: usize,
    rows: usize,
}

impl MazeView {
    /// Fit a `grid_w × grid_h` maze into the given screen area, scrolling
    /// to keep `focus` near the middle when it doesn't fit.
    fn fit(area: (usize, usize, usize, usize), grid: (usize, usize), focus: (usize, usize)) -> Self {
        let (ax, ay, aw, ah) = area;
        let cols = grid.0.min(aw / CELL_W);
        let rows = grid.1.min(ah);
        let scroll = |f: usize, shown: usize, total: usize| {
            f.saturating_sub(shown / 2).min(total.saturating_sub(shown))
        };
        MazeView {
            col: ax + aw.saturating_sub(cols * CELL_W) / 2,
            row: ay + ah.saturating_sub(rows) / 2,
            first_x: scroll(focus.0, cols, grid.0),
            first_y: scroll(focus.1, rows, grid.1),
            cols,
            rows,
        }
    }

    /// Screen position of the left column of maze cell (x, y), if visible.
    fn to_screen(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        if x < self.first_x || y < self.first_y { return None; }
        let (vx, vy) = (x - self.first_x, y - self.first_y);
        if vx >= self.cols || vy >= self.rows { return None; }
        Some((self.col + vx * CELL_W, self.row + vy))
    }
}

/// `mm:ss`, minutes keep counting past an hour.
pub fn format_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    display: DisplayConfig,
    effects: Effects,
    rng: ThreadRng,
    hotspots: Vec<Hotspot>,
    pad_connected: bool,
}

impl Renderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            display: display.clone(),
            effects: Effects::new(display.particles),
            rng: rand::thread_rng(),
            hotspots: Vec::with_capacity(32),
            pad_connected: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BLANK.bg),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    /// Shown as a badge in the play panel.
    pub fn set_pad_connected(&mut self, connected: bool) {
        self.pad_connected = connected;
    }

    /// Action under a click at (col, row) on the last drawn frame.
    /// Later hotspots are drawn on top, so they win.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<Action> {
        self.hotspots
            .iter()
            .rev()
            .find(|h| h.contains(col as usize, row as usize))
            .map(|h| h.action)
    }

    /// Turn game events into effects.
    pub fn handle_events(&mut self, world: &WorldState, events: &[GameEvent]) {
        let view = self.maze_view(world);
        for ev in events {
            match *ev {
                GameEvent::GoalReached { x, y } => {
                    if let Some((c, r)) = view.to_screen(x, y) {
                        self.effects.burst(c as f32 + 1.0, r as f32, 48, &effects::GOLD, &mut self.rng);
                    }
                }
                GameEvent::LevelUnlocked { .. } => {
                    self.effects.burst(PANEL_W as f32 / 2.0, 3.0, 24, &effects::GLOW, &mut self.rng);
                }
                GameEvent::Bumped { x, y } => {
                    self.effects.bump(x, y);
                    let wall = (usize::try_from(x), usize::try_from(y));
                    if let (Ok(wx), Ok(wy)) = wall {
                        if let Some((c, r)) = view.to_screen(wx, wy) {
                            self.effects.burst(c as f32 + 1.0, r as f32, 4, &effects::EMBER, &mut self.rng);
                        }
                    }
                }
                GameEvent::HintShown { .. } => {
                    let (px, py) = world.player.pos();
                    if let Some((c, r)) = view.to_screen(px, py) {
                        self.effects.burst(c as f32 + 1.0, r as f32, 8, &effects::GLOW, &mut self.rng);
                    }
                }
                GameEvent::LevelStarted { .. } | GameEvent::EndlessStarted { .. } => {
                    self.effects.clear();
                }
                GameEvent::Moved { .. } | GameEvent::HintHidden => {}
            }
        }
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BLANK.bg), Clear(ClearType::All))?;
        }

        // Phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BLANK.bg), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BLANK.bg;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours, not ResetColor: the terminal default may
        // differ from the game background.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState) {
        self.front.clear();
        self.hotspots.clear();
        self.effects.update();

        match w.phase {
            Phase::Title => {
                self.effects.ambient(self.front.width, self.front.height, &mut self.rng);
                self.compose_title(w);
            }
            Phase::LevelSelect => {
                self.effects.ambient(self.front.width, self.front.height, &mut self.rng);
                self.compose_level_select(w);
            }
            Phase::Playing => self.compose_game(w),
            Phase::LevelComplete | Phase::EndlessComplete => {
                self.compose_game(w);
                self.compose_complete_overlay(w);
            }
        }

        self.compose_particles();
        self.compose_message_line(w);
    }

    fn push_button(&mut self, x: usize, y: usize, w: usize, label: &str, action: Action, hot: bool) {
        let bg = if hot { BUTTON_HOT } else { BUTTON_BG };
        self.front.fill(x, y, w, 1, bg);
        let lx = x + w.saturating_sub(label.chars().count()) / 2;
        self.front.put_str(lx, y, label, (235, 235, 245), bg);
        self.hotspots.push(Hotspot { x, y, w, h: 1, action });
    }

    fn compose_title(&mut self, w: &WorldState) {
        let banner = [
            r" __  __                 ___                          ",
            r"|  \/  |__ _ ______    | _ \_  _ _ _  _ _  ___ _ _  ",
            r"| |\/| / _` |_ / -_)   |   / || | ' \| ' \/ -_) '_| ",
            r"|_|  |_\__,_/__\___|   |_|_\\_,_|_||_|_||_\___|_|   ",
        ];
        let top = 2;
        for (i, line) in banner.iter().enumerate() {
            let t = i as f32 / banner.len() as f32;
            self.front.put_centered(top + i, line, lerp(GOAL_A, GOAL_B, t), BASE_BG);
        }
        self.front.put_centered(top + 5, "find the way out", DIM, BASE_BG);

        let menu_top = top + 8;
        let bw = 22;
        let bx = self.front.width.saturating_sub(bw) / 2;
        for (i, item) in MENU_ITEMS.iter().enumerate() {
            let (label, action) = match item {
                MenuItem::Levels => ("1  LEVELS", Action::OpenLevels),
                MenuItem::Endless => ("2  ENDLESS", Action::OpenEndless),
                MenuItem::Quit => ("Q  QUIT", Action::Quit),
            };
            self.push_button(bx, menu_top + i * 2, bw, label, action, i == w.title_cursor);
        }

        let progress = format!("levels unlocked: {} / {}", w.unlocked, w.max_level);
        self.front.put_centered(menu_top + MENU_ITEMS.len() * 2 + 1, &progress, GOLD_TEXT, BASE_BG);
        self.front.put_centered(
            menu_top + MENU_ITEMS.len() * 2 + 3,
            "↑↓ choose   ENTER select   click to pick",
            DIM,
            BASE_BG,
        );
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        const PER_ROW: usize = 5;
        const BTN_W: usize = 8;
        const BTN_H: usize = 3;
        const GAP: usize = 2;

        self.front.put_centered(1, "L E V E L   S E L E C T", GOLD_TEXT, BASE_BG);

        let grid_w = PER_ROW * BTN_W + (PER_ROW - 1) * GAP;
        let ox = self.front.width.saturating_sub(grid_w) / 2;
        let oy = 3;

        for n in 1..=w.max_level {
            let i = (n - 1) as usize;
            let x = ox + (i % PER_ROW) * (BTN_W + GAP);
            let y = oy + (i / PER_ROW) * (BTN_H + 1);
            let locked = w.is_locked(n);
            let cleared = n < w.unlocked;
            let selected = n == w.select_cursor;

            let fg = if locked {
                DIM
            } else if cleared {
                PLAYER
            } else {
                GOLD_TEXT
            };
            let bg = if selected { BUTTON_HOT } else if locked { BASE_BG } else { BUTTON_BG };

            self.front.fill(x, y, BTN_W, BTN_H, bg);
            self.front.frame(x, y, BTN_W, BTN_H, fg, bg);
            let label = if locked { "--".to_string() } else { format!("{n:02}") };
            self.front.put_str(x + (BTN_W - label.len()) / 2, y + 1, &label, fg, bg);

            if !locked {
                self.hotspots.push(Hotspot { x, y, w: BTN_W, h: BTN_H, action: Action::PickLevel(n) });
            }
        }

        let rows = (w.max_level as usize).div_ceil(PER_ROW);
        let below = oy + rows * (BTN_H + 1) + 1;
        let bx = self.front.width.saturating_sub(12) / 2;
        self.push_button(bx, below, 12, "BACK", Action::Back, false);
        self.front.put_centered(
            below + 2,
            "←↑↓→ choose   ENTER play   1-9 quick pick   ESC back",
            DIM,
            BASE_BG,
        );
    }

    fn maze_view(&self, w: &WorldState) -> MazeView {
        let area_x = PANEL_W + 1;
        let area = (
            area_x,
            0,
            self.front.width.saturating_sub(area_x),
            self.front.height.saturating_sub(1),
        );
        MazeView::fit(area, (w.grid.width(), w.grid.height()), w.player.pos())
    }

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_panel(w);

        let view = self.maze_view(w);
        for vy in 0..view.rows {
            for vx in 0..view.cols {
                let (gx, gy) = (view.first_x + vx, view.first_y + vy);
                let (col, row) = (view.col + vx * CELL_W, view.row + vy);
                self.compose_maze_cell(w, gx, gy, col, row);
            }
        }

        if w.show_hint {
            for &(x, y) in &w.hint_path {
                if w.grid.at(x, y).is_goal() { continue; }
                if let Some((c, r)) = view.to_screen(x, y) {
                    let bg = self.front.get(c, r).bg;
                    self.front.set(c, r, Cell { ch: '·', fg: rgb(HINT), bg });
                    self.front.set(c + 1, r, Cell { ch: '·', fg: rgb(HINT), bg });
                }
            }
        }

        let (px, py) = w.player.pos();
        if let Some((c, r)) = view.to_screen(px, py) {
            self.front.set(c, r, Cell::new('(', BASE_BG, PLAYER));
            self.front.set(c + 1, r, Cell::new(')', BASE_BG, PLAYER));
        }
    }

    fn compose_maze_cell(&mut self, w: &WorldState, gx: usize, gy: usize, col: usize, row: usize) {
        let bump = self.effects.bump_flash()
            .filter(|b| b.x == gx as i32 && b.y == gy as i32)
            .map(|b| b.frames_left as f32 / 8.0);

        let bg = match w.grid.at(gx, gy) {
            MazeCell::Wall => {
                let base = if self.display.glow && touches_open(w, gx, gy) { WALL_GLOW } else { WALL };
                match bump {
                    Some(t) => lerp(base, BUMP, t),
                    None => base,
                }
            }
            MazeCell::Goal => {
                let phase = (w.anim_tick % 60) as f32 / 60.0 * std::f32::consts::TAU;
                lerp(GOAL_A, GOAL_B, (phase.sin() + 1.0) / 2.0)
            }
            MazeCell::Path => {
                // trail: newest cells glow brightest
                let n = w.trail.len();
                match w.trail.iter().rposition(|&p| p == (gx, gy)) {
                    Some(i) => lerp(BASE_BG, (40, 90, 60), (i + 1) as f32 / n as f32),
                    None => BASE_BG,
                }
            }
        };
        self.front.set(col, row, Cell::new(' ', DIM, bg));
        self.front.set(col + 1, row, Cell::new(' ', DIM, bg));
    }

    fn compose_panel(&mut self, w: &WorldState) {
        let h = self.front.height.saturating_sub(1);
        self.front.fill(0, 0, PANEL_W, h, PANEL_BG);
        self.front.put_str(2, 1, "MAZE RUNNER", GOLD_TEXT, PANEL_BG);

        let (mode, detail) = match w.mode {
            Mode::Campaign { level } => (
                format!("LEVEL {level:02} / {}", w.max_level),
                format!("{}x{}", w.grid.width(), w.grid.height()),
            ),
            Mode::Endless { round, size } => (format!("ENDLESS  #{round}"), format!("{size}x{size}")),
        };
        self.front.put_str(2, 3, &mode, (235, 235, 245), PANEL_BG);
        self.front.put_str(2, 4, &detail, DIM, PANEL_BG);

        self.front.put_str(2, 6, "MOVES", DIM, PANEL_BG);
        self.front.put_str(2, 7, &w.move_count.to_string(), (235, 235, 245), PANEL_BG);
        self.front.put_str(2, 9, "TIME", DIM, PANEL_BG);
        self.front.put_str(2, 10, &format_time(w.elapsed), (235, 235, 245), PANEL_BG);

        let hint = if w.show_hint {
            format!("HINT  {} steps", w.hint_path.len())
        } else {
            "HINT  off".to_string()
        };
        self.front.put_str(2, 12, &hint, HINT, PANEL_BG);

        let bw = PANEL_W - 4;
        self.push_button(2, 14, bw, "H  HINT", Action::ToggleHint, w.show_hint);
        self.push_button(2, 16, bw, "R  RETRY", Action::Retry, false);
        self.push_button(2, 18, bw, "ESC  BACK", Action::Back, false);

        if self.pad_connected {
            self.front.put_str(PANEL_W - 5, 1, "PAD", PLAYER, PANEL_BG);
        }

        self.compose_minimap(w, 20);
    }

    /// Whole-maze overview below the panel buttons. Each map cell stands for
    /// a `scale × scale` block of the maze, scaled to fit the panel.
    fn compose_minimap(&mut self, w: &WorldState, top: usize) {
        let bottom = self.front.height.saturating_sub(1);
        let avail_w = PANEL_W - 4;
        let avail_h = bottom.saturating_sub(top + 2);
        let (gw, gh) = (w.grid.width(), w.grid.height());
        if avail_h == 0 || gw == 0 || gh == 0 {
            return;
        }

        let scale = gw.div_ceil(avail_w).max(gh.div_ceil(avail_h)).max(1);
        let (cols, rows) = (gw.div_ceil(scale), gh.div_ceil(scale));
        let ox = 2 + avail_w.saturating_sub(cols) / 2;
        let oy = top + 1;
        let player = w.player.pos();

        self.front.put_str(2, top, "MAP", DIM, PANEL_BG);
        for my in 0..rows {
            for mx in 0..cols {
                let xs = mx * scale..((mx + 1) * scale).min(gw);
                let ys = my * scale..((my + 1) * scale).min(gh);
                let area = xs.len() * ys.len();

                let (mut open, mut goal, mut here) = (0, false, false);
                for y in ys {
                    for x in xs.clone() {
                        let cell = w.grid.at(x, y);
                        if cell.is_passable() { open += 1; }
                        goal |= cell.is_goal();
                        here |= (x, y) == player;
                    }
                }

                let mark = if here {
                    Cell::new('@', BASE_BG, PLAYER)
                } else if goal {
                    Cell::new('G', BASE_BG, GOAL_A)
                } else if open * 2 >= area {
                    Cell::new(' ', DIM, BASE_BG)
                } else {
                    Cell::new(' ', DIM, WALL)
                };
                self.front.set(ox + mx, oy + my, mark);
            }
        }
    }

    fn compose_complete_overlay(&mut self, w: &WorldState) {
        let (bw, bh) = (34, 11);
        let bx = self.front.width.saturating_sub(bw) / 2;
        let by = self.front.height.saturating_sub(bh) / 2;
        self.front.fill(bx, by, bw, bh, PANEL_BG);
        self.front.frame(bx, by, bw, bh, GOLD_TEXT, PANEL_BG);

        let (title, next_label, back_label) = match w.mode {
            Mode::Campaign { level } if level >= w.max_level => {
                ("ALL LEVELS CLEAR".to_string(), "N  REPLAY", "ESC  LEVELS")
            }
            Mode::Campaign { level } => (format!("LEVEL {level} CLEAR"), "N  NEXT", "ESC  LEVELS"),
            Mode::Endless { round, .. } => (format!("ROUND {round} CLEAR"), "N  NEXT ROUND", "ESC  MENU"),
        };
        let center = |s: &str| bx + bw.saturating_sub(s.chars().count()) / 2;
        self.front.put_str(center(&title), by + 1, &title, GOLD_TEXT, PANEL_BG);

        let stats = format!("moves {}   time {}", w.move_count, format_time(w.elapsed));
        self.front.put_str(center(&stats), by + 3, &stats, (235, 235, 245), PANEL_BG);

        if let Mode::Campaign { level } = w.mode {
            if w.unlocked > level {
                let unlocked = format!("level {} unlocked", level + 1);
                self.front.put_str(center(&unlocked), by + 4, &unlocked, PLAYER, PANEL_BG);
            }
        }

        self.push_button(bx + 4, by + 6, bw - 8, next_label, Action::Next, true);
        self.push_button(bx + 4, by + 8, bw - 8, back_label, Action::Back, false);
    }

    fn compose_particles(&mut self) {
        for p in self.effects.particles() {
            if p.x < 0.0 || p.y < 0.0 { continue; }
            let (x, y) = (p.x as usize, p.y as usize);
            if x >= self.front.width || y >= self.front.height { continue; }
            let bg = self.front.get(x, y).bg;
            let fg = lerp(BASE_BG, p.color, p.strength());
            self.front.set(x, y, Cell { ch: p.ch, fg: rgb(fg), bg });
        }
    }

    /// Bottom row: the world's message if any, else the freshest log notice.
    fn compose_message_line(&mut self, w: &WorldState) {
        let row = match self.front.height.checked_sub(1) {
            Some(r) => r,
            None => return,
        };
        if !w.message.is_empty() {
            let bar = (200, 180, 50);
            self.front.fill(0, row, self.front.width, 1, bar);
            self.front.put_str(1, row, &format!("◈ {}", w.message), (0, 0, 0), bar);
        } else if let Some(note) = logging::get_logger().latest_notice() {
            let fg = match note.level {
                log::Level::Error => BUMP,
                log::Level::Warn => GOLD_TEXT,
                _ => DIM,
            };
            self.front.put_str(1, row, &note.message, fg, BASE_BG);
        }
    }
}

fn touches_open(w: &WorldState, x: usize, y: usize) -> bool {
    let (x, y) = (x as i32, y as i32);
    [(0, -1), (1, 0), (0, 1), (-1, 0)]
        .iter()
        .any(|&(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            w.grid.is_valid_position(nx, ny) && !w.grid.is_wall(nx, ny)
        })
}
