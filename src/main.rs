/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use rand::Rng;

use config::GameConfig;
use domain::player::MoveDir;
use sim::event::GameEvent;
use sim::level::LevelError;
use sim::progress::Progress;
use sim::step;
use sim::world::{MenuItem, Phase, WorldState, MENU_ITEMS};
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState, KeyMap};
use ui::renderer::Renderer;

/// Level-select rows hold this many buttons; Up/Down jump a full row.
const SELECT_ROW: u32 = 5;
const ERROR_MESSAGE_FRAMES: u32 = 120;

fn main() {
    let config = GameConfig::load();

    if let Err(e) = logging::init(config.log_level) {
        eprintln!("Logger init failed: {e}");
    }

    let mut progress = Progress::load(&config.save_dir, config.max_level);
    let mut world = WorldState::new(progress.unlocked(), config.max_level, config.trail_length);

    let mut renderer = Renderer::new(&config.display);

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &mut progress, &config);
    let saved = progress.save();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }
    match saved {
        Ok(()) => println!("Progress saved to {}", progress.path().display()),
        Err(e) => eprintln!("{e}"),
    }

    println!();
    println!("Thanks for playing Maze Runner!");
    println!("Levels unlocked: {} / {}", progress.unlocked(), config.max_level);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    progress: &mut Progress,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new(KeyMap::default());
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut rng = rand::thread_rng();

    let frame = Duration::from_secs(1) / config.frame_rate;
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        let clicks: Vec<Action> = kb.clicks.iter()
            .filter_map(|&(col, row)| renderer.hit_test(col, row))
            .collect();
        let mut actions = std::mem::take(&mut kb.actions);
        actions.extend(gp.actions());

        let mut events = Vec::new();
        let quit = dispatch_frame(world, &clicks, &actions, config, &mut rng, &mut events);

        renderer.set_pad_connected(gp.connected);
        renderer.handle_events(world, &events);
        persist_unlocks(progress, &events);
        if quit {
            break;
        }

        let now = Instant::now();
        step::tick(world, now - last_frame);
        last_frame = now;

        renderer.render(world)?;

        // Fixed frame pacing: sleep whatever is left of this frame.
        std::thread::sleep(frame.saturating_sub(last_frame.elapsed()));
    }

    Ok(())
}

/// Write progress as soon as a level unlocks. A failed write is logged and
/// retried by the save at shutdown.
fn persist_unlocks(progress: &mut Progress, events: &[GameEvent]) {
    for ev in events {
        if let GameEvent::LevelUnlocked { level } = ev {
            if let Err(e) = progress.unlock(*level) {
                log::warn!("{e}");
            }
        }
    }
}

/// Fold the outcome of a level change into this frame's events. Failures
/// leave the world as it was and go to the message line.
fn apply(world: &mut WorldState, result: Result<Vec<GameEvent>, LevelError>, events: &mut Vec<GameEvent>) {
    match result {
        Ok(evs) => events.extend(evs),
        Err(e) => {
            log::warn!("{e}");
            world.set_message(&e.to_string(), ERROR_MESSAGE_FRAMES);
        }
    }
}

/// Run one frame's input. Clicks were hit-tested against the screen drawn
/// last frame, so they go first and stop counting once the phase moves on.
/// Returns true when the player asked to quit.
fn dispatch_frame<R: Rng + ?Sized>(
    world: &mut WorldState,
    clicks: &[Action],
    actions: &[Action],
    config: &GameConfig,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> bool {
    let drawn = world.phase;
    for &action in clicks {
        if world.phase != drawn {
            break;
        }
        if handle_action(world, action, config, rng, events) {
            return true;
        }
    }
    actions.iter().any(|&action| handle_action(world, action, config, rng, events))
}

/// Returns true when the player asked to quit.
fn handle_action<R: Rng + ?Sized>(
    world: &mut WorldState,
    action: Action,
    config: &GameConfig,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> bool {
    match world.phase {
        Phase::Title => return handle_title(world, action, config, rng, events),
        Phase::LevelSelect => handle_level_select(world, action, config, events),
        Phase::Playing => handle_playing(world, action, config, rng, events),
        Phase::LevelComplete | Phase::EndlessComplete => {
            handle_complete(world, action, config, rng, events)
        }
    }
    false
}

// ── Title ──

fn open_level_select(world: &mut WorldState) {
    world.select_cursor = world.select_cursor.clamp(1, world.unlocked);
    world.phase = Phase::LevelSelect;
}

fn return_to_title(world: &mut WorldState) {
    world.show_hint = false;
    world.hint_path.clear();
    world.phase = Phase::Title;
}

fn handle_title<R: Rng + ?Sized>(
    world: &mut WorldState,
    action: Action,
    config: &GameConfig,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> bool {
    let n = MENU_ITEMS.len();
    let item = match action {
        Action::Move(MoveDir::Up) => {
            world.title_cursor = (world.title_cursor + n - 1) % n;
            return false;
        }
        Action::Move(MoveDir::Down) => {
            world.title_cursor = (world.title_cursor + 1) % n;
            return false;
        }
        Action::Confirm => MENU_ITEMS[world.title_cursor.min(n - 1)],
        Action::Digit(1) | Action::OpenLevels => MenuItem::Levels,
        Action::Digit(2) | Action::OpenEndless => MenuItem::Endless,
        Action::Quit | Action::Back => MenuItem::Quit,
        _ => return false,
    };

    match item {
        MenuItem::Levels => open_level_select(world),
        MenuItem::Endless => {
            let result = step::start_endless(world, config, rng);
            apply(world, result, events);
        }
        MenuItem::Quit => return true,
    }
    false
}

// ── Level select ──

fn handle_level_select(
    world: &mut WorldState,
    action: Action,
    config: &GameConfig,
    events: &mut Vec<GameEvent>,
) {
    let max = world.max_level;
    let cursor = world.select_cursor;
    let pick = match action {
        Action::Move(MoveDir::Left) => {
            world.select_cursor = cursor.saturating_sub(1).max(1);
            None
        }
        Action::Move(MoveDir::Right) => {
            world.select_cursor = (cursor + 1).min(max);
            None
        }
        Action::Move(MoveDir::Up) => {
            world.select_cursor = cursor.saturating_sub(SELECT_ROW).max(1);
            None
        }
        Action::Move(MoveDir::Down) => {
            world.select_cursor = (cursor + SELECT_ROW).min(max);
            None
        }
        Action::Confirm => Some(cursor),
        Action::Digit(n) | Action::PickLevel(n) => Some(n),
        Action::Back | Action::Quit => {
            return_to_title(world);
            None
        }
        _ => None,
    };

    if let Some(level) = pick {
        let result = step::select_level(world, level, config);
        apply(world, result, events);
    }
}

// ── Playing ──

fn handle_playing<R: Rng + ?Sized>(
    world: &mut WorldState,
    action: Action,
    config: &GameConfig,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    match action {
        Action::Move(dir) => events.extend(step::apply_move(world, dir)),
        Action::ToggleHint => events.extend(step::toggle_hint(world)),
        Action::Retry => {
            let result = step::retry(world, config, rng);
            apply(world, result, events);
        }
        Action::Back | Action::Quit => leave_maze(world),
        _ => {}
    }
}

/// Campaign mazes return to level select, endless ones to the title.
fn leave_maze(world: &mut WorldState) {
    match world.current_level() {
        Some(_) => open_level_select(world),
        None => return_to_title(world),
    }
}

// ── Cleared ──

fn handle_complete<R: Rng + ?Sized>(
    world: &mut WorldState,
    action: Action,
    config: &GameConfig,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    match action {
        Action::Confirm | Action::Next => {
            let result = step::next_stage(world, config, rng);
            apply(world, result, events);
        }
        Action::Retry => {
            let result = step::retry(world, config, rng);
            apply(world, result, events);
        }
        Action::Back | Action::Quit => leave_maze(world),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> GameConfig {
        let dir = std::env::temp_dir()
            .join(format!("mazerunner-main-nolevels-{}", std::process::id()));
        GameConfig { levels_dir: dir, ..GameConfig::default() }
    }

    fn run(world: &mut WorldState, actions: &[Action]) -> (Vec<GameEvent>, bool) {
        let cfg = config();
        let mut rng = StdRng::seed_from_u64(9);
        let mut events = Vec::new();
        for &a in actions {
            if handle_action(world, a, &cfg, &mut rng, &mut events) {
                return (events, true);
            }
        }
        (events, false)
    }

    #[test]
    fn title_menu_navigation() {
        let mut w = WorldState::new(1, 20, 4);
        run(&mut w, &[Action::Move(MoveDir::Down)]);
        assert_eq!(w.title_cursor, 1);
        run(&mut w, &[Action::Move(MoveDir::Up), Action::Move(MoveDir::Up)]);
        assert_eq!(w.title_cursor, MENU_ITEMS.len() - 1);
        let (_, quit) = run(&mut w, &[Action::Confirm]);
        assert!(quit);
    }

    #[test]
    fn digit_one_opens_level_select_and_digit_plays() {
        let mut w = WorldState::new(2, 20, 4);
        run(&mut w, &[Action::Digit(1)]);
        assert_eq!(w.phase, Phase::LevelSelect);
        let (events, _) = run(&mut w, &[Action::Digit(2)]);
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 2 }]);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.current_level(), Some(2));
    }

    #[test]
    fn locked_level_shows_message_and_stays() {
        let mut w = WorldState::new(1, 20, 4);
        run(&mut w, &[Action::OpenLevels, Action::PickLevel(7)]);
        assert_eq!(w.phase, Phase::LevelSelect);
        assert!(!w.message.is_empty());
    }

    #[test]
    fn select_cursor_is_clamped() {
        let mut w = WorldState::new(1, 20, 4);
        run(&mut w, &[Action::OpenLevels, Action::Move(MoveDir::Left), Action::Move(MoveDir::Up)]);
        assert_eq!(w.select_cursor, 1);
        for _ in 0..10 {
            run(&mut w, &[Action::Move(MoveDir::Down)]);
        }
        assert_eq!(w.select_cursor, 20);
    }

    #[test]
    fn endless_from_title_and_back() {
        let mut w = WorldState::new(1, 20, 4);
        let (events, _) = run(&mut w, &[Action::OpenEndless]);
        assert!(matches!(events[0], GameEvent::EndlessStarted { round: 1, .. }));
        assert_eq!(w.phase, Phase::Playing);
        run(&mut w, &[Action::Back]);
        assert_eq!(w.phase, Phase::Title);
    }

    #[test]
    fn back_from_campaign_returns_to_select() {
        let mut w = WorldState::new(1, 20, 4);
        run(&mut w, &[Action::OpenLevels, Action::Confirm]);
        assert_eq!(w.phase, Phase::Playing);
        run(&mut w, &[Action::Back]);
        assert_eq!(w.phase, Phase::LevelSelect);
    }

    #[test]
    fn hint_and_moves_only_apply_while_playing() {
        let mut w = WorldState::new(1, 20, 4);
        let (events, _) = run(&mut w, &[Action::ToggleHint]);
        assert!(events.is_empty());
        run(&mut w, &[Action::OpenLevels, Action::Confirm]);
        let (events, _) = run(&mut w, &[Action::ToggleHint]);
        assert!(matches!(events[0], GameEvent::HintShown { .. }));
        assert!(w.show_hint);
    }

    #[test]
    fn stale_clicks_are_dropped_after_phase_change() {
        let mut w = WorldState::new(1, 20, 4);
        let cfg = config();
        let mut rng = StdRng::seed_from_u64(3);
        let mut events = Vec::new();
        // second click lands where QUIT was drawn on the title screen
        let quit = dispatch_frame(
            &mut w,
            &[Action::OpenLevels, Action::Quit],
            &[],
            &cfg,
            &mut rng,
            &mut events,
        );
        assert!(!quit);
        assert_eq!(w.phase, Phase::LevelSelect);
    }

    #[test]
    fn clicks_run_before_keys() {
        let mut w = WorldState::new(1, 20, 4);
        let cfg = config();
        let mut rng = StdRng::seed_from_u64(3);
        let mut events = Vec::new();
        // the click opens level select, then Enter plays the cursor level
        dispatch_frame(&mut w, &[Action::OpenLevels], &[Action::Confirm], &cfg, &mut rng, &mut events);
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 1 }]);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn unlock_events_are_persisted() {
        let dir = std::env::temp_dir()
            .join(format!("mazerunner-main-progress-{}", std::process::id()));
        let mut progress = Progress::load(&dir, 20);
        persist_unlocks(&mut progress, &[GameEvent::LevelUnlocked { level: 2 }]);
        assert_eq!(progress.unlocked(), 2);
        assert_eq!(Progress::load(&dir, 20).unlocked(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
