/// Game-rule operations: everything that changes a running maze.
///
/// Processing order for a move:
///   1. Movement (wall / bounds check on the player)
///   2. Session stats (move count, trail)
///   3. Hint refresh (old path discarded, recomputed if the hint is on)
///   4. Goal check (unlock + phase change)
///
/// All operations return the events they produced. Progress persistence
/// belongs to the caller: a `LevelUnlocked` event means `world.unlocked`
/// was raised and should be written out.

use std::time::Duration;

use rand::Rng;

use crate::config::GameConfig;
use crate::domain::pathfinder::find_path;
use crate::domain::player::MoveDir;
use super::event::GameEvent;
use super::level::{self, LevelError};
use super::world::{Mode, Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

pub fn apply_move(world: &mut WorldState, dir: MoveDir) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events = Vec::new();
    let from = world.player.pos();

    if !world.player.move_by(&world.grid, dir) {
        let (dx, dy) = dir.delta();
        events.push(GameEvent::Bumped { x: from.0 as i32 + dx, y: from.1 as i32 + dy });
        return events;
    }

    world.move_count += 1;
    world.push_trail(from);
    events.push(GameEvent::Moved { from, to: world.player.pos() });

    refresh_hint(world);
    resolve_goal(world, &mut events);
    events
}

/// Drop the stale hint path; rebuild it from the player if the hint is on.
fn refresh_hint(world: &mut WorldState) {
    world.hint_path.clear();
    if world.show_hint {
        world.hint_path = find_path(&world.grid, world.player.pos());
    }
}

fn resolve_goal(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.has_reached_goal(&world.grid) { return; }

    let (x, y) = world.player.pos();
    events.push(GameEvent::GoalReached { x, y });
    world.anim_tick = 0;

    match world.mode {
        Mode::Campaign { level } => {
            if level == world.unlocked && world.unlocked < world.max_level {
                world.unlocked += 1;
                events.push(GameEvent::LevelUnlocked { level: world.unlocked });
            }
            world.phase = Phase::LevelComplete;
            log::info!("level {level} cleared in {} moves", world.move_count);
        }
        Mode::Endless { round, .. } => {
            world.phase = Phase::EndlessComplete;
            log::info!("endless round {round} cleared in {} moves", world.move_count);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Hint
// ══════════════════════════════════════════════════════════════

pub fn toggle_hint(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    world.show_hint = !world.show_hint;
    if world.show_hint {
        world.hint_path = find_path(&world.grid, world.player.pos());
        vec![GameEvent::HintShown { steps: world.hint_path.len() }]
    } else {
        world.hint_path.clear();
        vec![GameEvent::HintHidden]
    }
}

// ══════════════════════════════════════════════════════════════
// Per-frame timers
// ══════════════════════════════════════════════════════════════

/// Advance animation and message timers; the play clock only runs while
/// a maze is being played.
pub fn tick(world: &mut WorldState, dt: Duration) {
    world.anim_tick = world.anim_tick.wrapping_add(1);

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    if world.phase == Phase::Playing {
        world.elapsed += dt;
    }
}

// ══════════════════════════════════════════════════════════════
// Stage transitions
// ══════════════════════════════════════════════════════════════

/// Campaign level picked from the level-select screen.
pub fn select_level(
    world: &mut WorldState,
    level: u32,
    config: &GameConfig,
) -> Result<Vec<GameEvent>, LevelError> {
    let events = level::load_level(world, level, config)?;
    world.select_cursor = level;
    Ok(events)
}

/// Start endless mode from round 1.
pub fn start_endless<R: Rng + ?Sized>(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut R,
) -> Result<Vec<GameEvent>, LevelError> {
    level::start_endless(world, 1, config, rng)
}

/// Restart the current maze: reload the level or regenerate the round.
pub fn retry<R: Rng + ?Sized>(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut R,
) -> Result<Vec<GameEvent>, LevelError> {
    match world.mode {
        Mode::Campaign { level } => level::load_level(world, level, config),
        Mode::Endless { round, .. } => level::start_endless(world, round, config, rng),
    }
}

/// Move on from a cleared maze: next campaign level (the last one repeats)
/// or the next endless round.
pub fn next_stage<R: Rng + ?Sized>(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut R,
) -> Result<Vec<GameEvent>, LevelError> {
    match world.mode {
        Mode::Campaign { level } => {
            let next = (level + 1).min(world.max_level);
            let events = level::load_level(world, next, config)?;
            world.select_cursor = next;
            Ok(events)
        }
        Mode::Endless { round, .. } => level::start_endless(world, round + 1, config, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Grid;
    use crate::domain::player::Player;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLE: &str = "#####\n#P.G#\n#.#.#\n#...#\n#####";

    fn world_with(level: u32, unlocked: u32) -> WorldState {
        let mut w = WorldState::new(unlocked, 20, 4);
        let g = Grid::parse(SAMPLE).unwrap();
        let p = Player::spawn(&g).unwrap();
        w.install_maze(g, p, Mode::Campaign { level });
        w
    }

    /// Config whose levels dir is empty, so campaign loads hit the built-in levels.
    fn embedded_config() -> GameConfig {
        let dir = std::env::temp_dir()
            .join(format!("mazerunner-step-nolevels-{}", std::process::id()));
        GameConfig { levels_dir: dir, ..GameConfig::default() }
    }

    #[test]
    fn move_updates_stats_and_trail() {
        let mut w = world_with(1, 1);
        let events = apply_move(&mut w, MoveDir::Down);
        assert_eq!(events, vec![GameEvent::Moved { from: (1, 1), to: (1, 2) }]);
        assert_eq!(w.move_count, 1);
        assert_eq!(w.trail.back(), Some(&(1, 1)));
    }

    #[test]
    fn bump_costs_nothing() {
        let mut w = world_with(1, 1);
        let events = apply_move(&mut w, MoveDir::Up);
        assert_eq!(events, vec![GameEvent::Bumped { x: 1, y: 0 }]);
        assert_eq!(w.move_count, 0);
        assert_eq!(w.player.pos(), (1, 1));
        assert!(w.trail.is_empty());
    }

    #[test]
    fn moves_ignored_outside_play() {
        let mut w = world_with(1, 1);
        w.phase = Phase::LevelSelect;
        assert!(apply_move(&mut w, MoveDir::Right).is_empty());
        assert_eq!(w.player.pos(), (1, 1));
    }

    #[test]
    fn reaching_goal_unlocks_next_level() {
        let mut w = world_with(1, 1);
        apply_move(&mut w, MoveDir::Right);
        let events = apply_move(&mut w, MoveDir::Right);
        assert!(events.contains(&GameEvent::GoalReached { x: 3, y: 1 }));
        assert!(events.contains(&GameEvent::LevelUnlocked { level: 2 }));
        assert_eq!(w.unlocked, 2);
        assert_eq!(w.phase, Phase::LevelComplete);
        assert_eq!(w.move_count, 2);
    }

    #[test]
    fn replaying_old_level_unlocks_nothing() {
        let mut w = world_with(1, 5);
        apply_move(&mut w, MoveDir::Right);
        let events = apply_move(&mut w, MoveDir::Right);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelUnlocked { .. })));
        assert_eq!(w.unlocked, 5);
        assert_eq!(w.phase, Phase::LevelComplete);
    }

    #[test]
    fn last_level_unlocks_nothing() {
        let mut w = world_with(20, 20);
        apply_move(&mut w, MoveDir::Right);
        let events = apply_move(&mut w, MoveDir::Right);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelUnlocked { .. })));
        assert_eq!(w.unlocked, 20);
    }

    #[test]
    fn endless_goal_ends_round() {
        let mut w = WorldState::new(1, 20, 4);
        let g = Grid::parse(SAMPLE).unwrap();
        let p = Player::spawn(&g).unwrap();
        w.install_maze(g, p, Mode::Endless { round: 2, size: 5 });
        apply_move(&mut w, MoveDir::Right);
        let events = apply_move(&mut w, MoveDir::Right);
        assert!(events.contains(&GameEvent::GoalReached { x: 3, y: 1 }));
        assert_eq!(w.phase, Phase::EndlessComplete);
        assert_eq!(w.unlocked, 1);
    }

    #[test]
    fn hint_toggles_and_follows_player() {
        let mut w = world_with(1, 1);
        assert_eq!(toggle_hint(&mut w), vec![GameEvent::HintShown { steps: 2 }]);
        assert_eq!(w.hint_path, vec![(2, 1), (3, 1)]);

        apply_move(&mut w, MoveDir::Right);
        assert_eq!(w.hint_path, vec![(3, 1)]);

        assert_eq!(toggle_hint(&mut w), vec![GameEvent::HintHidden]);
        assert!(w.hint_path.is_empty());
    }

    #[test]
    fn hidden_hint_is_discarded_on_move() {
        let mut w = world_with(1, 1);
        w.hint_path = vec![(2, 1), (3, 1)];
        apply_move(&mut w, MoveDir::Down);
        assert!(w.hint_path.is_empty());
    }

    #[test]
    fn clock_runs_only_while_playing() {
        let mut w = world_with(1, 1);
        tick(&mut w, Duration::from_millis(500));
        tick(&mut w, Duration::from_millis(500));
        assert_eq!(w.elapsed, Duration::from_secs(1));

        w.phase = Phase::LevelComplete;
        tick(&mut w, Duration::from_secs(3));
        assert_eq!(w.elapsed, Duration::from_secs(1));
    }

    #[test]
    fn message_expires() {
        let mut w = world_with(1, 1);
        w.set_message("hello", 2);
        tick(&mut w, Duration::ZERO);
        assert_eq!(w.message, "hello");
        tick(&mut w, Duration::ZERO);
        assert!(w.message.is_empty());
    }

    #[test]
    fn retry_resets_campaign_level() {
        let config = embedded_config();
        let mut rng = StdRng::seed_from_u64(1);
        let mut w = WorldState::new(1, 20, 4);
        select_level(&mut w, 1, &config).unwrap();
        apply_move(&mut w, MoveDir::Right);
        toggle_hint(&mut w);

        let events = retry(&mut w, &config, &mut rng).unwrap();
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 1 }]);
        assert_eq!(w.player.pos(), (1, 1));
        assert_eq!(w.move_count, 0);
        assert!(!w.show_hint);
    }

    #[test]
    fn next_stage_after_unlock() {
        let config = embedded_config();
        let mut rng = StdRng::seed_from_u64(1);
        let mut w = world_with(1, 1);
        apply_move(&mut w, MoveDir::Right);
        apply_move(&mut w, MoveDir::Right);

        let events = next_stage(&mut w, &config, &mut rng).unwrap();
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 2 }]);
        assert_eq!(w.mode, Mode::Campaign { level: 2 });
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn locked_level_cannot_be_selected() {
        let config = embedded_config();
        let mut w = world_with(1, 1);
        assert!(matches!(select_level(&mut w, 3, &config), Err(LevelError::Locked(3))));
        assert_eq!(w.mode, Mode::Campaign { level: 1 });
    }

    #[test]
    fn endless_rounds_grow() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut w = WorldState::new(1, 20, 4);
        start_endless(&mut w, &config, &mut rng).unwrap();
        assert_eq!(w.mode, Mode::Endless { round: 1, size: 5 });

        let events = next_stage(&mut w, &config, &mut rng).unwrap();
        assert_eq!(events, vec![GameEvent::EndlessStarted { round: 2, size: 7 }]);

        retry(&mut w, &config, &mut rng).unwrap();
        assert_eq!(w.mode, Mode::Endless { round: 2, size: 7 });
    }

    #[test]
    fn generated_maze_is_walkable_to_goal() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(12);
        let mut w = WorldState::new(1, 20, 4);
        start_endless(&mut w, &config, &mut rng).unwrap();
        toggle_hint(&mut w);

        let route = w.hint_path.clone();
        for &(x, y) in &route {
            let (px, py) = w.player.pos();
            let dir = match (x as i32 - px as i32, y as i32 - py as i32) {
                (0, -1) => MoveDir::Up,
                (0, 1) => MoveDir::Down,
                (-1, 0) => MoveDir::Left,
                _ => MoveDir::Right,
            };
            apply_move(&mut w, dir);
        }
        assert_eq!(w.phase, Phase::EndlessComplete);
        assert_eq!(w.move_count as usize, route.len());
    }
}
