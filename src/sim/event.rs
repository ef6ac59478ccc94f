/// Events emitted by game-rule operations.
/// The presentation layer consumes these for effects and messages;
/// the entry point consumes unlocks to persist progress.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Moved { from: (usize, usize), to: (usize, usize) },
    Bumped { x: i32, y: i32 },
    GoalReached { x: usize, y: usize },
    LevelUnlocked { level: u32 },
    LevelStarted { level: u32 },
    /// `size` is the generated width: odd requests as-is, even ones plus one.
    EndlessStarted { round: u32, size: usize },
    HintShown { steps: usize },
    HintHidden,
}
