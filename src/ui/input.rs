/// Input state tracker.
///
/// Maze movement is one cell per key press, so every Press / Repeat event
/// becomes one `Action` through the `KeyMap`. Release events are ignored.
/// Left mouse clicks are collected as raw terminal cells; the renderer's
/// hotspot list turns them into actions.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::player::MoveDir;

/// Everything the player can ask for, independent of the device.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(MoveDir),
    Confirm,
    Back,
    ToggleHint,
    Retry,
    /// Number key; meaning depends on the screen (menu entry or level).
    Digit(u32),
    /// Level button clicked on the select screen.
    PickLevel(u32),
    OpenLevels,
    OpenEndless,
    Next,
    Quit,
}

// ── Key → action table ──

pub struct KeyMap {
    bindings: Vec<(KeyCode, Action)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        use Action::*;
        let mut bindings = vec![
            (KeyCode::Up, Move(MoveDir::Up)),
            (KeyCode::Down, Move(MoveDir::Down)),
            (KeyCode::Left, Move(MoveDir::Left)),
            (KeyCode::Right, Move(MoveDir::Right)),
            (KeyCode::Char('w'), Move(MoveDir::Up)),
            (KeyCode::Char('s'), Move(MoveDir::Down)),
            (KeyCode::Char('a'), Move(MoveDir::Left)),
            (KeyCode::Char('d'), Move(MoveDir::Right)),
            (KeyCode::Enter, Confirm),
            (KeyCode::Char(' '), Confirm),
            (KeyCode::Esc, Back),
            (KeyCode::Backspace, Back),
            (KeyCode::Char('h'), ToggleHint),
            (KeyCode::Char('r'), Retry),
            (KeyCode::Char('n'), Next),
            (KeyCode::Char('q'), Quit),
        ];
        for n in 1..=9 {
            if let Some(ch) = char::from_digit(n, 10) {
                bindings.push((KeyCode::Char(ch), Digit(n)));
            }
        }
        KeyMap { bindings }
    }
}

impl KeyMap {
    /// Letters match regardless of case (Shift or Caps Lock held).
    pub fn lookup(&self, code: KeyCode) -> Option<Action> {
        let code = match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        self.bindings.iter().find(|(k, _)| *k == code).map(|&(_, a)| a)
    }
}

// ── Per-frame state ──

pub struct InputState {
    keymap: KeyMap,

    /// Actions produced by key presses during the last `drain_events()`.
    pub actions: Vec<Action>,

    /// Left clicks (column, row) during the last `drain_events()`.
    pub clicks: Vec<(u16, u16)>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new(keymap: KeyMap) -> Self {
        InputState {
            keymap,
            actions: Vec::with_capacity(8),
            clicks: Vec::with_capacity(2),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.actions.clear();
        self.clicks.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle_event(ev),
                Err(e) => {
                    log::warn!("input read failed: {e}");
                    break;
                }
            }
        }
    }

    pub fn handle_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => {
                self.raw_events.push(key);
                if key.kind == KeyEventKind::Release {
                    return;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return;
                }
                if let Some(action) = self.keymap.lookup(key.code) {
                    self.actions.push(action);
                }
            }
            Event::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                    self.clicks.push((mouse.column, mouse.row));
                }
            }
            _ => {}
        }
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn press(code: KeyCode) -> Event {
        key(code, KeyEventKind::Press)
    }

    #[test]
    fn arrows_and_wasd_move() {
        let map = KeyMap::default();
        assert_eq!(map.lookup(KeyCode::Up), Some(Action::Move(MoveDir::Up)));
        assert_eq!(map.lookup(KeyCode::Char('a')), Some(Action::Move(MoveDir::Left)));
        assert_eq!(map.lookup(KeyCode::Char('D')), Some(Action::Move(MoveDir::Right)));
    }

    #[test]
    fn digits_map_to_levels() {
        let map = KeyMap::default();
        assert_eq!(map.lookup(KeyCode::Char('1')), Some(Action::Digit(1)));
        assert_eq!(map.lookup(KeyCode::Char('9')), Some(Action::Digit(9)));
        assert_eq!(map.lookup(KeyCode::Char('0')), None);
    }

    #[test]
    fn unbound_key_is_ignored() {
        assert_eq!(KeyMap::default().lookup(KeyCode::Char('z')), None);
        assert_eq!(KeyMap::default().lookup(KeyCode::F(5)), None);
    }

    #[test]
    fn press_and_repeat_produce_actions() {
        let mut input = InputState::new(KeyMap::default());
        input.handle_event(press(KeyCode::Char('h')));
        input.handle_event(key(KeyCode::Right, KeyEventKind::Repeat));
        input.handle_event(key(KeyCode::Right, KeyEventKind::Release));
        assert_eq!(input.actions, vec![Action::ToggleHint, Action::Move(MoveDir::Right)]);
        assert_eq!(input.raw_events.len(), 3);
    }

    #[test]
    fn ctrl_c_is_not_an_action() {
        let mut input = InputState::new(KeyMap::default());
        input.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(input.actions.is_empty());
        assert!(input.ctrl_c_pressed());
    }

    #[test]
    fn left_clicks_are_collected() {
        let mut input = InputState::new(KeyMap::default());
        input.handle_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 4,
            modifiers: KeyModifiers::NONE,
        }));
        input.handle_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        }));
        assert_eq!(input.clicks, vec![(12, 4)]);
    }
}
