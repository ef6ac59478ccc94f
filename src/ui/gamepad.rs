/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` config section. Defaults:
///   D-pad / Left Stick    →  Move (one cell per press)
///   A / Start             →  Confirm
///   B / Select            →  Back
///   Y                     →  Toggle hint
///   X                     →  Retry
///
/// Everything is edge-triggered: holding a direction moves once.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::player::MoveDir;
use crate::ui::input::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

const DIRS: [MoveDir; 4] = [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Held (continuous) and just_pressed (edge) for one input.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Which buttons trigger each action.
#[derive(Debug)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    hint: Vec<Btn>,
    retry: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel: vec![Btn::B, Btn::Select],
            hint: vec![Btn::Y],
            retry: vec![Btn::X],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],

    /// Indexed like `DIRS`.
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg_attr(not(feature = "gamepad"), allow(unused_mut))]
        let mut state = GamepadState::offline();

        #[cfg(feature = "gamepad")]
        match Gilrs::new() {
            Ok(g) => {
                state.connected = g.gamepads().next().is_some();
                state.gilrs = Some(g);
            }
            Err(e) => log::warn!("gamepad support unavailable: {e}"),
        }

        state
    }

    /// A tracker with no backend attached.
    fn offline() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    /// Load button mapping from config. Empty or unrecognised lists keep
    /// the default for that action.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(target: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *target = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.cancel, &cfg.cancel);
        apply(&mut map.hint, &cfg.hint);
        apply(&mut map.retry, &cfg.retry);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    self.connected = true;
                    log::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    log::info!("gamepad disconnected");
                }
                _ => {}
            }
        }

        self.update_stick();
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad_idx = match gilrs_btn {
            Button::DPadUp => Some(0),
            Button::DPadDown => Some(1),
            Button::DPadLeft => Some(2),
            Button::DPadRight => Some(3),
            _ => None,
        };
        if let Some(i) = dpad_idx {
            self.dpad[i].set(held);
            return;
        }
        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn as usize].set(held);
        }
    }

    /// Derive digital stick directions from the axes (gilrs Y is up-positive).
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update_stick(&mut self) {
        let (x, y) = (self.stick_x, self.stick_y);
        self.stick[0].set(y > STICK_DEADZONE);
        self.stick[1].set(y < -STICK_DEADZONE);
        self.stick[2].set(x < -STICK_DEADZONE);
        self.stick[3].set(x > STICK_DEADZONE);
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    /// Actions triggered since the last `update()`.
    pub fn actions(&self) -> Vec<Action> {
        let mut out = Vec::new();
        for (i, dir) in DIRS.iter().enumerate() {
            if self.dpad[i].just_pressed || self.stick[i].just_pressed {
                out.push(Action::Move(*dir));
            }
        }
        let map = &self.action_map;
        if self.any_just_pressed(&map.confirm) { out.push(Action::Confirm); }
        if self.any_just_pressed(&map.cancel) { out.push(Action::Back); }
        if self.any_just_pressed(&map.hint) { out.push(Action::ToggleHint); }
        if self.any_just_pressed(&map.retry) { out.push(Action::Retry); }
        out
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
