pub mod effects;
pub mod gamepad;
pub mod input;
pub mod renderer;
