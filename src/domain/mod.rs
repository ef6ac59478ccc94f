pub mod cell;
pub mod generator;
pub mod grid;
pub mod pathfinder;
pub mod player;
