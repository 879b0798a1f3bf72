//! The game core: maze generation and the tilt-driven movement state machine.
//! Everything here is engine-agnostic; the bevy shell lives in `maze_plugin`.

pub mod common;
pub mod game;
pub mod generator;

pub use common::{Cell, Direction, Position, TiltSample};
pub use game::{LevelResult, MazeGame, MoveOutcome, Phase, Tuning};
pub use generator::MazeGrid;
