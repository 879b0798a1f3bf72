use std::time::Duration;

use thiserror::Error;

use crate::maze::Tuning;

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("Difficulty {0} is too small, the board needs at least 3 cells per side")]
    DifficultyTooSmall(usize),
    #[error("Difficulty {0} is even, the goal must land on the carving lattice")]
    EvenDifficulty(usize),
    #[error("Difficulty step {0} is odd, levels would leave the carving lattice")]
    OddDifficultyStep(usize),
    #[error("Dead zone {0} is outside [0, 1)")]
    DeadZoneOutOfRange(f32),
}

/// Game setup, validated once at the boundary. The core itself never rejects
/// a configuration: degenerate grids stay defined.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Board side length of the first level.
    pub initial_difficulty: usize,
    /// Added to the difficulty for each next level.
    pub difficulty_step: usize,
    pub countdown_ticks: u8,
    /// How often a tilt sample is synthesized from the input devices.
    pub sensor_interval: Duration,
    pub debounce_window: Duration,
    pub dead_zone: f32,
    /// Axis magnitude of a synthetic sample while an arrow key is held.
    pub tilt_magnitude: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_difficulty: 5,
            difficulty_step: 2,
            countdown_ticks: 3,
            sensor_interval: Duration::from_millis(100),
            debounce_window: Duration::from_millis(150),
            dead_zone: 0.01,
            tilt_magnitude: 0.5,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.initial_difficulty < 3 {
            return Err(SettingsError::DifficultyTooSmall(self.initial_difficulty));
        }
        if self.initial_difficulty % 2 == 0 {
            return Err(SettingsError::EvenDifficulty(self.initial_difficulty));
        }
        if self.difficulty_step % 2 != 0 {
            return Err(SettingsError::OddDifficultyStep(self.difficulty_step));
        }
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(SettingsError::DeadZoneOutOfRange(self.dead_zone));
        }

        Ok(())
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            debounce_window: self.debounce_window,
            dead_zone: self.dead_zone,
            countdown_ticks: self.countdown_ticks,
        }
    }
}
