use std::time::Duration;

use tracing::{debug, info};

use super::common::{Position, TiltSample};
use super::generator::MazeGrid;

/// Knobs for the tilt-to-move pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    /// Minimum time between two accepted moves.
    pub debounce_window: Duration,
    /// Tilt magnitude below which a sample is treated as sensor jitter.
    pub dead_zone: f32,
    pub countdown_ticks: u8,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(150),
            dead_zone: 0.01,
            countdown_ticks: 3,
        }
    }
}

/// Lifecycle of one level session. Input is only processed while `Playing`;
/// `Completed` is terminal, a new level starts over at `Countdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Countdown {
        ticks_left: u8,
    },
    Playing {
        started_at: Duration,
        last_move: Option<Duration>,
    },
    Completed {
        finished_in: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelResult {
    pub difficulty: usize,
    pub elapsed: Duration,
}

impl LevelResult {
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.as_secs()
    }
}

/// What became of one tilt sample. Hitting a wall is a normal, silent
/// rejection, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Frozen phase, debounced, or inside the dead zone.
    Ignored,
    /// The intended cell is a wall or out of bounds; position unchanged.
    Blocked,
    Moved(Position),
    /// The move landed on the goal. Fired exactly once per level.
    Finished(LevelResult),
}

#[derive(Debug)]
pub struct MazeGame {
    grid: MazeGrid,
    player: Position,
    difficulty: usize,
    phase: Phase,
    tuning: Tuning,
}

impl MazeGame {
    pub fn new(difficulty: usize, tuning: Tuning) -> Self {
        Self::with_grid(MazeGrid::generate(difficulty, difficulty), difficulty, tuning)
    }

    pub fn with_grid(grid: MazeGrid, difficulty: usize, tuning: Tuning) -> Self {
        Self {
            grid,
            player: Position::new(0, 0),
            difficulty,
            phase: Phase::Countdown {
                ticks_left: tuning.countdown_ticks,
            },
            tuning,
        }
    }

    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advances the pre-game countdown by one tick. At zero the session flips
    /// to `Playing` and the elapsed clock starts at `now`. Returns the ticks
    /// still to go, or `None` outside the countdown.
    pub fn tick_countdown(&mut self, now: Duration) -> Option<u8> {
        let Phase::Countdown { ticks_left } = self.phase else {
            return None;
        };

        let left = ticks_left.saturating_sub(1);
        if left == 0 {
            info!("countdown over, play starts");
            self.phase = Phase::Playing {
                started_at: now,
                last_move: None,
            };
        } else {
            self.phase = Phase::Countdown { ticks_left: left };
        }

        Some(left)
    }

    /// Play time so far: `None` during the countdown, running while playing,
    /// frozen at the final time once the goal is reached.
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        match self.phase {
            Phase::Countdown { .. } => None,
            Phase::Playing { started_at, .. } => Some(now.saturating_sub(started_at)),
            Phase::Completed { finished_in } => Some(finished_in),
        }
    }

    /// Turns one tilt sample into at most one discrete move.
    pub fn handle_tilt(&mut self, sample: TiltSample) -> MoveOutcome {
        let Phase::Playing {
            started_at,
            last_move,
        } = self.phase
        else {
            // frozen during the countdown and after the goal
            return MoveOutcome::Ignored;
        };

        if let Some(accepted_at) = last_move {
            if sample.at.saturating_sub(accepted_at) < self.tuning.debounce_window {
                return MoveOutcome::Ignored;
            }
        }

        let Some(direction) = sample.direction(self.tuning.dead_zone) else {
            return MoveOutcome::Ignored;
        };

        let (dx, dy) = direction.delta();
        let candidate = match self.player.offset(dx, dy) {
            Some(position) if self.grid.is_path(position) => position,
            _ => return MoveOutcome::Blocked,
        };

        debug!("player moves {:?} to {:?}", direction, candidate);

        self.player = candidate;
        self.phase = Phase::Playing {
            started_at,
            last_move: Some(sample.at),
        };

        if candidate == self.grid.goal() {
            let finished_in = sample.at.saturating_sub(started_at);
            self.phase = Phase::Completed { finished_in };

            info!("goal reached after {:?}", finished_in);

            return MoveOutcome::Finished(LevelResult {
                difficulty: self.difficulty,
                elapsed: finished_in,
            });
        }

        MoveOutcome::Moved(candidate)
    }
}
