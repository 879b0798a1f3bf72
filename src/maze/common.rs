use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Path,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns `None` when the offset would leave the non-negative quadrant.
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit grid offset, with y growing downward (row order).
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// One accelerometer reading, stamped with the time since app startup.
#[derive(Debug, Clone, Copy)]
pub struct TiltSample {
    pub x: f32,
    pub y: f32,
    pub at: Duration,
}

impl TiltSample {
    pub fn new(x: f32, y: f32, at: Duration) -> Self {
        Self { x, y, at }
    }

    /// Resolves the sample to a single direction, or `None` inside the dead zone.
    ///
    /// The dominant axis wins: a strictly larger |x| means a horizontal move,
    /// anything else (ties included) a vertical one. The vertical sign is
    /// inverted so that tilting the device forward moves the player down the
    /// board.
    pub fn direction(&self, dead_zone: f32) -> Option<Direction> {
        let abs_x = self.x.abs();
        let abs_y = self.y.abs();

        if abs_x <= dead_zone && abs_y <= dead_zone {
            return None;
        }

        let direction = if abs_x > abs_y {
            if self.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if self.y < 0.0 {
            Direction::Down
        } else {
            Direction::Up
        };

        Some(direction)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Direction, Position, TiltSample};

    fn sample(x: f32, y: f32) -> TiltSample {
        TiltSample::new(x, y, Duration::ZERO)
    }

    #[test]
    fn test_dead_zone_swallows_jitter() {
        assert_eq!(sample(0.005, -0.009).direction(0.01), None);
        assert_eq!(sample(0.0, 0.0).direction(0.01), None);
    }

    #[test]
    fn test_horizontal_dominance() {
        assert_eq!(sample(0.5, 0.1).direction(0.01), Some(Direction::Right));
        assert_eq!(sample(-0.5, 0.1).direction(0.01), Some(Direction::Left));
    }

    #[test]
    fn test_forward_tilt_moves_down() {
        assert_eq!(sample(0.1, -0.5).direction(0.01), Some(Direction::Down));
        assert_eq!(sample(0.1, 0.5).direction(0.01), Some(Direction::Up));
    }

    #[test]
    fn test_tie_resolves_vertical() {
        assert_eq!(sample(0.3, 0.3).direction(0.01), Some(Direction::Up));
        assert_eq!(sample(0.3, -0.3).direction(0.01), Some(Direction::Down));
    }

    #[test]
    fn test_position_offset_is_checked() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(0, -1), None);
        assert_eq!(origin.offset(1, 1), Some(Position::new(1, 1)));
    }
}
