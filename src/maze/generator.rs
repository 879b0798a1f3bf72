use std::{ops::Deref, str::FromStr};

use thiserror::Error;
use tracing::debug;

use super::common::{Cell, Direction, Position};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseGridError {
    #[error("Grid text has no rows")]
    Empty,
    #[error("Row {0} has {1} cells, expected {2}")]
    RaggedRow(usize, usize, usize),
    #[error("Unexpected character {0:?}")]
    UnexpectedCharacter(char),
}

#[derive(Debug)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Deref for Row {
    type Target = Vec<Cell>;

    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

/// A maze board, immutable once built: no `&mut` accessor is exposed, so a
/// level plays out on exactly the grid it was generated with.
#[derive(Debug)]
pub struct MazeGrid {
    rows: Vec<Row>,
    dimension: (usize, usize),
}

impl Deref for MazeGrid {
    type Target = Vec<Row>;

    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

/// One node of the carving walk: the lattice cell we stand on plus the fair
/// shuffled order in which its neighbours get tried.
struct Frame {
    node: Position,
    order: [Direction; 4],
    tried: usize,
}

impl Frame {
    fn open(node: Position) -> Self {
        let mut order = Direction::ALL;
        fastrand::shuffle(&mut order);
        Self {
            node,
            order,
            tried: 0,
        }
    }

    fn next_direction(&mut self) -> Option<Direction> {
        let direction = self.order.get(self.tried).copied();
        self.tried += 1;
        direction
    }
}

impl MazeGrid {
    /// Carves a perfect maze with a randomized depth-first walk.
    ///
    /// Logical cells live on the even-coordinate lattice; linking two of them
    /// sets the wall cell between them to path, so every corridor is separated
    /// from unlinked neighbours by a one-cell wall. The walk keeps an explicit
    /// frame stack instead of recursing, so depth is bounded by the lattice
    /// size and not by the call stack.
    pub fn generate(rows: usize, cols: usize) -> Self {
        let mut cells = vec![vec![Cell::Wall; cols]; rows];

        if rows > 0 && cols > 0 {
            carve(&mut cells);
        }

        debug!("generated {}x{} maze", cols, rows);

        Self {
            dimension: (cols, rows),
            rows: cells.into_iter().map(|cells| Row { cells }).collect(),
        }
    }

    /// (cols, rows)
    pub fn dimension(&self) -> (usize, usize) {
        self.dimension
    }

    pub fn goal(&self) -> Position {
        Position::new(
            self.dimension.0.saturating_sub(1),
            self.dimension.1.saturating_sub(1),
        )
    }

    pub fn is_path(&self, position: Position) -> bool {
        position.x < self.dimension.0
            && position.y < self.dimension.1
            && self.rows[position.y][position.x] == Cell::Path
    }

    /// Out-of-bounds counts as wall.
    pub fn is_wall(&self, position: Position) -> bool {
        !self.is_path(position)
    }
}

fn carve(cells: &mut [Vec<Cell>]) {
    let rows = cells.len();
    let cols = cells[0].len();

    let mut visited = vec![vec![false; cols]; rows];
    visited[0][0] = true;
    cells[0][0] = Cell::Path;

    let mut stack = vec![Frame::open(Position::new(0, 0))];

    while let Some(frame) = stack.last_mut() {
        let node = frame.node;
        let direction = match frame.next_direction() {
            // every neighbour tried: backtrack
            None => {
                stack.pop();
                continue;
            }
            Some(direction) => direction,
        };

        let (dx, dy) = direction.delta();
        let between = match node.offset(dx, dy) {
            None => continue,
            Some(position) => position,
        };
        let next = match between.offset(dx, dy) {
            None => continue,
            Some(position) => position,
        };

        if next.x >= cols || next.y >= rows || visited[next.y][next.x] {
            continue;
        }

        cells[between.y][between.x] = Cell::Path;
        cells[next.y][next.x] = Cell::Path;
        visited[next.y][next.x] = true;
        stack.push(Frame::open(next));
    }
}

impl FromStr for MazeGrid {
    type Err = ParseGridError;

    /// Parses the textual board format: `'w'` for wall, `' '` for path, one
    /// row per line. All rows must have the same width.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows: Vec<Row> = vec![];

        for (index, line) in s.lines().filter(|l| !l.is_empty()).enumerate() {
            let cells = line
                .chars()
                .map(|c| match c {
                    ' ' => Ok(Cell::Path),
                    'w' => Ok(Cell::Wall),
                    other => Err(ParseGridError::UnexpectedCharacter(other)),
                })
                .collect::<Result<Vec<_>, _>>()?;

            if let Some(first) = rows.first() {
                if cells.len() != first.len() {
                    return Err(ParseGridError::RaggedRow(index, cells.len(), first.len()));
                }
            }

            rows.push(Row { cells });
        }

        if rows.is_empty() {
            return Err(ParseGridError::Empty);
        }

        Ok(Self {
            dimension: (rows[0].len(), rows.len()),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crate::maze::common::{Cell, Direction, Position};

    use super::{MazeGrid, ParseGridError};

    fn path_cells(grid: &MazeGrid) -> usize {
        grid.iter()
            .map(|row| row.iter().filter(|c| **c == Cell::Path).count())
            .sum()
    }

    fn reachable_path_cells(grid: &MazeGrid) -> usize {
        let mut seen = vec![Position::new(0, 0)];
        let mut queue = VecDeque::from([Position::new(0, 0)]);

        while let Some(position) = queue.pop_front() {
            for direction in Direction::ALL {
                let (dx, dy) = direction.delta();
                let next = match position.offset(dx, dy) {
                    None => continue,
                    Some(next) => next,
                };
                if grid.is_path(next) && !seen.contains(&next) {
                    seen.push(next);
                    queue.push_back(next);
                }
            }
        }

        seen.len()
    }

    #[test]
    fn test_every_path_cell_is_reachable_from_start() {
        for seed in 0..20 {
            fastrand::seed(seed);
            let grid = MazeGrid::generate(5, 5);

            assert!(grid.is_path(Position::new(0, 0)));
            assert_eq!(reachable_path_cells(&grid), path_cells(&grid));
        }
    }

    #[test]
    fn test_carved_structure_is_a_tree() {
        // L lattice nodes and L-1 carved links make 2L-1 path cells in total.
        for (n, seed) in [(1usize, 7u64), (3, 8), (5, 9), (9, 10), (15, 11)] {
            fastrand::seed(seed);
            let grid = MazeGrid::generate(n, n);

            let lattice = (n + 1) / 2;
            let nodes = lattice * lattice;
            assert_eq!(path_cells(&grid), 2 * nodes - 1, "size {}", n);
        }
    }

    #[test]
    fn test_start_and_goal_are_open() {
        for n in [1usize, 3, 5, 7, 9] {
            let grid = MazeGrid::generate(n, n);

            assert!(grid.is_path(Position::new(0, 0)));
            assert!(grid.is_path(grid.goal()));
        }
    }

    #[test]
    fn test_rectangular_grids_are_tolerated() {
        fastrand::seed(42);
        let grid = MazeGrid::generate(5, 9);

        assert_eq!(grid.dimension(), (9, 5));
        // 5x3 lattice nodes, still a spanning tree
        assert_eq!(path_cells(&grid), 2 * 15 - 1);
        assert_eq!(reachable_path_cells(&grid), path_cells(&grid));
    }

    #[test]
    fn test_degenerate_dimensions_are_defined() {
        let empty = MazeGrid::generate(0, 0);
        assert_eq!(empty.dimension(), (0, 0));
        assert_eq!(path_cells(&empty), 0);

        let single = MazeGrid::generate(1, 1);
        assert!(single.is_path(Position::new(0, 0)));
        assert_eq!(single.goal(), Position::new(0, 0));
    }

    #[test]
    fn test_out_of_bounds_counts_as_wall() {
        let grid = MazeGrid::generate(5, 5);

        assert!(grid.is_wall(Position::new(5, 0)));
        assert!(grid.is_wall(Position::new(0, 5)));
    }

    #[test]
    fn test_parse_rejects_bad_grids() {
        assert_eq!("".parse::<MazeGrid>().unwrap_err(), ParseGridError::Empty);
        assert_eq!(
            "w \nw".parse::<MazeGrid>().unwrap_err(),
            ParseGridError::RaggedRow(1, 1, 2)
        );
        assert_eq!(
            "wxw".parse::<MazeGrid>().unwrap_err(),
            ParseGridError::UnexpectedCharacter('x')
        );
    }

    #[test]
    fn test_parse_accepts_the_board_format() {
        let grid: MazeGrid = "  w\nww \n   ".parse().unwrap();

        assert_eq!(grid.dimension(), (3, 3));
        assert!(grid.is_path(Position::new(0, 0)));
        assert!(grid.is_wall(Position::new(2, 0)));
        assert!(grid.is_path(grid.goal()));
    }
}
