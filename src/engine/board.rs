use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Number of rows in the grid. Row 0 is the top, row `ROWS - 1` the bottom.
pub const ROWS: usize = 6;
/// Number of columns in the grid.
pub const COLS: usize = 7;
/// Index of the center column.
pub const CENTER_COL: usize = COLS / 2;

/// Run length required to win.
const WIN_LENGTH: usize = 4;

/// One of the two colors a seat plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The first seat of every game; always moves first.
    Red,
    /// The second seat; assigned to the bot in fallback games.
    Yellow,
}

impl Side {
    /// The other color.
    pub fn other(self) -> Side {
        match self {
            Side::Red => Side::Yellow,
            Side::Yellow => Side::Red,
        }
    }

    /// Lowercase wire name of this side.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Red => "red",
            Side::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`Board::place`] when the target column has no empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("column {column} is full")]
pub struct ColumnFull {
    /// Index of the column that rejected the disc.
    pub column: usize,
}

/// Fixed 6x7 grid of cells, row-major, top row first.
///
/// Filled cells in a column always form a contiguous run starting at the
/// bottom row; [`Board::place`] is the only way to write a cell, so the
/// gravity invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Side>; COLS]; ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty grid.
    pub fn new() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
        }
    }

    /// Cell content at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<Side> {
        self.cells[row][col]
    }

    /// Whether `column` still has at least one empty cell.
    pub fn column_open(&self, column: usize) -> bool {
        column < COLS && self.cells[0][column].is_none()
    }

    /// Drop a disc of `side` into `column`, returning the row it landed in.
    ///
    /// Searches upward from the bottom row for the lowest empty cell. Turn
    /// legality is the caller's concern, not the board's.
    pub fn place(&mut self, column: usize, side: Side) -> Result<usize, ColumnFull> {
        let row = (0..ROWS)
            .rev()
            .find(|&row| self.cells[row][column].is_none())
            .ok_or(ColumnFull { column })?;
        self.cells[row][column] = Some(side);
        Ok(row)
    }

    /// Whether the disc at `(row, col)` completes a run of four.
    ///
    /// Only the four axes through the given cell are examined, counting
    /// contiguous same-color cells outward in both directions; cells outside
    /// the grid terminate a direction. Callers pass the coordinates of the
    /// move that was just applied, so a full-board rescan is never needed.
    pub fn check_win(&self, row: usize, col: usize) -> bool {
        let Some(side) = self.cells[row][col] else {
            return false;
        };

        // (dr, dc): horizontal, vertical, down-right diagonal, down-left diagonal.
        const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        AXES.iter().any(|&(dr, dc)| {
            let count = 1
                + self.run_length(row, col, dr, dc, side)
                + self.run_length(row, col, -dr, -dc, side);
            count >= WIN_LENGTH
        })
    }

    /// Whether no empty cell remains anywhere in the grid.
    pub fn is_full(&self) -> bool {
        // Gravity means the top row fills last.
        self.cells[0].iter().all(|cell| cell.is_some())
    }

    /// Count same-color cells adjacent to `(row, col)` along one direction,
    /// excluding the starting cell itself.
    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, side: Side) -> usize {
        let mut count = 0;
        for step in 1..WIN_LENGTH as isize {
            let r = row as isize + dr * step;
            let c = col as isize + dc * step;
            if r < 0 || r >= ROWS as isize || c < 0 || c >= COLS as isize {
                break;
            }
            if self.cells[r as usize][c as usize] != Some(side) {
                break;
            }
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fill a board from move pairs without going through a session.
    fn board_with(moves: &[(usize, Side)]) -> Board {
        let mut board = Board::new();
        for &(column, side) in moves {
            board.place(column, side).unwrap();
        }
        board
    }

    #[test]
    fn place_stacks_from_the_bottom() {
        let mut board = Board::new();
        assert_eq!(board.place(3, Side::Red), Ok(ROWS - 1));
        assert_eq!(board.place(3, Side::Yellow), Ok(ROWS - 2));
        assert_eq!(board.place(3, Side::Red), Ok(ROWS - 3));
        assert_eq!(board.cell(ROWS - 1, 3), Some(Side::Red));
        assert_eq!(board.cell(ROWS - 2, 3), Some(Side::Yellow));
        assert_eq!(board.cell(ROWS - 3, 3), Some(Side::Red));
        assert_eq!(board.cell(ROWS - 4, 3), None);
    }

    #[test]
    fn place_rejects_full_column_without_mutating() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.place(0, Side::Red).unwrap();
        }
        let before = board.clone();
        assert_eq!(board.place(0, Side::Yellow), Err(ColumnFull { column: 0 }));
        assert_eq!(board, before);
    }

    #[test]
    fn horizontal_win_detected_from_any_cell_of_the_run() {
        let board = board_with(&[
            (0, Side::Red),
            (0, Side::Yellow),
            (1, Side::Red),
            (1, Side::Yellow),
            (2, Side::Red),
            (2, Side::Yellow),
            (3, Side::Red),
        ]);
        for col in 0..4 {
            assert!(board.check_win(ROWS - 1, col), "column {col}");
        }
        assert!(!board.check_win(ROWS - 2, 0));
    }

    #[test]
    fn vertical_win_detected() {
        let board = board_with(&[
            (5, Side::Yellow),
            (6, Side::Red),
            (5, Side::Yellow),
            (6, Side::Red),
            (5, Side::Yellow),
            (6, Side::Red),
            (5, Side::Yellow),
        ]);
        assert!(board.check_win(ROWS - 4, 5));
        assert!(!board.check_win(ROWS - 3, 6));
    }

    #[test]
    fn rising_diagonal_win_detected() {
        // Red climbs from (5,0) to (2,3); yellow pads the stacks underneath.
        let board = board_with(&[
            (0, Side::Red),
            (1, Side::Yellow),
            (1, Side::Red),
            (2, Side::Yellow),
            (2, Side::Yellow),
            (2, Side::Red),
            (3, Side::Yellow),
            (3, Side::Yellow),
            (3, Side::Yellow),
            (3, Side::Red),
        ]);
        assert!(board.check_win(2, 3));
        assert!(board.check_win(5, 0));
        assert!(!board.check_win(4, 2));
    }

    #[test]
    fn falling_diagonal_win_detected() {
        // Yellow descends from (2,0) to (5,3) over red padding.
        let board = board_with(&[
            (3, Side::Yellow),
            (2, Side::Red),
            (2, Side::Yellow),
            (1, Side::Red),
            (1, Side::Red),
            (1, Side::Yellow),
            (0, Side::Red),
            (0, Side::Red),
            (0, Side::Red),
            (0, Side::Yellow),
        ]);
        assert!(board.check_win(2, 0));
        assert!(board.check_win(5, 3));
        assert!(!board.check_win(3, 0));
    }

    #[test]
    fn three_in_a_row_is_not_a_win() {
        let board = board_with(&[(0, Side::Red), (1, Side::Red), (2, Side::Red)]);
        for col in 0..3 {
            assert!(!board.check_win(ROWS - 1, col));
        }
    }

    #[test]
    fn run_of_more_than_four_still_wins() {
        let board = board_with(&[
            (0, Side::Red),
            (1, Side::Red),
            (2, Side::Red),
            (3, Side::Red),
            (4, Side::Red),
        ]);
        assert!(board.check_win(ROWS - 1, 2));
    }

    #[test]
    fn is_full_only_when_every_cell_taken() {
        let mut board = Board::new();
        assert!(!board.is_full());
        for col in 0..COLS {
            for i in 0..ROWS {
                let side = if (col + i) % 2 == 0 {
                    Side::Red
                } else {
                    Side::Yellow
                };
                board.place(col, side).unwrap();
            }
        }
        assert!(board.is_full());
    }

    #[test]
    fn check_win_is_read_only() {
        let board = board_with(&[(0, Side::Red), (1, Side::Red)]);
        let before = board.clone();
        let _ = board.check_win(ROWS - 1, 0);
        assert_eq!(board, before);
    }
}
