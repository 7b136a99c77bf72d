use crate::engine::board::{Board, CENTER_COL, COLS, Side};

/// Columns adjacent to the center, preferred outward, tried when no tactical
/// move exists and the center itself is full.
const NEUTRAL_ORDER: [usize; 6] = [2, 4, 1, 5, 0, 6];

/// Pick a column for `own` side on the given board.
///
/// Decision order, first match wins: take an immediate win, block the
/// opponent's immediate win, take the center, then fall back to
/// [`NEUTRAL_ORDER`]. Tactical scans run left to right over all columns;
/// only the neutral fallback is center-biased. Returns `None` when no column
/// has room, which callers must already have classified as a draw.
pub fn choose_column(board: &Board, own: Side) -> Option<usize> {
    // Win now, even when a block is also on the table.
    for column in 0..COLS {
        if would_win(board, column, own) {
            return Some(column);
        }
    }

    // Deny the opponent's immediate win.
    for column in 0..COLS {
        if would_win(board, column, own.other()) {
            return Some(column);
        }
    }

    if board.column_open(CENTER_COL) {
        return Some(CENTER_COL);
    }

    NEUTRAL_ORDER
        .into_iter()
        .find(|&column| board.column_open(column))
}

/// Whether dropping `side` into `column` completes four in a row.
///
/// The hypothetical placement happens on a scratch copy, leaving the caller's
/// board untouched.
fn would_win(board: &Board, column: usize, side: Side) -> bool {
    if !board.column_open(column) {
        return false;
    }
    let mut probe = board.clone();
    match probe.place(column, side) {
        Ok(row) => probe.check_win(row, column),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(moves: &[(usize, Side)]) -> Board {
        let mut board = Board::new();
        for &(column, side) in moves {
            board.place(column, side).unwrap();
        }
        board
    }

    #[test]
    fn takes_immediate_win() {
        // Yellow has three on the bottom row at columns 0..=2.
        let board = board_with(&[
            (0, Side::Yellow),
            (1, Side::Yellow),
            (2, Side::Yellow),
            (0, Side::Red),
            (1, Side::Red),
        ]);
        assert_eq!(choose_column(&board, Side::Yellow), Some(3));
    }

    #[test]
    fn win_outranks_block() {
        // Both sides threaten four on the bottom row; yellow must finish its
        // own run instead of blocking red's.
        let board = board_with(&[
            (0, Side::Yellow),
            (1, Side::Yellow),
            (2, Side::Yellow),
            (4, Side::Red),
            (5, Side::Red),
            (6, Side::Red),
        ]);
        assert_eq!(choose_column(&board, Side::Yellow), Some(3));
    }

    #[test]
    fn blocks_opponent_win_when_none_of_its_own() {
        let board = board_with(&[(4, Side::Red), (5, Side::Red), (6, Side::Red)]);
        assert_eq!(choose_column(&board, Side::Yellow), Some(3));
    }

    #[test]
    fn blocks_vertical_threat() {
        let board = board_with(&[(2, Side::Red), (2, Side::Red), (2, Side::Red)]);
        assert_eq!(choose_column(&board, Side::Yellow), Some(2));
    }

    #[test]
    fn prefers_center_with_no_threats() {
        assert_eq!(choose_column(&Board::new(), Side::Yellow), Some(CENTER_COL));
    }

    #[test]
    fn tactical_scan_is_left_to_right() {
        // Red threatens in two places; the leftmost completing column wins the
        // tie-break even though a more central block exists.
        let board = board_with(&[
            (0, Side::Red),
            (1, Side::Red),
            (2, Side::Red),
            (4, Side::Red),
            (4, Side::Red),
            (4, Side::Red),
        ]);
        assert_eq!(choose_column(&board, Side::Yellow), Some(3));
    }

    #[test]
    fn falls_back_to_neutral_order_when_center_full() {
        let mut board = Board::new();
        for i in 0..crate::engine::board::ROWS {
            let side = if i % 2 == 0 { Side::Red } else { Side::Yellow };
            board.place(CENTER_COL, side).unwrap();
        }
        assert_eq!(choose_column(&board, Side::Yellow), Some(2));
    }

    #[test]
    fn no_move_on_a_full_board() {
        let mut board = Board::new();
        for col in 0..COLS {
            for row in 0..crate::engine::board::ROWS {
                let side = if (row / 2 + col) % 2 == 0 {
                    Side::Red
                } else {
                    Side::Yellow
                };
                board.place(col, side).unwrap();
            }
        }
        assert!(board.is_full());
        assert_eq!(choose_column(&board, Side::Yellow), None);
    }

    #[test]
    fn simulation_leaves_the_board_unchanged() {
        let board = board_with(&[(0, Side::Red), (3, Side::Yellow)]);
        let before = board.clone();
        let _ = choose_column(&board, Side::Yellow);
        assert_eq!(board, before);
    }
}
