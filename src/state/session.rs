use std::{sync::Arc, time::SystemTime};

use axum::extract::ws::Message;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::engine::board::{Board, COLS, Side};

/// Display name used for the heuristic opponent's seat.
pub const BOT_USERNAME: &str = "Bot";

/// Shared handle to one game; every mutation goes through the inner mutex so
/// moves, bot turns, and forfeit timers are totally ordered per session.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// One of the two session-scoped roles, held by a participant or by the bot.
#[derive(Debug)]
pub struct Seat {
    /// Display name of the occupant.
    pub username: String,
    /// Color this seat plays under for the whole session.
    pub side: Side,
    /// Outbound channel to the occupant's socket writer; `None` for the bot
    /// seat and while the occupant is disconnected.
    pub tx: Option<mpsc::UnboundedSender<Message>>,
    /// Last time traffic was observed from this seat.
    pub last_seen: SystemTime,
    /// Set when the transport reported a disconnect; cleared on reattach.
    pub disconnected: bool,
}

impl Seat {
    /// Seat for a connected human participant.
    pub fn human(username: String, side: Side, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            username,
            side,
            tx: Some(tx),
            last_seen: SystemTime::now(),
            disconnected: false,
        }
    }

    /// Seat for the heuristic opponent; never has an outbound channel.
    pub fn bot(side: Side) -> Self {
        Self {
            username: BOT_USERNAME.to_string(),
            side,
            tx: None,
            last_seen: SystemTime::now(),
            disconnected: false,
        }
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// The given side completed four in a row, or its opponent forfeited.
    Win(Side),
    /// The board filled up with no winner.
    Draw,
}

impl GameOutcome {
    /// Wire representation of the result, as sent in `game_over`.
    pub fn as_str(self) -> &'static str {
        match self {
            GameOutcome::Win(side) => side.as_str(),
            GameOutcome::Draw => "draw",
        }
    }
}

/// Reasons a move is rejected. A rejected move never mutates session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The session already reached a terminal result.
    #[error("game is already finished")]
    Finished,
    /// The acting seat does not hold the current turn.
    #[error("not your turn")]
    NotYourTurn,
    /// The column index is outside the grid.
    #[error("invalid column")]
    ColumnOutOfRange,
    /// The column has no empty cell left.
    #[error("column is full")]
    ColumnFull,
}

/// Outcome of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    /// Row the disc landed in.
    pub row: usize,
    /// Set when this move ended the game.
    pub finished: Option<GameOutcome>,
}

/// Authoritative state for one game from pairing to terminal result.
///
/// Created by the matchmaker, owned by its [`SessionHandle`] afterwards. Once
/// `outcome` is set the session is immutable apart from seat bookkeeping.
#[derive(Debug)]
pub struct GameSession {
    /// Unique identifier, echoed to clients in `game_start`.
    pub id: Uuid,
    /// The grid; only this session reads or writes it.
    pub board: Board,
    /// Red seat then yellow seat.
    pub seats: [Seat; 2],
    /// Side holding the turn.
    pub current: Side,
    /// Terminal result, unset while the game is in progress.
    pub outcome: Option<GameOutcome>,
    /// Session creation time.
    pub started_at: SystemTime,
    /// Set exactly when `outcome` is set.
    pub ended_at: Option<SystemTime>,
    /// Whether the yellow seat is the heuristic opponent.
    pub vs_bot: bool,
}

impl GameSession {
    /// New in-progress session; red always opens.
    pub fn new(red: Seat, yellow: Seat, vs_bot: bool) -> Self {
        debug_assert_eq!(red.side, Side::Red);
        debug_assert_eq!(yellow.side, Side::Yellow);
        Self {
            id: Uuid::new_v4(),
            board: Board::new(),
            seats: [red, yellow],
            current: Side::Red,
            outcome: None,
            started_at: SystemTime::now(),
            ended_at: None,
            vs_bot,
        }
    }

    /// Whether a terminal result has been reached.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Seat playing the given side.
    pub fn seat(&self, side: Side) -> &Seat {
        match side {
            Side::Red => &self.seats[0],
            Side::Yellow => &self.seats[1],
        }
    }

    /// Mutable seat playing the given side.
    pub fn seat_mut(&mut self, side: Side) -> &mut Seat {
        match side {
            Side::Red => &mut self.seats[0],
            Side::Yellow => &mut self.seats[1],
        }
    }

    /// Seat occupied by `username`, if any.
    pub fn seat_of(&self, username: &str) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.username == username)
    }

    /// Side played by `username`, if seated here.
    pub fn side_of(&self, username: &str) -> Option<Side> {
        self.seat_of(username).map(|seat| seat.side)
    }

    /// Apply a move for `side`, enforcing turn order and column legality.
    ///
    /// On acceptance the disc is placed, win/draw detection runs against the
    /// placed cell only, and either the turn flips or the session transitions
    /// to its terminal state.
    pub fn apply_move(&mut self, side: Side, column: i32) -> Result<AppliedMove, MoveError> {
        if self.is_finished() {
            return Err(MoveError::Finished);
        }
        if side != self.current {
            return Err(MoveError::NotYourTurn);
        }
        if column < 0 || column >= COLS as i32 {
            return Err(MoveError::ColumnOutOfRange);
        }
        let column = column as usize;
        if !self.board.column_open(column) {
            return Err(MoveError::ColumnFull);
        }

        let row = self
            .board
            .place(column, side)
            .map_err(|_| MoveError::ColumnFull)?;

        let finished = if self.board.check_win(row, column) {
            Some(GameOutcome::Win(side))
        } else if self.board.is_full() {
            Some(GameOutcome::Draw)
        } else {
            None
        };

        match finished {
            Some(outcome) => self.finish(outcome),
            None => self.current = side.other(),
        }

        Ok(AppliedMove { row, finished })
    }

    /// Force a terminal result awarding the win to the seat opposite
    /// `leaver`. The only path to a win that bypasses board play.
    pub fn forfeit(&mut self, leaver: Side) -> GameOutcome {
        let outcome = GameOutcome::Win(leaver.other());
        self.finish(outcome);
        outcome
    }

    /// Username credited with the win, if the result names one. Draws yield
    /// `None`.
    pub fn winner_username(&self) -> Option<&str> {
        match self.outcome? {
            GameOutcome::Win(side) => Some(self.seat(side).username.as_str()),
            GameOutcome::Draw => None,
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.outcome = Some(outcome);
        self.ended_at = Some(SystemTime::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn human_session() -> GameSession {
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        GameSession::new(
            Seat::human("alice".into(), Side::Red, tx_a),
            Seat::human("bob".into(), Side::Yellow, tx_b),
            false,
        )
    }

    #[test]
    fn turn_alternates_after_each_accepted_move() {
        let mut session = human_session();
        assert_eq!(session.current, Side::Red);
        session.apply_move(Side::Red, 0).unwrap();
        assert_eq!(session.current, Side::Yellow);
        session.apply_move(Side::Yellow, 1).unwrap();
        assert_eq!(session.current, Side::Red);
    }

    #[test]
    fn rejected_move_leaves_state_untouched() {
        let mut session = human_session();
        session.apply_move(Side::Red, 0).unwrap();
        let board_before = session.board.clone();

        assert_eq!(
            session.apply_move(Side::Red, 1),
            Err(MoveError::NotYourTurn)
        );
        assert_eq!(
            session.apply_move(Side::Yellow, 7),
            Err(MoveError::ColumnOutOfRange)
        );
        assert_eq!(
            session.apply_move(Side::Yellow, -1),
            Err(MoveError::ColumnOutOfRange)
        );

        assert_eq!(session.board, board_before);
        assert_eq!(session.current, Side::Yellow);
        assert!(session.outcome.is_none());
    }

    #[test]
    fn full_column_rejected() {
        let mut session = human_session();
        for _ in 0..3 {
            session.apply_move(Side::Red, 2).unwrap();
            session.apply_move(Side::Yellow, 2).unwrap();
        }
        assert_eq!(session.apply_move(Side::Red, 2), Err(MoveError::ColumnFull));
        assert_eq!(session.current, Side::Red);
    }

    #[test]
    fn four_in_a_row_finishes_the_session() {
        let mut session = human_session();
        // Red builds 0..=3 on the bottom row while yellow stacks elsewhere.
        for col in 0..3 {
            session.apply_move(Side::Red, col).unwrap();
            session.apply_move(Side::Yellow, 6).unwrap();
        }
        let applied = session.apply_move(Side::Red, 3).unwrap();

        assert_eq!(applied.finished, Some(GameOutcome::Win(Side::Red)));
        assert!(session.is_finished());
        assert_eq!(session.winner_username(), Some("alice"));
        assert!(session.ended_at.is_some());
        assert_eq!(
            session.apply_move(Side::Yellow, 0),
            Err(MoveError::Finished)
        );
    }

    #[test]
    fn filling_the_last_cell_without_a_win_is_a_draw() {
        let mut session = human_session();
        // Striped fill with every cell taken except the top of column 6; the
        // final disc there completes no run of four.
        let mut board = Board::new();
        for col in 0..COLS {
            let rows = if col == 6 {
                crate::engine::board::ROWS - 1
            } else {
                crate::engine::board::ROWS
            };
            for row in 0..rows {
                let side = if (row / 2 + col) % 2 == 0 {
                    Side::Red
                } else {
                    Side::Yellow
                };
                board.place(col, side).unwrap();
            }
        }
        session.board = board;
        session.current = Side::Red;

        let applied = session.apply_move(Side::Red, 6).unwrap();
        assert_eq!(applied.finished, Some(GameOutcome::Draw));
        assert!(session.board.is_full());
        assert_eq!(session.winner_username(), None);
        assert_eq!(session.apply_move(Side::Yellow, 0), Err(MoveError::Finished));
    }

    #[test]
    fn forfeit_awards_the_other_seat() {
        let mut session = human_session();
        session.apply_move(Side::Red, 0).unwrap();
        let outcome = session.forfeit(Side::Yellow);
        assert_eq!(outcome, GameOutcome::Win(Side::Red));
        assert_eq!(session.winner_username(), Some("alice"));
        assert_eq!(session.apply_move(Side::Yellow, 0), Err(MoveError::Finished));
    }

    #[test]
    fn draw_outcome_has_no_winner_username() {
        let mut session = human_session();
        session.outcome = Some(GameOutcome::Draw);
        assert_eq!(session.winner_username(), None);
        assert_eq!(GameOutcome::Draw.as_str(), "draw");
    }
}
