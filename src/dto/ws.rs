use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::validation::validate_username,
    engine::board::{Board, COLS, ROWS, Side},
    state::session::GameSession,
};

/// Messages accepted from game WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking (or rejoin an interrupted game) under a username.
    Join {
        /// Display name; also the identity used for rejoin routing.
        username: String,
    },
    /// Drop a disc into a column of the caller's current game.
    Move {
        /// Target column, validated against the grid server-side.
        column: i32,
    },
    /// Any unrecognized message tag.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a raw text frame and validate client-supplied fields.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let message: Self = serde_json::from_str(raw).map_err(|err| err.to_string())?;
        if let ClientMessage::Join { username } = &message {
            validate_username(username).map_err(|err| {
                err.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid username".into())
            })?;
        }
        Ok(message)
    }
}

/// Full-grid snapshot sent with every board update, row-major, top row first.
/// Cells are `"red"`, `"yellow"`, or `""` for empty.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BoardSnapshot(pub Vec<Vec<String>>);

impl From<&Board> for BoardSnapshot {
    fn from(board: &Board) -> Self {
        let rows = (0..ROWS)
            .map(|row| {
                (0..COLS)
                    .map(|col| match board.cell(row, col) {
                        Some(side) => side.as_str().to_string(),
                        None => String::new(),
                    })
                    .collect()
            })
            .collect();
        Self(rows)
    }
}

/// Messages pushed to game WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The client is queued and waiting for an opponent.
    Waiting,
    /// A session started and the client holds a seat in it.
    GameStart {
        /// Color assigned to the receiving seat.
        color: Side,
        /// Display name of the opposing seat.
        opponent: String,
        /// Side holding the opening turn.
        current_player: Side,
        /// Session identifier, for display/debugging only.
        game_id: Uuid,
    },
    /// Board state after an applied move (including the bot's).
    Move {
        /// Snapshot of the whole grid.
        board: BoardSnapshot,
        /// Side holding the turn after this move.
        current_player: Side,
    },
    /// The session reached a terminal result through board play.
    GameOver {
        /// Final grid.
        board: BoardSnapshot,
        /// `"red"`, `"yellow"`, or `"draw"`.
        winner: String,
    },
    /// The opposing seat's transport dropped; the grace window is running.
    OpponentDisconnected,
    /// The session ended by disconnect-timeout rather than board play.
    GameForfeited {
        /// Side awarded the win.
        winner: Side,
    },
    /// Protocol or rule violation report; the connection stays open.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerMessage {
    /// Board update reflecting the session's current grid and turn.
    pub fn move_snapshot(session: &GameSession) -> Self {
        ServerMessage::Move {
            board: BoardSnapshot::from(&session.board),
            current_player: session.current,
        }
    }

    /// Terminal notification for a finished session.
    pub fn game_over(session: &GameSession) -> Self {
        let winner = session
            .outcome
            .map(|outcome| outcome.as_str().to_string())
            .unwrap_or_default();
        ServerMessage::GameOver {
            board: BoardSnapshot::from(&session.board),
            winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_move_parse_from_wire_tags() {
        match ClientMessage::from_json_str(r#"{"type":"join","username":"alice"}"#).unwrap() {
            ClientMessage::Join { username } => assert_eq!(username, "alice"),
            other => panic!("unexpected message: {other:?}"),
        }
        match ClientMessage::from_json_str(r#"{"type":"move","column":3}"#).unwrap() {
            ClientMessage::Move { column } => assert_eq!(column, 3),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_tags_fall_through_without_error() {
        assert!(matches!(
            ClientMessage::from_json_str(r#"{"type":"spectate"}"#).unwrap(),
            ClientMessage::Unknown
        ));
    }

    #[test]
    fn join_with_invalid_username_is_rejected() {
        assert!(ClientMessage::from_json_str(r#"{"type":"join","username":""}"#).is_err());
        assert!(ClientMessage::from_json_str(r#"{"type":"join","username":"Bot"}"#).is_err());
    }

    #[test]
    fn empty_board_serializes_to_empty_strings() {
        let snapshot = BoardSnapshot::from(&Board::new());
        assert_eq!(snapshot.0.len(), ROWS);
        assert!(snapshot.0.iter().all(|row| row.len() == COLS));
        assert!(snapshot.0.iter().flatten().all(|cell| cell.is_empty()));
    }

    #[test]
    fn server_messages_use_snake_case_tags() {
        let json = serde_json::to_value(&ServerMessage::Waiting).unwrap();
        assert_eq!(json["type"], "waiting");

        let json = serde_json::to_value(&ServerMessage::GameForfeited { winner: Side::Red })
            .unwrap();
        assert_eq!(json["type"], "game_forfeited");
        assert_eq!(json["winner"], "red");
    }

    #[test]
    fn placed_discs_appear_in_the_snapshot() {
        let mut board = Board::new();
        board.place(3, Side::Red).unwrap();
        board.place(3, Side::Yellow).unwrap();
        let snapshot = BoardSnapshot::from(&board);
        assert_eq!(snapshot.0[ROWS - 1][3], "red");
        assert_eq!(snapshot.0[ROWS - 2][3], "yellow");
        assert_eq!(snapshot.0[0][3], "");
    }
}
