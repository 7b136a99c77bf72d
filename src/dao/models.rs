use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::session::GameSession;

/// Record of a finished game as submitted to the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecordEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Identity that held the red seat.
    pub player1: String,
    /// Identity that held the yellow seat (the bot name in fallback games).
    pub player2: String,
    /// Winning identity; `None` for a draw.
    pub winner: Option<String>,
    /// When the session was created.
    pub started_at: SystemTime,
    /// When the terminal result was reached.
    pub ended_at: SystemTime,
    /// Whether the yellow seat was the heuristic opponent.
    pub is_bot: bool,
}

impl From<&GameSession> for GameRecordEntity {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            player1: session.seats[0].username.clone(),
            player2: session.seats[1].username.clone(),
            winner: session.winner_username().map(str::to_owned),
            started_at: session.started_at,
            ended_at: session.ended_at.unwrap_or(session.started_at),
            is_bot: session.vs_bot,
        }
    }
}

/// One aggregated leaderboard row computed by the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    /// Winning identity.
    pub username: String,
    /// Number of wins recorded for that identity.
    pub wins: i64,
}
