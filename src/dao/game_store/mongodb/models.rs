use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::GameRecordEntity;

/// Finished-game document as stored in the `games` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    player1: String,
    player2: String,
    /// Winning username; absent for draws so the leaderboard match stage can
    /// filter on existence.
    winner: Option<String>,
    started_at: DateTime,
    ended_at: DateTime,
    is_bot: bool,
}

impl From<GameRecordEntity> for MongoGameDocument {
    fn from(value: GameRecordEntity) -> Self {
        Self {
            id: value.id,
            player1: value.player1,
            player2: value.player2,
            winner: value.winner,
            started_at: DateTime::from_system_time(value.started_at),
            ended_at: DateTime::from_system_time(value.ended_at),
            is_bot: value.is_bot,
        }
    }
}

impl From<MongoGameDocument> for GameRecordEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            player1: value.player1,
            player2: value.player2,
            winner: value.winner,
            started_at: value.started_at.to_system_time(),
            ended_at: value.ended_at.to_system_time(),
            is_bot: value.is_bot,
        }
    }
}

/// One `$group` output row of the leaderboard aggregation.
#[derive(Debug, Deserialize)]
pub struct LeaderboardRow {
    /// Grouping key, i.e. the winning username.
    #[serde(rename = "_id")]
    pub username: String,
    /// Count of wins for that username.
    pub wins: i64,
}

/// `_id` filter matching the serde representation of [`Uuid`] (hyphenated
/// string).
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
