use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::LeaderboardEntryEntity;

/// One leaderboard row: an identity and its win count, ordered by wins.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Winning participant's display name.
    pub username: String,
    /// Number of recorded wins.
    pub wins: i64,
}

impl From<LeaderboardEntryEntity> for LeaderboardEntry {
    fn from(entity: LeaderboardEntryEntity) -> Self {
        Self {
            username: entity.username,
            wins: entity.wins,
        }
    }
}
