use crate::{dto::leaderboard::LeaderboardEntry, error::ServiceError, state::SharedState};

/// How many rows the leaderboard exposes.
pub const LEADERBOARD_LIMIT: i64 = 10;

/// Fetch the top win counts from storage.
///
/// Degraded mode (no storage backend) surfaces as a service error rather
/// than an empty list, so clients can tell "no data" from "no winners yet".
pub async fn top_wins(state: &SharedState) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.game_store().await.ok_or(ServiceError::Degraded)?;
    let entries = store
        .leaderboard(LEADERBOARD_LIMIT)
        .await
        .map_err(ServiceError::Unavailable)?;
    Ok(entries.into_iter().map(LeaderboardEntry::from).collect())
}
