use serde::Serialize;
use utoipa::ToSchema;

/// Health/liveness payload returned by the `/health` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status (`"ok"` or `"degraded"`).
    pub status: String,
    /// Number of sessions currently registered as in progress.
    pub active_games: usize,
    /// Number of participants queued for an opponent.
    pub waiting_players: usize,
}

impl HealthResponse {
    /// Operational response with the current registry counts.
    pub fn ok(active_games: usize, waiting_players: usize) -> Self {
        Self {
            status: "ok".to_string(),
            active_games,
            waiting_players,
        }
    }

    /// Degraded-mode response (no storage backend); games still run.
    pub fn degraded(active_games: usize, waiting_players: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            active_games,
            waiting_players,
        }
    }
}
