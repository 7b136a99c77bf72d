use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness plus the current registry counts, logging storage issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.game_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let active_games = state.active_games();
    let waiting_players = state.waiting_players().await;

    if state.is_degraded() {
        HealthResponse::degraded(active_games, waiting_players)
    } else {
        HealthResponse::ok(active_games, waiting_players)
    }
}
