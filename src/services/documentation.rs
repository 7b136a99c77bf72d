use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the game backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::leaderboard::leaderboard,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "leaderboard", description = "Win-count rankings"),
        (name = "game", description = "WebSocket operations for live games"),
    )
)]
pub struct ApiDoc;
