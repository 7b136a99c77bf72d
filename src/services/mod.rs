//! Service layer sitting between the HTTP/WebSocket routes and the state.

/// OpenAPI documentation generation.
pub mod documentation;
/// Move application, broadcasts, bot scheduling, and forfeit timers.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Leaderboard projection over the storage backend.
pub mod leaderboard_service;
/// Pairing, rejoin, and the bot fallback timer.
pub mod matchmaking_service;
/// Storage reconnect supervisor driving degraded mode.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
