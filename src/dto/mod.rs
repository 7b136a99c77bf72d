//! Data transfer objects shared between the wire protocol and the HTTP API.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health probe payload.
pub mod health;
/// Leaderboard projection returned by the query interface.
pub mod leaderboard;
/// Validation helpers for client-supplied fields.
pub mod validation;
/// Tagged WebSocket messages exchanged with game clients.
pub mod ws;

/// RFC3339 rendering used by analytics events.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
