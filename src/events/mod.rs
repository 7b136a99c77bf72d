//! Fire-and-forget analytics events emitted on session creation and
//! termination. The sink is optional; its absence or failure never reaches
//! players.

/// Kafka-backed sink, behind the `kafka-events` feature.
#[cfg(feature = "kafka-events")]
pub mod kafka;

use std::{error::Error, time::SystemTime};

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{dto::format_system_time, state::session::GameSession};

/// Error raised by event sinks regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum EventError {
    /// The sink could not accept the event.
    #[error("event sink unavailable: {message}")]
    Unavailable {
        /// Transport-specific description of the failure.
        message: String,
        /// Underlying producer error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl EventError {
    /// Construct an unavailable error from any transport failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        EventError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Lifecycle event payload produced to the analytics topic.
#[derive(Debug, Clone, Serialize)]
pub struct GameEventRecord {
    /// `"game_start"` or `"game_end"`.
    pub event_type: &'static str,
    /// Session identifier.
    pub game_id: Uuid,
    /// Red seat identity.
    pub player1: String,
    /// Yellow seat identity (the bot name in fallback games).
    pub player2: String,
    /// Whether the yellow seat is the heuristic opponent.
    pub is_bot: bool,
    /// Winning color or `"draw"`; only set on `game_end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    /// Game duration in seconds; only set on `game_end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// RFC3339 emission timestamp.
    pub timestamp: String,
}

impl GameEventRecord {
    /// Event emitted when a session is created.
    pub fn game_start(session: &GameSession) -> Self {
        Self {
            event_type: "game_start",
            game_id: session.id,
            player1: session.seats[0].username.clone(),
            player2: session.seats[1].username.clone(),
            is_bot: session.vs_bot,
            winner: None,
            duration: None,
            timestamp: format_system_time(SystemTime::now()),
        }
    }

    /// Event emitted when a session reaches a terminal result.
    pub fn game_end(session: &GameSession) -> Self {
        let duration = session
            .ended_at
            .and_then(|ended| ended.duration_since(session.started_at).ok())
            .map(|elapsed| elapsed.as_secs_f64());
        Self {
            event_type: "game_end",
            game_id: session.id,
            player1: session.seats[0].username.clone(),
            player2: session.seats[1].username.clone(),
            is_bot: session.vs_bot,
            winner: session.outcome.map(|outcome| outcome.as_str().to_string()),
            duration,
            timestamp: format_system_time(SystemTime::now()),
        }
    }
}

/// Abstraction over the analytics producer.
///
/// Implementations must bound their send internally so a slow broker can
/// never block game logic.
pub trait EventSink: Send + Sync {
    /// Publish one lifecycle event, keyed by its event type.
    fn publish(&self, event: GameEventRecord) -> BoxFuture<'static, Result<(), EventError>>;
}
