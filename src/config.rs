//! Application-level configuration, loaded from environment variables.

use std::{env, time::Duration};

use tracing::warn;

/// Default HTTP/WebSocket listen port.
const DEFAULT_PORT: u16 = 8080;
/// Default artificial thinking delay before a bot move is applied.
const DEFAULT_BOT_DELAY: Duration = Duration::from_millis(500);
/// Default wait before a lone queued participant is matched against the bot.
const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_secs(10);
/// Default window a disconnected seat has to reconnect before forfeiting.
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);
/// Default Kafka topic for game lifecycle events.
const DEFAULT_KAFKA_TOPIC: &str = "game-events";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the server binds on.
    pub port: u16,
    /// Thinking delay before the bot's move is applied.
    pub bot_delay: Duration,
    /// How long a lone participant waits before the bot substitutes in.
    pub fallback_delay: Duration,
    /// Reconnection window before a disconnected seat forfeits.
    pub grace_period: Duration,
    /// MongoDB connection string for the game store.
    pub mongo_uri: String,
    /// Optional explicit MongoDB database name.
    pub mongo_db: Option<String>,
    /// Kafka bootstrap servers for the analytics sink; `None` disables it.
    pub kafka_brokers: Option<String>,
    /// Kafka topic the analytics events are produced to.
    pub kafka_topic: String,
}

impl AppConfig {
    /// Read configuration from the environment, falling back to defaults
    /// matching the deployed service.
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .or_else(|_| env::var("SERVER_PORT"))
                .ok()
                .and_then(|value| parse_or_warn("PORT", &value))
                .unwrap_or(DEFAULT_PORT),
            bot_delay: env_millis("BOT_DELAY_MS").unwrap_or(DEFAULT_BOT_DELAY),
            fallback_delay: env_secs("FALLBACK_DELAY_SECS").unwrap_or(DEFAULT_FALLBACK_DELAY),
            grace_period: env_secs("GRACE_PERIOD_SECS").unwrap_or(DEFAULT_GRACE_PERIOD),
            mongo_uri: env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into()),
            mongo_db: env::var("MONGO_DB").ok(),
            kafka_brokers: env::var("KAFKA_BROKERS").ok().filter(|v| !v.is_empty()),
            kafka_topic: env::var("KAFKA_TOPIC").unwrap_or_else(|_| DEFAULT_KAFKA_TOPIC.into()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bot_delay: DEFAULT_BOT_DELAY,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            grace_period: DEFAULT_GRACE_PERIOD,
            mongo_uri: "mongodb://localhost:27017".into(),
            mongo_db: None,
            kafka_brokers: None,
            kafka_topic: DEFAULT_KAFKA_TOPIC.into(),
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    let value = env::var(name).ok()?;
    parse_or_warn(name, &value).map(Duration::from_millis)
}

fn env_secs(name: &str) -> Option<Duration> {
    let value = env::var(name).ok()?;
    parse_or_warn(name, &value).map(Duration::from_secs)
}

fn parse_or_warn<T: std::str::FromStr>(name: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(%name, %value, "ignoring unparseable configuration value");
            None
        }
    }
}
