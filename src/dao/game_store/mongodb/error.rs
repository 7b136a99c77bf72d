use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB-backed game store, one variant per
/// operation so logs name what was being attempted.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver parse error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the parsed client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver construction error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the initial ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of pings attempted before giving up.
        attempts: u32,
        /// Last ping error.
        #[source]
        source: MongoError,
    },
    /// A routine health-check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error for the failed ping.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Name of the index.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Upserting a finished game failed.
    #[error("failed to save game `{id}`")]
    SaveGame {
        /// Identifier of the game that was not saved.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The leaderboard aggregation failed.
    #[error("failed to compute leaderboard")]
    Leaderboard {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An aggregation row did not decode into the expected shape.
    #[error("failed to decode leaderboard row")]
    LeaderboardRow {
        /// Deserialization error.
        #[source]
        source: mongodb::bson::error::Error,
    },
}
