mod connection;
mod error;
mod models;
/// MongoDB-backed [`crate::dao::game_store::GameStore`] implementation.
pub mod store;

/// Connection settings for the MongoDB backend.
pub mod config;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoGameStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
