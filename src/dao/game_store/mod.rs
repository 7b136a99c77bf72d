/// MongoDB-backed implementation, behind the `mongo-store` feature.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{GameRecordEntity, LeaderboardEntryEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for finished games.
///
/// The core treats this collaborator as optional: every method is allowed to
/// fail without affecting live games.
pub trait GameStore: Send + Sync {
    /// Persist the record of a finished game.
    fn save_game(&self, record: GameRecordEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Top-`limit` identities by win count, descending.
    fn leaderboard(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the underlying connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
