use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{deserialize_from_document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{LeaderboardRow, MongoGameDocument, doc_id},
};
use crate::dao::{
    game_store::GameStore,
    models::{GameRecordEntity, LeaderboardEntryEntity},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";

/// MongoDB-backed game store; cheap to clone, reconnectable in place.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // The leaderboard groups on `winner`; keep that lookup indexed.
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"winner": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_winner_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "winner",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn save_game(&self, record: GameRecordEntity) -> MongoResult<()> {
        let id = record.id;
        let document: MongoGameDocument = record.into();
        let collection = self.collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;

        Ok(())
    }

    async fn leaderboard(&self, limit: i64) -> MongoResult<Vec<LeaderboardEntryEntity>> {
        let collection = self.collection().await;
        let pipeline = vec![
            doc! { "$match": { "winner": { "$type": "string" } } },
            doc! { "$group": { "_id": "$winner", "wins": { "$sum": 1 } } },
            doc! { "$sort": { "wins": -1, "_id": 1 } },
            doc! { "$limit": limit },
        ];

        let documents: Vec<mongodb::bson::Document> = collection
            .aggregate(pipeline)
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?;

        documents
            .into_iter()
            .map(|document| {
                let row: LeaderboardRow = deserialize_from_document(document)
                    .map_err(|source| MongoDaoError::LeaderboardRow { source })?;
                Ok(LeaderboardEntryEntity {
                    username: row.username,
                    wins: row.wins,
                })
            })
            .collect()
    }
}

impl GameStore for MongoGameStore {
    fn save_game(&self, record: GameRecordEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(record).await.map_err(Into::into) })
    }

    fn leaderboard(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.leaderboard(limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
