use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::open_database,
    error::{MongoDaoError, MongoResult},
    models::{
        GAME_COLLECTION, MongoGameDocument, MongoPlayDocument, MongoPlayerDocument,
        PLAY_COLLECTION, PLAYER_COLLECTION, doc_id,
    },
};
use crate::dao::{
    models::{
        GameEntity, NewGame, NewPlay, NewPlayer, PlayEntity, PlayerEntity, to_unix_millis,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MongoRecordStore {
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
        let database = open_database(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoRecordStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let plays = self.collection::<MongoPlayDocument>(PLAY_COLLECTION).await;
        for (field, name) in [("dateTime", "play_date_idx"), ("game", "play_game_idx")] {
            let index = mongodb::IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .build(),
                )
                .build();

            plays
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: PLAY_COLLECTION,
                    index: name,
                    source,
                })?;
        }
        Ok(())
    }

    async fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn insert<T>(&self, collection: &'static str, document: T) -> MongoResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .insert_one(document)
            .await
            .map_err(|source| MongoDaoError::Write { collection, source })?;
        Ok(())
    }

    async fn find_all<T>(
        &self,
        collection: &'static str,
        filter: mongodb::bson::Document,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn find_one<T>(&self, collection: &'static str, id: Uuid) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn update_best_score(&self, game_id: Uuid, best_score: String) -> MongoResult<()> {
        let result = self
            .collection::<MongoGameDocument>(GAME_COLLECTION)
            .await
            .update_one(doc_id(game_id), doc! { "$set": { "best_score": best_score } })
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAME_COLLECTION,
                source,
            })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::MissingDocument {
                collection: GAME_COLLECTION,
                id: game_id,
            });
        }
        Ok(())
    }

    async fn delete_play(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection::<MongoPlayDocument>(PLAY_COLLECTION)
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PLAY_COLLECTION,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn plays_matching(&self, filter: mongodb::bson::Document) -> MongoResult<Vec<PlayEntity>> {
        let documents: Vec<MongoPlayDocument> = self
            .collection::<MongoPlayDocument>(PLAY_COLLECTION)
            .await
            .find(filter)
            .sort(doc! { "dateTime": 1 })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAY_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAY_COLLECTION,
                source,
            })?;

        documents.into_iter().map(PlayEntity::try_from).collect()
    }
}

impl RecordStore for MongoRecordStore {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs: Vec<MongoPlayerDocument> =
                store.find_all(PLAYER_COLLECTION, doc! {}).await?;
            docs.into_iter()
                .map(|doc| PlayerEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn add_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = player.into_entity(Uuid::new_v4());
            store
                .insert(PLAYER_COLLECTION, MongoPlayerDocument::from(entity.clone()))
                .await?;
            Ok(entity)
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs: Vec<MongoGameDocument> = store.find_all(GAME_COLLECTION, doc! {}).await?;
            docs.into_iter()
                .map(|doc| GameEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc: Option<MongoGameDocument> = store.find_one(GAME_COLLECTION, id).await?;
            maybe_doc
                .map(GameEntity::try_from)
                .transpose()
                .map_err(Into::into)
        })
    }

    fn add_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = game.into_entity(Uuid::new_v4());
            store
                .insert(GAME_COLLECTION, MongoGameDocument::from(entity.clone()))
                .await?;
            Ok(entity)
        })
    }

    fn update_best_score(
        &self,
        game_id: Uuid,
        best_score: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_best_score(game_id, best_score)
                .await
                .map_err(Into::into)
        })
    }

    fn find_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc: Option<MongoPlayDocument> = store.find_one(PLAY_COLLECTION, id).await?;
            maybe_doc
                .map(PlayEntity::try_from)
                .transpose()
                .map_err(Into::into)
        })
    }

    fn add_play(&self, play: NewPlay) -> BoxFuture<'static, StorageResult<PlayEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = play.into_entity(Uuid::new_v4());
            store
                .insert(PLAY_COLLECTION, MongoPlayDocument::from(entity.clone()))
                .await?;
            Ok(entity)
        })
    }

    fn delete_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_play(id).await.map_err(Into::into) })
    }

    fn plays_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {
                "dateTime": {
                    "$gte": DateTime::from_millis(to_unix_millis(start)),
                    "$lte": DateTime::from_millis(to_unix_millis(end)),
                }
            };
            store.plays_matching(filter).await.map_err(Into::into)
        })
    }

    fn plays_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .plays_matching(doc! { "game": game_id.to_string() })
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
