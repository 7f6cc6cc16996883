use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, json};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameEntity, NewGame, NewPlay, NewPlayer, PlayEntity, PlayerEntity, to_unix_millis,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchGameDocument, CouchPlayDocument, CouchPlayerDocument, END_SUFFIX,
        FindResponse, GAME_PREFIX, PLAY_PREFIX, PLAYER_PREFIX, doc_id,
    },
};

const FIND_PAGE_SIZE: usize = 200;

#[derive(Clone)]
pub struct CouchRecordStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchRecordStore {
    /// Establish a connection to CouchDB and ensure the database and query indexes exist.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(CouchDaoError::ClientBuilder)?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config.credentials.map(|credentials| {
            (
                Arc::<str>::from(credentials.username),
                Arc::<str>::from(credentials.password),
            )
        });

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        store.ensure_indexes().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn database_request(&self, method: Method) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, self.database);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let response = self
            .database_request(Method::GET)
            .send()
            .await
            .map_err(|source| CouchDaoError::Unreachable {
                path: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .database_request(Method::PUT)
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Unreachable {
                        path: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::Status {
                        path: database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::Status {
                path: database,
                status: other,
            }),
        }
    }

    /// Mango indexes backing the timestamp range query and the per-game lookup.
    async fn ensure_indexes(&self) -> CouchResult<()> {
        const INDEX: &str = "_index";
        for (name, field) in [("play-date-idx", "dateTime"), ("play-game-idx", "game")] {
            let body = json!({
                "index": { "fields": [field] },
                "name": name,
                "type": "json",
            });
            let response = self
                .request(Method::POST, INDEX)
                .json(&body)
                .send()
                .await
                .map_err(|source| CouchDaoError::Unreachable {
                    path: INDEX.to_string(),
                    source,
                })?;
            if !response.status().is_success() {
                return Err(CouchDaoError::Status {
                    path: INDEX.to_string(),
                    status: response.status(),
                });
            }
            debug!(index = name, "CouchDB index ensured");
        }
        Ok(())
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Unreachable {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::Body {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::Status {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Unreachable {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::Status {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<bool> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::Unreachable {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::Status {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::Unreachable {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::Status {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::Body {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::Shape {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    /// Run a Mango query restricted to play documents, following bookmarks until exhausted.
    async fn find_plays(&self, mut selector: Value) -> CouchResult<Vec<PlayEntity>> {
        const FIND: &str = "_find";
        selector["_id"] = json!({
            "$gt": PLAY_PREFIX,
            "$lt": format!("{}{}", PLAY_PREFIX, END_SUFFIX),
        });

        let mut plays = Vec::new();
        let mut bookmark: Option<String> = None;
        loop {
            let mut body = json!({ "selector": selector, "limit": FIND_PAGE_SIZE });
            if let Some(ref mark) = bookmark {
                body["bookmark"] = json!(mark);
            }

            let response = self
                .request(Method::POST, FIND)
                .json(&body)
                .send()
                .await
                .map_err(|source| CouchDaoError::Unreachable {
                    path: FIND.to_string(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(CouchDaoError::Status {
                    path: FIND.to_string(),
                    status: response.status(),
                });
            }

            let page = response.json::<FindResponse>().await.map_err(|source| {
                CouchDaoError::Body {
                    path: FIND.to_string(),
                    source,
                }
            })?;

            let page_len = page.docs.len();
            for doc in page.docs {
                let parsed: CouchPlayDocument =
                    from_value(doc).map_err(|source| CouchDaoError::Shape {
                        path: FIND.to_string(),
                        source,
                    })?;
                plays.push(parsed.try_into()?);
            }

            if page_len < FIND_PAGE_SIZE {
                break;
            }
            bookmark = page.bookmark;
            if bookmark.is_none() {
                break;
            }
        }

        Ok(plays)
    }

    async fn update_best_score(&self, game_id: Uuid, best_score: String) -> CouchResult<()> {
        let id = doc_id(GAME_PREFIX, game_id);
        let mut doc = self
            .get_document::<CouchGameDocument>(&id)
            .await?
            .ok_or(CouchDaoError::MissingDocument {
                collection: "games",
                id: game_id,
            })?;
        doc.game.best_score = Some(best_score);
        self.put_document(&id, &doc).await
    }
}

impl RecordStore for CouchRecordStore {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchPlayerDocument>(PLAYER_PREFIX)
                .await?;
            docs.into_iter()
                .map(|doc| PlayerEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn add_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = player.into_entity(Uuid::new_v4());
            let doc = CouchPlayerDocument::from(entity.clone());
            store.put_document(&doc.id, &doc).await?;
            Ok(entity)
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchGameDocument>(GAME_PREFIX)
                .await?;
            docs.into_iter()
                .map(|doc| GameEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchGameDocument>(&doc_id(GAME_PREFIX, id))
                .await?;
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
            let doc = CouchGameDocument::from(entity.clone());
            store.put_document(&doc.id, &doc).await?;
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
            let maybe_doc = store
                .get_document::<CouchPlayDocument>(&doc_id(PLAY_PREFIX, id))
                .await?;
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
            let doc = CouchPlayDocument::from(entity.clone());
            store.put_document(&doc.id, &doc).await?;
            Ok(entity)
        })
    }

    fn delete_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = doc_id(PLAY_PREFIX, id);
            let Some(existing) = store.get_document::<CouchPlayDocument>(&doc_id).await? else {
                return Ok(false);
            };
            let Some(rev) = existing.rev else {
                return Ok(false);
            };
            store
                .delete_document(&doc_id, &rev)
                .await
                .map_err(Into::into)
        })
    }

    fn plays_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let selector = json!({
                "dateTime": {
                    "$gte": to_unix_millis(start),
                    "$lte": to_unix_millis(end),
                }
            });
            let mut plays = store.find_plays(selector).await?;
            plays.sort_by_key(|play| play.date_time);
            Ok(plays)
        })
    }

    fn plays_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let selector = json!({ "game": game_id });
            store.find_plays(selector).await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let path = format!("{}/{}", store.base_url, store.database);
            let response = store
                .database_request(Method::GET)
                .send()
                .await
                .map_err(|source| CouchDaoError::Unreachable {
                    path: path.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::Status {
                    path,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
