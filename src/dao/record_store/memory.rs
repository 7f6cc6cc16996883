//! Process-local record store, used for demos and as the collaborator in tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{GameEntity, NewGame, NewPlay, NewPlayer, PlayEntity, PlayerEntity},
    record_store::RecordStore,
    storage::{StorageError, StorageResult},
};

/// Failure injected while the store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct OfflineError;

#[derive(Default)]
struct Collections {
    players: IndexMap<Uuid, PlayerEntity>,
    games: IndexMap<Uuid, GameEntity>,
    plays: IndexMap<Uuid, PlayEntity>,
}

/// Record store keeping every collection in memory, in insertion order.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    collections: Arc<RwLock<Collections>>,
    offline: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a lost connection: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                OfflineError.to_string(),
                OfflineError,
            ))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.collections.read().await;
            Ok(guard.players.values().cloned().collect())
        })
    }

    fn add_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let entity = player.into_entity(Uuid::new_v4());
            let mut guard = store.collections.write().await;
            guard.players.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.collections.read().await;
            Ok(guard.games.values().cloned().collect())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.collections.read().await;
            Ok(guard.games.get(&id).cloned())
        })
    }

    fn add_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let entity = game.into_entity(Uuid::new_v4());
            let mut guard = store.collections.write().await;
            guard.games.insert(entity.id, entity.clone());
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
            store.ensure_online()?;
            let mut guard = store.collections.write().await;
            let game = guard
                .games
                .get_mut(&game_id)
                .ok_or(StorageError::NotFound {
                    collection: "games",
                    id: game_id,
                })?;
            game.best_score = Some(best_score);
            Ok(())
        })
    }

    fn find_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.collections.read().await;
            Ok(guard.plays.get(&id).cloned())
        })
    }

    fn add_play(&self, play: NewPlay) -> BoxFuture<'static, StorageResult<PlayEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let entity = play.into_entity(Uuid::new_v4());
            let mut guard = store.collections.write().await;
            guard.plays.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn delete_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let mut guard = store.collections.write().await;
            Ok(guard.plays.shift_remove(&id).is_some())
        })
    }

    fn plays_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.collections.read().await;
            let mut plays = guard
                .plays
                .values()
                .filter(|play| play.date_time >= start && play.date_time <= end)
                .cloned()
                .collect::<Vec<_>>();
            plays.sort_by_key(|play| play.date_time);
            Ok(plays)
        })
    }

    fn plays_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let guard = store.collections.read().await;
            Ok(guard
                .plays
                .values()
                .filter(|play| play.game_id == game_id)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{PlayEntryEntity, Tier};
    use time::macros::datetime;

    fn play_at(game_id: Uuid, date_time: OffsetDateTime) -> NewPlay {
        NewPlay {
            game_id,
            date_time,
            entries: vec![PlayEntryEntity {
                player_id: Uuid::new_v4(),
                rank: 1,
                score: None,
                players_beaten: 0,
            }],
        }
    }

    #[tokio::test]
    async fn range_query_is_inclusive_and_ordered() {
        let store = MemoryRecordStore::new();
        let game = store
            .add_game(NewGame {
                name: "Azul".into(),
                tier: Tier::Light,
                hi_score_wins: true,
            })
            .await
            .unwrap();

        let late = store
            .add_play(play_at(game.id, datetime!(2025-01-31 23:00 UTC)))
            .await
            .unwrap();
        let early = store
            .add_play(play_at(game.id, datetime!(2025-01-01 00:00 UTC)))
            .await
            .unwrap();
        store
            .add_play(play_at(game.id, datetime!(2025-02-01 00:00 UTC)))
            .await
            .unwrap();

        let plays = store
            .plays_between(
                datetime!(2025-01-01 00:00 UTC),
                datetime!(2025-01-31 23:00 UTC),
            )
            .await
            .unwrap();
        let ids = plays.iter().map(|play| play.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[tokio::test]
    async fn updating_best_score_of_unknown_game_fails() {
        let store = MemoryRecordStore::new();
        let err = store
            .update_best_score(Uuid::new_v4(), "Ann:3".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { collection: "games", .. }));
    }

    #[tokio::test]
    async fn offline_store_rejects_every_call() {
        let store = MemoryRecordStore::new();
        store.set_offline(true);
        assert!(store.list_players().await.is_err());
        assert!(store.health_check().await.is_err());
        store.set_offline(false);
        assert!(store.list_players().await.unwrap().is_empty());
    }
}
