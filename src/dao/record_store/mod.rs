#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{GameEntity, NewGame, NewPlay, NewPlayer, PlayEntity, PlayerEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the remote document database holding the `players`, `games` and `plays`
/// collections.
pub trait RecordStore: Send + Sync {
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn add_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn add_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Overwrite the denormalized best score of a game; fails when the game does not exist.
    fn update_best_score(
        &self,
        game_id: Uuid,
        best_score: String,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayEntity>>>;
    fn add_play(&self, play: NewPlay) -> BoxFuture<'static, StorageResult<PlayEntity>>;
    /// Delete a play, returning whether it existed.
    fn delete_play(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Plays whose timestamp lies in the inclusive `[start, end]` window, oldest first.
    fn plays_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>>;
    /// Every play recorded against a game.
    fn plays_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
