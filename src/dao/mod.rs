/// Record models shared by every storage backend.
pub mod models;
/// Persistence of players, games and plays.
pub mod record_store;
/// Storage abstraction layer for database operations.
pub mod storage;
