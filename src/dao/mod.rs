/// Battle state storage and retrieval operations.
pub mod battle_store;
/// Domain model definitions.
pub mod models;
/// Storage abstraction layer for remote operations.
pub mod storage;
