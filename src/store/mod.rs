//! Persistent world-state store.
//!
//! The core only depends on a two-operation query abstraction
//! (`load_all`/`save_all`, plus `clear_all` for admin resets); the concrete
//! engine (in-memory, Postgres, MySQL) is selected at startup from config
//! and hidden behind the [`Store`] trait, the same one-capability-many-
//! backends shape the [`crate::messenger`] contract uses on the transport
//! side.

pub mod memory;
pub mod saver;
pub mod schema;
pub mod sql;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::WorldState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn load_all(&self) -> StoreResult<WorldState>;
    async fn save_all(&self, state: &WorldState) -> StoreResult<()>;
    async fn clear_all(&self) -> StoreResult<()>;
}

pub use memory::MemoryStore;
pub use saver::Saver;
