//! In-memory store engine, selected when no `DATABASE_URL`/`DB_*` config
//! is present (config table: "If none present, in-memory"). Also the
//! backend every unit test in this crate runs against.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::WorldState;

use super::{Store, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<WorldState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: WorldState) -> Self {
        Self {
            inner: RwLock::new(state),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_all(&self) -> StoreResult<WorldState> {
        Ok(self.inner.read().await.clone())
    }

    async fn save_all(&self, state: &WorldState) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        *guard = state.clone();
        Ok(())
    }

    async fn clear_all(&self) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        *guard = WorldState::new();
        Ok(())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
