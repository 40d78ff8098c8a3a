//! Single-writer save chain: each save call appends to a queue so that
//! no two snapshots overlap in flight, and callers don't have to await
//! durability unless they need it before replying.
//!
//! A background task off-loads the expensive, strictly-ordered write work
//! so the caller is never blocked on it.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::model::WorldState;

use super::{Store, StoreResult};

enum Job {
    Save(WorldState, Option<oneshot::Sender<StoreResult<()>>>),
}

/// Wraps any [`Store`] and funnels every `save` through a single background
/// task, so concurrent callers never race two `save_all` calls against each
/// other. `save_and_forget` queues without waiting; `save_and_wait` blocks
/// the caller until that specific snapshot has landed.
pub struct Saver {
    tx: mpsc::UnboundedSender<Job>,
    handle: JoinHandle<()>,
}

impl Saver {
    pub fn spawn(store: Arc<dyn Store>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Save(state, ack) => {
                        let result = store.save_all(&state).await;
                        if let Err(ref e) = result {
                            log::error!("background save failed: {e}");
                        }
                        if let Some(ack) = ack {
                            let _ = ack.send(result);
                        }
                    }
                }
            }
        });
        Self { tx, handle }
    }

    /// Enqueue a snapshot; returns immediately, never awaiting the write.
    pub fn save_and_forget(&self, state: WorldState) {
        if self.tx.send(Job::Save(state, None)).is_err() {
            log::error!("save chain is closed, dropping snapshot");
        }
    }

    /// Enqueue a snapshot and await its durability before returning.
    pub async fn save_and_wait(&self, state: WorldState) -> StoreResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Job::Save(state, Some(ack_tx))).is_err() {
            return Err(super::StoreError::Database("save chain is closed".to_string()));
        }
        ack_rx
        .await
        .unwrap_or_else(|_| Err(super::StoreError::Database("save task dropped".to_string())))
    }

    /// Drop the sender and wait for the queue to drain, used on shutdown.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::Player;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn queued_saves_apply_in_order() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let saver = Saver::spawn(store.clone());

        let mut state = WorldState::new();
        state.players.insert(1, Player::new(1, None, "a".into()));
        saver.save_and_wait(state.clone()).await.unwrap();

        state.players.insert(2, Player::new(2, None, "b".into()));
        saver.save_and_wait(state.clone()).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.players.len(), 2);
        saver.shutdown.await;
    }

    #[tokio::test]
    async fn save_and_forget_does_not_block() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let saver = Saver::spawn(store.clone());
        let mut state = WorldState::new();
        state.players.insert(9, Player::new(9, None, "x".into()));
        saver.save_and_forget(state);
        saver.shutdown.await;

        let loaded = store.load_all().await.unwrap();
        assert!(loaded.players.contains_key(&9));
    }
}
