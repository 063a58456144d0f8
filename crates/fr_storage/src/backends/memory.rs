use async_trait::async_trait;
use fr_core::{LedgerState, LedgerStore, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Ledger store that lives only as long as the process. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: RwLock<Option<LedgerState>>,
    saves: AtomicUsize,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<LedgerState> {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<Option<LedgerState>> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &LedgerState) -> Result<()> {
        *self.state.write().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryLedgerStore::new();
        assert!(store.load().await.unwrap().is_none());

        let mut state = LedgerState::empty_at(Utc::now());
        state.request_count = 3;
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(state));
        assert_eq!(store.save_count(), 1);
    }
}
