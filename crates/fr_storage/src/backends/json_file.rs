use async_trait::async_trait;
use fr_core::{Error, LedgerState, LedgerStore, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ledger persisted as a single JSON document.
///
/// Writes go to a temp file in the same directory and are renamed into place,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Option<LedgerState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            Error::Storage(format!("Corrupt ledger file {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, state: &LedgerState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create ledger directory: {}", e)))?;

        let body = serde_json::to_vec_pretty(state)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&body)?;
            tmp.flush()?;
            tmp.persist(&path)
                .map_err(|e| Error::Storage(format!("Failed to persist ledger: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::External(e.into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("cost-ledger.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_parent_and_reloads() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("cost-ledger.json"));

        let mut state = LedgerState::empty_at(Utc::now());
        state.total_cost_usd = 1.25;
        state.input_tokens = 4000;
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cost-ledger.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
