use std::path::{Path, PathBuf};

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::PersistError;
use crate::types::session::SessionSnapshot;

/// Receives the terminal snapshot of every finished session.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistError>;
    fn load(&self, session_id: Uuid) -> Result<Option<SessionSnapshot>, PersistError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: DashMap<Uuid, SessionSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistError> {
        self.snapshots.insert(snapshot.session_id, snapshot.clone());
        Ok(())
    }

    fn load(&self, session_id: Uuid) -> Result<Option<SessionSnapshot>, PersistError> {
        Ok(self.snapshots.get(&session_id).map(|entry| entry.clone()))
    }
}

/// One pretty-printed JSON document per session under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(self.path_for(snapshot.session_id), bytes)?;
        Ok(())
    }

    fn load(&self, session_id: Uuid) -> Result<Option<SessionSnapshot>, PersistError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}
