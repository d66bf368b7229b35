use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::progress::errors::ProgressError;
use crate::progress::rank::RankTable;
use crate::progress::types::ProgressState;

const TREE_PROGRESS: &str = "progress";

/// Default logical key for the single progress record.
pub const DEFAULT_PROGRESS_KEY: &str = "userProgress";

/// Opaque key-value blob store the progress record is written into.
pub trait BlobStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProgressError>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ProgressError>;
}

/// Sled-backed blob store.
pub struct SledBlobStore {
    _db: sled::Db,
    tree: sled::Tree,
}

impl SledBlobStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let tree = db.open_tree(TREE_PROGRESS)?;
        Ok(Self { _db: db, tree })
    }
}

impl BlobStore for SledBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProgressError> {
        Ok(self.tree.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ProgressError> {
        self.tree.insert(key.as_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }
}

/// In-memory blob store for tests and ephemeral sessions. Clones share the
/// same map, and writes can be made to fail on demand.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<Mutex<bool>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `put` calls fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut guard) = self.fail_writes.lock() {
            *guard = fail;
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|g| *g).unwrap_or(0)
    }

    /// Seed a raw blob, e.g. to simulate corruption.
    pub fn insert_raw(&self, key: &str, bytes: &[u8]) {
        if let Ok(mut guard) = self.blobs.lock() {
            guard.insert(key.to_string(), bytes.to_vec());
        }
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().ok()?.get(key).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProgressError> {
        let guard = self
            .blobs
            .lock()
            .map_err(|_| ProgressError::Persist("memory store poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ProgressError> {
        if self.fail_writes.lock().map(|g| *g).unwrap_or(false) {
            return Err(ProgressError::Persist(format!("write to '{}' rejected", key)));
        }
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| ProgressError::Persist("memory store poisoned".into()))?;
        guard.insert(key.to_string(), bytes.to_vec());
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}

/// Owns the canonical `ProgressState` and writes it to the backing blob
/// store under one logical key.
pub struct ProgressStore<B: BlobStore> {
    blobs: B,
    key: String,
    state: ProgressState,
}

impl<B: BlobStore> ProgressStore<B> {
    /// Wrap a blob store and load the current record from it.
    pub fn open(blobs: B, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = Self::read(&blobs, &key).unwrap_or_else(|e| {
            warn!("discarding unreadable progress record '{}': {}", key, e);
            ProgressState::default()
        });
        Self { blobs, key, state }
    }

    fn read(blobs: &B, key: &str) -> Result<ProgressState, ProgressError> {
        let Some(bytes) = blobs.get(key)? else {
            debug!("no progress record under '{}', starting fresh", key);
            return Ok(ProgressState::default());
        };
        serde_json::from_slice(&bytes).map_err(|e| ProgressError::Deserialize(e.to_string()))
    }

    /// Re-read the record from the blob store. Missing or malformed data
    /// yields a fresh zero-value state; this never fails.
    pub fn load(&mut self) -> ProgressState {
        self.state = Self::read(&self.blobs, &self.key).unwrap_or_else(|e| {
            warn!("discarding unreadable progress record '{}': {}", self.key, e);
            ProgressState::default()
        });
        self.state.clone()
    }

    /// Serialize and write the current state. On failure the in-memory state
    /// is left untouched.
    pub fn save(&self) -> Result<(), ProgressError> {
        let bytes = serde_json::to_vec(&self.state)
            .map_err(|e| ProgressError::Persist(format!("encode failed: {}", e)))?;
        self.blobs.put(&self.key, &bytes).map_err(|e| match e {
            ProgressError::Persist(msg) => ProgressError::Persist(msg),
            other => ProgressError::Persist(other.to_string()),
        })
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Mutable access for the engine; callers outside the crate go through
    /// `ProgressEngine`.
    pub(crate) fn state_mut(&mut self) -> &mut ProgressState {
        &mut self.state
    }

    pub(crate) fn replace(&mut self, state: ProgressState) {
        self.state = state;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Bring a loaded record in line with the current content: drop unlocked
    /// ids that are no longer in the catalog or are repeated, and re-derive
    /// the rank from the point total.
    pub(crate) fn normalize(&mut self, ranks: &RankTable, known: impl Fn(&str) -> bool) {
        let state = &mut self.state;
        let mut seen = std::collections::HashSet::new();
        let before = state.unlocked_achievements.len();
        state
            .unlocked_achievements
            .retain(|id| known(id.as_str()) && seen.insert(id.clone()));
        if state.unlocked_achievements.len() != before {
            warn!(
                "dropped {} stale achievement ids from stored progress",
                before - state.unlocked_achievements.len()
            );
        }
        let derived = ranks.rank_for(state.total_points);
        if derived != state.current_rank {
            debug!(
                "stored rank {:?} does not match {} points; using {:?}",
                state.current_rank, state.total_points, derived
            );
            state.current_rank = derived;
        }
    }
}

/// Resolve the sled database directory for a data dir.
pub fn progress_db_path<P: AsRef<Path>>(data_dir: P) -> PathBuf {
    data_dir.as_ref().join("progress")
}
