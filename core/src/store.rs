//! # Store
//!
//! Snapshot persistence on an embedded sled database. The desk's state is
//! small, so the whole [`DeskSnapshot`] is written as a single JSON value
//! under one key and flushed on every save; recovery is a single read at
//! startup.

use std::path::Path;

use thiserror::Error;

use crate::desk::DeskSnapshot;

const STATE_KEY: &[u8] = b"desk/state";

/// Errors produced by the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("store backend error: {0}")]
    Backend(#[from] sled::Error),

    /// A persisted snapshot could not be decoded.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Durable home for the desk snapshot.
pub struct DeskStore {
    db: sled::Db,
}

impl DeskStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Persists the snapshot and flushes to disk.
    pub fn save(&self, snapshot: &DeskSnapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(snapshot)?;
        self.db.insert(STATE_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Loads the persisted snapshot, if one exists.
    pub fn load(&self) -> Result<Option<DeskSnapshot>, StoreError> {
        match self.db.get(STATE_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
