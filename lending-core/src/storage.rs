//! Snapshot persistence
//!
//! The whole pool (parameters, balances, positions, journal) is written as
//! one bincode record. Writes go to a temporary file that is then renamed
//! over the previous snapshot, so a crash mid-write leaves the old one intact.

use crate::{
    error::{Error, Result},
    types::PoolSnapshot,
    Config,
};
use std::path::{Path, PathBuf};

/// Snapshot file name inside the data directory
const SNAPSHOT_FILE: &str = "pool.snapshot";

/// Temporary file used while writing
const SNAPSHOT_TMP_FILE: &str = "pool.snapshot.tmp";

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open store in the configured data directory, creating it if missing
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_dir(&config.snapshot.data_dir)
    }

    /// Open store in `dir`, creating it if missing
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the current snapshot
    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Persist `snapshot`, replacing the previous one
    pub fn save(&self, snapshot: &PoolSnapshot) -> Result<()> {
        let bytes = bincode::serialize(snapshot)?;
        let tmp = self.dir.join(SNAPSHOT_TMP_FILE);

        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, self.path())?;

        tracing::info!(
            path = %self.path().display(),
            bytes = bytes.len(),
            events = snapshot.events.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Load the latest snapshot, if one exists
    pub fn load(&self) -> Result<Option<PoolSnapshot>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(&path)?;
        let snapshot: PoolSnapshot = bincode::deserialize(&bytes).map_err(|e| {
            Error::Storage(format!("Failed to decode {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), taken_at = %snapshot.taken_at, "Snapshot loaded");
        Ok(Some(snapshot))
    }
}
