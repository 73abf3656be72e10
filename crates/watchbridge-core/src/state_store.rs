use anyhow::Result;
use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use watchbridge_models::SyncState;

/// On-disk store for per-category delta-sync state.
///
/// Binary format (bincode) with gzip compression; one blob per category.
/// A blob that fails to decode is treated as absent rather than fatal, so a
/// format change just forces one full export pass.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}_state.bin", category))
    }

    pub fn load(&self, category: &str) -> SyncState {
        let path = self.path_for(category);
        if !path.exists() {
            debug!(category, "No sync state on disk, starting empty");
            return SyncState::new();
        }

        match self.read_blob(&path) {
            Ok(state) => {
                debug!(category, entries = state.len(), "Loaded sync state");
                state
            }
            Err(e) => {
                warn!(category, error = %e, "Sync state unreadable, starting empty");
                SyncState::new()
            }
        }
    }

    fn read_blob(&self, path: &Path) -> Result<SyncState> {
        let data = std::fs::read(path)?;
        let mut decoder = GzDecoder::new(&data[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(deserialize(&decompressed)?)
    }

    /// Write-then-rename so a crash mid-write never corrupts the prior state.
    pub fn save(&self, category: &str, state: &SyncState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(category);
        let tmp = path.with_extension("bin.tmp");

        let encoded = serialize(state)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        let compressed = encoder.finish()?;

        std::fs::write(&tmp, compressed)?;
        std::fs::rename(&tmp, &path)?;
        debug!(category, entries = state.len(), "Saved sync state");
        Ok(())
    }
}
