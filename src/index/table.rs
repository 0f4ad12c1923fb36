//! BlockIndex implementation
//!
//! HashMap-backed index, loaded eagerly and flushed on close.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};

use super::line::{decode_entry, encode_entry};
use super::BlockLocation;

/// Durable key → block list map
///
/// All reads and writes hit the in-memory map. The backing file is only
/// read by [`BlockIndex::open`] and only rewritten by [`BlockIndex::close`].
#[derive(Debug)]
pub struct BlockIndex {
    /// Backing file
    path: PathBuf,

    /// Key → ordered blocks
    entries: HashMap<Vec<u8>, Vec<BlockLocation>>,
}

impl BlockIndex {
    /// Open the index stored at `path`, creating an empty file if absent
    ///
    /// Fails with [`StoreError::MalformedIndexFile`] on the first line that
    /// does not parse; nothing of a partially valid file is kept.
    pub fn open(path: &Path) -> Result<Self> {
        // Create the file if absent, leave existing content untouched
        OpenOptions::new().create(true).append(true).open(path)?;

        let contents = fs::read(path)?;
        let mut entries = HashMap::new();

        for (number, raw) in contents.split(|&b| b == b'\n').enumerate() {
            let malformed = |reason: String| StoreError::MalformedIndexFile {
                path: path.to_path_buf(),
                line: number + 1,
                reason,
            };

            let line = std::str::from_utf8(raw)
                .map_err(|e| malformed(format!("invalid UTF-8: {}", e)))?;
            if line.trim().is_empty() {
                continue;
            }

            let (key, locations) = decode_entry(line).map_err(malformed)?;
            entries.insert(key, locations);
        }

        debug!(path = %path.display(), entries = entries.len(), "loaded block index");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Insert or replace the blocks recorded for `key`
    pub fn add(&mut self, key: &[u8], locations: Vec<BlockLocation>) {
        self.entries.insert(key.to_vec(), locations);
    }

    /// Drop the entry for `key`; no-op when absent
    pub fn remove(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    /// Copy of the blocks recorded for `key`, empty when absent
    pub fn lookup(&self, key: &[u8]) -> Vec<BlockLocation> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Write the whole map to the backing file, replacing its content
    ///
    /// Closing twice rewrites the same content.
    pub fn close(&self) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for (key, locations) in &self.entries {
            writeln!(writer, "{}", encode_entry(key, locations))?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "flushed block index");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in map order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(Vec::as_slice)
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
