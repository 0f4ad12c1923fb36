//! Store Module
//!
//! The key-value facade that composes the key index and the block allocator.
//!
//! ## Responsibilities
//! - Map caller keys to block lists through the key index
//! - Route value bytes through the allocator on upsert
//! - Free blocks of removed or overwritten values
//! - Enforce the `Open → Closed` lifecycle

mod stream;

pub use stream::ValueStream;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::allocator::BlockAllocator;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::index::{is_empty_value, BlockIndex, BlockLocation};

/// File-backed key-value store
///
/// ## Lifecycle
/// `Open → Closed`, one way. Every operation except [`close`](Self::close)
/// fails with [`StoreError::UseAfterClose`] once closed, and a second
/// `close` fails with [`StoreError::AlreadyClosed`].
///
/// ## Durability
/// Both indexes live in memory and are written out by `close` only. Value
/// bytes go straight to the data files. Dropping an open store loses every
/// index change made since it was opened.
///
/// ## Concurrency
/// None. Mutations take `&mut self`; the store assumes exclusive ownership
/// of its working directory.
pub struct KeyValueStore {
    /// Store configuration
    config: Config,

    /// Key → value blocks
    index: BlockIndex,

    /// Value storage and free list
    allocator: BlockAllocator,

    closed: bool,
}

impl KeyValueStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    pub const INDEX_FILENAME: &'static str = "index.info";
    pub const FREE_BLOCKS_FILENAME: &'static str = "FreeBlocks.info";

    /// Open the store in `config.data_dir`
    ///
    /// On startup:
    /// 1. Validate the directory and file capacity
    /// 2. Load (or create) the key index
    /// 3. Load (or create) the free-block index
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Check construction arguments
        config.validate()?;

        // Step 2: Key index
        let index = BlockIndex::open(&config.data_dir.join(Self::INDEX_FILENAME))?;

        // Step 3: Allocator with its free list
        let allocator = BlockAllocator::open(
            &config.data_dir,
            Self::FREE_BLOCKS_FILENAME,
            config.max_file_size,
        )?;

        info!(
            data_dir = %config.data_dir.display(),
            keys = index.len(),
            max_file_size = config.max_file_size,
            "opened store"
        );

        Ok(Self {
            config,
            index,
            allocator,
            closed: false,
        })
    }

    /// Open with a directory and file capacity (convenience method)
    pub fn open_path(path: &Path, max_file_size: u64) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .max_file_size(max_file_size)
            .build();
        Self::open(config)
    }

    /// Whether `key` currently has a value
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        self.check_open()?;
        Ok(!self.index.lookup(key).is_empty())
    }

    /// Insert or replace the value of `key`
    ///
    /// Replacing is never in place: the old blocks go back to the free list
    /// before the new value is allocated. A failure while writing leaves the
    /// key without a value.
    pub fn upsert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;

        let old_blocks = self.index.lookup(key);
        if !old_blocks.is_empty() {
            self.index.remove(key);
            self.allocator.free(old_blocks);
        }

        let blocks = self.allocator.allocate(value)?;
        debug!(key_len = key.len(), value_len = value.len(), blocks = blocks.len(), "upsert");
        self.index.add(key, blocks);

        Ok(())
    }

    /// Read the full value of `key`
    ///
    /// The empty sentinel short-circuits without touching disk.
    pub fn load_value(&self, key: &[u8]) -> Result<Vec<u8>> {
        let blocks = self.existing_blocks(key)?;
        if is_empty_value(&blocks) {
            return Ok(Vec::new());
        }

        blocks
            .iter()
            .try_fold(0u64, |total, block| total.checked_add(block.size))
            .ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "value size overflows u64",
                ))
            })?;

        let mut value = Vec::new();
        for block in &blocks {
            value.extend_from_slice(&self.allocator.read_block(block)?);
        }

        Ok(value)
    }

    /// Open a lazily read stream over the value of `key`
    pub fn open_value_stream(&self, key: &[u8]) -> Result<ValueStream<'_>> {
        let blocks = self.existing_blocks(key)?;
        Ok(ValueStream::new(&self.allocator, blocks))
    }

    /// Delete `key`, returning whether it had a value
    pub fn remove(&mut self, key: &[u8]) -> Result<bool> {
        self.check_open()?;

        let blocks = self.index.lookup(key);
        if blocks.is_empty() {
            return Ok(false);
        }

        self.allocator.free(blocks);
        self.index.remove(key);
        debug!(key_len = key.len(), "removed key");

        Ok(true)
    }

    /// Flush the key index, then the free list
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(StoreError::AlreadyClosed);
        }

        self.index.close()?;
        self.allocator.close()?;
        self.closed = true;

        info!(data_dir = %self.config.data_dir.display(), keys = self.index.len(), "closed store");
        Ok(())
    }

    // =========================================================================
    // Accessors (for tooling and tests)
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.index.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Live keys, in no particular order
    pub fn keys(&self) -> Result<Vec<Vec<u8>>> {
        self.check_open()?;
        Ok(self.index.keys().map(<[u8]>::to_vec).collect())
    }

    /// Snapshot of the allocator's free list
    pub fn free_blocks(&self) -> Result<Vec<BlockLocation>> {
        self.check_open()?;
        Ok(self.allocator.free_blocks())
    }

    /// Read access to the key index
    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    /// Working directory
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StoreError::UseAfterClose);
        }
        Ok(())
    }

    /// Blocks of a key that must exist
    fn existing_blocks(&self, key: &[u8]) -> Result<Vec<BlockLocation>> {
        self.check_open()?;

        let blocks = self.index.lookup(key);
        if blocks.is_empty() {
            return Err(StoreError::KeyNotFound);
        }
        Ok(blocks)
    }
}

impl Drop for KeyValueStore {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                data_dir = %self.config.data_dir.display(),
                "store dropped without close, index changes are lost"
            );
        }
    }
}
