//! Block Allocator
//!
//! Turns values into block lists and recycles freed blocks.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::Result;
use crate::index::{BlockIndex, BlockLocation};

use super::{BlockReader, DATA_FILE_PREFIX, FREE_LIST_KEY};

/// Allocates value storage from a LIFO free list and fresh data files
///
/// ## Placement policy
/// 1. Pop the most recently freed block, fill as much of it as the value
///    needs, push any unused remainder back on top.
/// 2. Once the free list is empty, write the rest into new files of at most
///    `max_file_size` bytes each; the unused tail of the last file becomes a
///    free block.
///
/// No best-fit search and no coalescing: fragmentation is accepted.
#[derive(Debug)]
pub struct BlockAllocator {
    /// Directory holding the data files
    data_dir: PathBuf,

    /// Capacity of each data file
    max_file_size: u64,

    /// Free-list store, a single entry under [`FREE_LIST_KEY`]
    free_blocks: BlockIndex,
}

impl BlockAllocator {
    /// Open the allocator, loading the free list from `index_file` inside
    /// `data_dir`
    pub fn open(data_dir: &Path, index_file: &str, max_file_size: u64) -> Result<Self> {
        let free_blocks = BlockIndex::open(&data_dir.join(index_file))?;

        debug!(
            free_blocks = free_blocks.lookup(FREE_LIST_KEY).len(),
            max_file_size,
            "opened block allocator"
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            max_file_size,
            free_blocks,
        })
    }

    /// Write `value` to storage and return the blocks holding it, in order
    ///
    /// An empty value yields the single empty sentinel without any I/O.
    /// On an I/O failure the free list is left as it was before the call,
    /// while bytes already written stay on disk.
    pub fn allocate(&mut self, value: &[u8]) -> Result<Vec<BlockLocation>> {
        if value.is_empty() {
            return Ok(vec![BlockLocation::empty()]);
        }

        let mut free = self.free_blocks.lookup(FREE_LIST_KEY);
        let mut filled = Vec::new();
        let mut written = 0usize;

        // Step 1: Reuse free blocks, most recently freed first
        while written < value.len() {
            let Some(block) = free.pop() else {
                break;
            };
            if block.size == 0 {
                continue;
            }

            let remaining = (value.len() - written) as u64;
            let chunk = remaining.min(block.size);
            let end = written + chunk as usize;

            self.write_at(&block.file_name, block.offset, &value[written..end])?;
            trace!(file = %block.file_name, offset = block.offset, size = chunk, "reused free block");

            if chunk < block.size {
                free.push(BlockLocation::new(
                    block.file_name.clone(),
                    block.offset + chunk,
                    block.size - chunk,
                ));
            }
            filled.push(BlockLocation::new(block.file_name, block.offset, chunk));
            written = end;
        }

        // Step 2: Spill the rest into fresh data files
        while written < value.len() {
            let file_name = self.fresh_file_name()?;
            let remaining = (value.len() - written) as u64;
            let chunk = remaining.min(self.max_file_size);
            let end = written + chunk as usize;

            self.write_at(&file_name, 0, &value[written..end])?;
            debug!(file = %file_name, size = chunk, "created data file");

            if chunk < self.max_file_size {
                free.push(BlockLocation::new(
                    file_name.clone(),
                    chunk,
                    self.max_file_size - chunk,
                ));
            }
            filled.push(BlockLocation::new(file_name, 0, chunk));
            written = end;
        }

        // Step 3: Record the updated free list
        self.free_blocks.add(FREE_LIST_KEY, free);

        Ok(filled)
    }

    /// Return `locations` to the free list
    ///
    /// Blocks are appended in the given order, so the last one is reused
    /// first. The empty sentinel is skipped. Double frees are not detected.
    pub fn free(&mut self, locations: Vec<BlockLocation>) {
        let mut free = self.free_blocks.lookup(FREE_LIST_KEY);
        let before = free.len();
        free.extend(locations.into_iter().filter(|l| !l.is_empty_sentinel()));
        trace!(freed = free.len() - before, total = free.len(), "freed blocks");
        self.free_blocks.add(FREE_LIST_KEY, free);
    }

    /// Open a reader returning exactly the bytes of `location`
    pub fn open_read_stream(&self, location: &BlockLocation) -> Result<BlockReader> {
        Ok(BlockReader::open(&self.data_dir, location)?)
    }

    /// Read the whole content of `location`
    pub fn read_block(&self, location: &BlockLocation) -> Result<Vec<u8>> {
        if location.is_empty_sentinel() {
            return Ok(Vec::new());
        }

        let mut file = File::open(self.data_dir.join(&location.file_name))?;
        file.seek(SeekFrom::Start(location.offset))?;

        // Sizes come from disk, so the buffer grows with what is actually read
        let mut data = Vec::new();
        file.take(location.size).read_to_end(&mut data)?;
        if (data.len() as u64) < location.size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "block {}@{} ended {} bytes early",
                    location.file_name,
                    location.offset,
                    location.size - data.len() as u64
                ),
            )
            .into());
        }

        trace!(file = %location.file_name, offset = location.offset, size = location.size, "read block");
        Ok(data)
    }

    /// Flush the free list to its backing file
    pub fn close(&self) -> Result<()> {
        self.free_blocks.close()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the free list, in reuse order from last to first
    pub fn free_blocks(&self) -> Vec<BlockLocation> {
        self.free_blocks.lookup(FREE_LIST_KEY)
    }

    /// Directory holding the data files
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Capacity of each data file
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write `data` at `offset` of a data file, creating the file if needed
    fn write_at(&self, file_name: &str, offset: u64, data: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.data_dir.join(file_name))?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Next data file name, `data_<N>` with N the number of data files
    /// currently listed in the directory
    ///
    /// Always derived from the live listing, never cached.
    fn fresh_file_name(&self) -> Result<String> {
        let mut count = 0usize;
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(DATA_FILE_PREFIX)
            {
                count += 1;
            }
        }
        Ok(format!("{}{}", DATA_FILE_PREFIX, count))
    }
}
