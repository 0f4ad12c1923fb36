//! Index Module
//!
//! Durable mapping from a byte-string key to the ordered list of blocks
//! holding its value.
//!
//! ## Responsibilities
//! - Load the whole map from its backing file on open
//! - Serve lookups and mutations from memory
//! - Rewrite the backing file on close (no per-write durability)
//!
//! ## File Format
//! One line per key, tokens separated by single spaces:
//! ```text
//! ┌──────────────┬───────┬──────────┬────────┬──────┬─────┐
//! │ base64(key)  │ count │ fileName │ offset │ size │ ... │  (count triples)
//! └──────────────┴───────┴──────────┴────────┴──────┴─────┘
//! ```
//! A single malformed line fails the whole load.

mod line;
mod table;

pub use table::BlockIndex;

/// File name carried by the zero-length value sentinel
pub const EMPTY_VALUES_FILE: &str = "EmptyValuesFile";

/// A contiguous byte range `[offset, offset + size)` inside a data file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockLocation {
    /// Data file name, relative to the working directory
    pub file_name: String,

    /// Byte offset of the range start
    pub offset: u64,

    /// Length of the range in bytes
    pub size: u64,
}

impl BlockLocation {
    pub fn new(file_name: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            offset,
            size,
        }
    }

    /// The sentinel standing in for a zero-length value.
    ///
    /// It never refers to real storage: nothing is written for it, reads
    /// short-circuit on it and freeing it is a no-op.
    pub fn empty() -> Self {
        Self::new(EMPTY_VALUES_FILE, 0, 0)
    }

    pub fn is_empty_sentinel(&self) -> bool {
        self.file_name == EMPTY_VALUES_FILE && self.offset == 0 && self.size == 0
    }

    /// Offset one past the last byte of the range
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// True when a block list is exactly the zero-length value sentinel
pub fn is_empty_value(locations: &[BlockLocation]) -> bool {
    matches!(locations, [only] if only.is_empty_sentinel())
}
