//! Streaming value reads
//!
//! Chains per-block readers so block boundaries are invisible to callers.

use std::collections::VecDeque;
use std::io::{self, Read};

use crate::allocator::{BlockAllocator, BlockReader};
use crate::error::StoreError;
use crate::index::BlockLocation;

/// Sequential reader over the concatenated blocks of one value
///
/// Each block file is opened only when the stream reaches it. The stream
/// borrows the store, so the value cannot be overwritten underneath it.
pub struct ValueStream<'a> {
    allocator: &'a BlockAllocator,
    pending: VecDeque<BlockLocation>,
    current: Option<BlockReader>,
}

impl<'a> ValueStream<'a> {
    pub(crate) fn new(allocator: &'a BlockAllocator, blocks: Vec<BlockLocation>) -> Self {
        Self {
            allocator,
            pending: blocks
                .into_iter()
                .filter(|block| !block.is_empty_sentinel())
                .collect(),
            current: None,
        }
    }

    /// Blocks not opened yet
    pub fn pending_blocks(&self) -> usize {
        self.pending.len()
    }
}

impl Read for ValueStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if let Some(reader) = self.current.as_mut() {
                if reader.remaining() > 0 {
                    return reader.read(buf);
                }
                self.current = None;
            }

            let Some(next) = self.pending.pop_front() else {
                return Ok(0);
            };
            let reader = self.allocator.open_read_stream(&next).map_err(|e| match e {
                StoreError::Io(io_error) => io_error,
                other => io::Error::new(io::ErrorKind::Other, other),
            })?;
            self.current = Some(reader);
        }
    }
}
