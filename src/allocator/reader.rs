//! Bounded reader over a single block

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::index::BlockLocation;

/// Reads exactly `size` bytes of a block, starting at its offset
///
/// Running out of file before the block is exhausted is reported as
/// [`io::ErrorKind::UnexpectedEof`] rather than a silent short read.
#[derive(Debug)]
pub struct BlockReader {
    inner: BufReader<File>,
    remaining: u64,
}

impl BlockReader {
    /// Open the file holding `location` inside `dir` and seek to the block
    pub fn open(dir: &Path, location: &BlockLocation) -> io::Result<Self> {
        let mut file = File::open(dir.join(&location.file_name))?;
        file.seek(SeekFrom::Start(location.offset))?;

        Ok(Self {
            inner: BufReader::new(file),
            remaining: location.size,
        })
    }

    /// Bytes of the block not read yet
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Read for BlockReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("block ended {} bytes early", self.remaining),
            ));
        }

        self.remaining -= n as u64;
        Ok(n)
    }
}
