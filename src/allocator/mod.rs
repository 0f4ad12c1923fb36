//! Allocator Module
//!
//! Carves values into blocks backed by fixed-capacity data files.
//!
//! ## Responsibilities
//! - Place value bytes into recycled free blocks first (LIFO)
//! - Append fresh `data_<N>` files once the free list runs dry
//! - Return the blocks of deleted or overwritten values to the free list
//! - Open bounded readers over single blocks
//!
//! ## Free List
//! The free list is a plain [`BlockIndex`](crate::index::BlockIndex) entry
//! under the key `"default"`, persisted in its own file. Adjacent free blocks
//! are never merged.
//!
//! ```text
//!  free list: [ data_0@4+6 , data_1@5+5 ]           allocate(3 bytes)
//!                                  ▲ pop last
//!  data_1:    [ xxxxx | vvv | ... ]
//!  free list: [ data_0@4+6 , data_1@8+2 ]           remainder pushed back
//! ```

mod manager;
mod reader;

pub use manager::BlockAllocator;
pub use reader::BlockReader;

/// Name prefix shared by every data file
pub const DATA_FILE_PREFIX: &str = "data_";

/// Key of the single free-list entry inside the free-block index
pub const FREE_LIST_KEY: &[u8] = b"default";
