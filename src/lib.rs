//! # BlockKV
//!
//! A file-backed key-value store with:
//! - Arbitrary byte-string keys and values
//! - Values split into blocks across fixed-capacity data files
//! - Block reuse through a persisted LIFO free list
//! - Load-on-open, flush-on-close indexes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KeyValueStore                          │
//! │   contains / upsert / load_value / open_value_stream /      │
//! │                   remove / close                            │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │                             │
//!                 ▼                             ▼
//!         ┌──────────────┐             ┌────────────────┐
//!         │  BlockIndex  │             │ BlockAllocator │
//!         │ (index.info) │             │  (data_<N>)    │
//!         └──────────────┘             └───────┬────────┘
//!                                              │
//!                                              ▼
//!                                      ┌──────────────────┐
//!                                      │    BlockIndex    │
//!                                      │ (FreeBlocks.info)│
//!                                      └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use blockkv::KeyValueStore;
//!
//! # fn main() -> blockkv::Result<()> {
//! let mut store = KeyValueStore::open_path(std::path::Path::new("./data"), 4096)?;
//! store.upsert(b"hello", b"world")?;
//! assert_eq!(store.load_value(b"hello")?, b"world");
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod allocator;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::Config;
pub use index::{BlockIndex, BlockLocation};
pub use allocator::BlockAllocator;
pub use store::{KeyValueStore, ValueStream};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of BlockKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
