//! Tests for BlockAllocator
//!
//! These tests verify:
//! - Empty values use the sentinel without I/O
//! - Values spill across fresh data files of fixed capacity
//! - Freed blocks are reused LIFO and split when partially used
//! - The free list persists through close and reopen
//! - Bounded block readers

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use blockkv::allocator::BlockAllocator;
use blockkv::index::BlockLocation;
use tempfile::TempDir;

const FREE_BLOCKS_FILE: &str = "FreeBlocks.info";

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_allocator(max_file_size: u64) -> (TempDir, BlockAllocator) {
    let temp_dir = TempDir::new().unwrap();
    let allocator = BlockAllocator::open(temp_dir.path(), FREE_BLOCKS_FILE, max_file_size).unwrap();
    (temp_dir, allocator)
}

fn data_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("data_"))
        .collect();
    names.sort();
    names
}

fn read_all(allocator: &BlockAllocator, blocks: &[BlockLocation]) -> Vec<u8> {
    blocks
        .iter()
        .flat_map(|b| allocator.read_block(b).unwrap())
        .collect()
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn test_allocate_empty_value_returns_sentinel() {
    let (temp, mut allocator) = setup_allocator(10);

    let blocks = allocator.allocate(b"").unwrap();

    assert_eq!(blocks, vec![BlockLocation::empty()]);
    assert!(data_files(temp.path()).is_empty());
    assert!(allocator.free_blocks().is_empty());
}

#[test]
fn test_allocate_small_value_leaves_tail_free() {
    let (temp, mut allocator) = setup_allocator(10);

    let blocks = allocator.allocate(b"abc").unwrap();

    assert_eq!(blocks, vec![BlockLocation::new("data_0", 0, 3)]);
    assert_eq!(allocator.free_blocks(), vec![BlockLocation::new("data_0", 3, 7)]);
    assert_eq!(data_files(temp.path()), vec!["data_0"]);
    assert_eq!(fs::read(temp.path().join("data_0")).unwrap(), b"abc");
}

#[test]
fn test_allocate_spans_multiple_files() {
    let (temp, mut allocator) = setup_allocator(10);
    let value = vec![b'x'; 25];

    let blocks = allocator.allocate(&value).unwrap();

    assert_eq!(
        blocks,
        vec![
            BlockLocation::new("data_0", 0, 10),
            BlockLocation::new("data_1", 0, 10),
            BlockLocation::new("data_2", 0, 5),
        ]
    );
    assert_eq!(allocator.free_blocks(), vec![BlockLocation::new("data_2", 5, 5)]);
    assert_eq!(read_all(&allocator, &blocks), value);
    assert_eq!(data_files(temp.path()).len(), 3);
}

#[test]
fn test_exact_multiple_leaves_no_free_tail() {
    let (_temp, mut allocator) = setup_allocator(4);

    let blocks = allocator.allocate(b"12345678").unwrap();

    assert_eq!(blocks.len(), 2);
    assert!(allocator.free_blocks().is_empty());
}

#[test]
fn test_allocate_fills_free_tail_before_new_file() {
    let (temp, mut allocator) = setup_allocator(10);

    allocator.allocate(b"aaaa").unwrap();
    let blocks = allocator.allocate(b"bbbbbbbb").unwrap();

    // 6 bytes fit in the tail of data_0, the remaining 2 open data_1
    assert_eq!(
        blocks,
        vec![
            BlockLocation::new("data_0", 4, 6),
            BlockLocation::new("data_1", 0, 2),
        ]
    );
    assert_eq!(allocator.free_blocks(), vec![BlockLocation::new("data_1", 2, 8)]);
    assert_eq!(read_all(&allocator, &blocks), b"bbbbbbbb");
    assert_eq!(data_files(temp.path()), vec!["data_0", "data_1"]);
}

#[test]
fn test_file_names_ignore_index_files() {
    let (temp, mut allocator) = setup_allocator(10);
    fs::write(temp.path().join("index.info"), b"").unwrap();

    let blocks = allocator.allocate(b"x").unwrap();

    assert!(temp.path().join(FREE_BLOCKS_FILE).exists());
    assert_eq!(blocks[0].file_name, "data_0");
}

#[test]
fn test_file_names_follow_directory_listing() {
    let (temp, mut allocator) = setup_allocator(10);
    // A data file created behind the allocator's back shifts the numbering
    fs::write(temp.path().join("data_0"), b"").unwrap();

    let blocks = allocator.allocate(b"x").unwrap();

    assert_eq!(blocks[0].file_name, "data_1");
}

// =============================================================================
// Free List Tests
// =============================================================================

#[test]
fn test_free_then_reuse_is_lifo() {
    let (temp, mut allocator) = setup_allocator(10);

    let first = allocator.allocate(&[b'1'; 10]).unwrap();
    let second = allocator.allocate(&[b'2'; 10]).unwrap();
    allocator.free(first);
    allocator.free(second);

    let blocks = allocator.allocate(b"zz").unwrap();

    assert_eq!(blocks, vec![BlockLocation::new("data_1", 0, 2)]);
    assert_eq!(
        allocator.free_blocks(),
        vec![
            BlockLocation::new("data_0", 0, 10),
            BlockLocation::new("data_1", 2, 8),
        ]
    );
    assert_eq!(data_files(temp.path()).len(), 2);
}

#[test]
fn test_free_does_not_coalesce() {
    let (_temp, mut allocator) = setup_allocator(10);

    let a = allocator.allocate(b"aaaaa").unwrap();
    let b = allocator.allocate(b"bbbbb").unwrap();
    allocator.free(a);
    allocator.free(b);

    assert_eq!(
        allocator.free_blocks(),
        vec![
            BlockLocation::new("data_0", 0, 5),
            BlockLocation::new("data_0", 5, 5),
        ]
    );
}

#[test]
fn test_reuse_across_several_free_blocks() {
    let (temp, mut allocator) = setup_allocator(10);

    let a = allocator.allocate(b"aaaaa").unwrap();
    let b = allocator.allocate(b"bbbbb").unwrap();
    allocator.free(a);
    allocator.free(b);

    let blocks = allocator.allocate(b"0123456").unwrap();

    // Last freed block (data_0@5) is filled first
    assert_eq!(
        blocks,
        vec![
            BlockLocation::new("data_0", 5, 5),
            BlockLocation::new("data_0", 0, 2),
        ]
    );
    assert_eq!(allocator.free_blocks(), vec![BlockLocation::new("data_0", 2, 3)]);
    assert_eq!(read_all(&allocator, &blocks), b"0123456");
    assert_eq!(data_files(temp.path()), vec!["data_0"]);
}

#[test]
fn test_free_skips_empty_sentinel() {
    let (_temp, mut allocator) = setup_allocator(10);

    allocator.free(vec![BlockLocation::empty()]);

    assert!(allocator.free_blocks().is_empty());
}

#[test]
fn test_free_list_persists() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut allocator = BlockAllocator::open(temp_dir.path(), FREE_BLOCKS_FILE, 10).unwrap();
        let blocks = allocator.allocate(b"abcdef").unwrap();
        allocator.free(blocks);
        allocator.close().unwrap();
    }

    let allocator = BlockAllocator::open(temp_dir.path(), FREE_BLOCKS_FILE, 10).unwrap();
    assert_eq!(
        allocator.free_blocks(),
        vec![
            BlockLocation::new("data_0", 6, 4),
            BlockLocation::new("data_0", 0, 6),
        ]
    );

    let contents = fs::read_to_string(temp_dir.path().join(FREE_BLOCKS_FILE)).unwrap();
    assert!(contents.starts_with("ZGVmYXVsdA== 2 "));
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_open_read_stream_is_bounded() {
    let (_temp, mut allocator) = setup_allocator(10);
    allocator.allocate(b"0123456789").unwrap();

    let mut reader = allocator
        .open_read_stream(&BlockLocation::new("data_0", 3, 4))
        .unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();

    assert_eq!(out, b"3456");
}

#[test]
fn test_open_read_stream_reports_short_file() {
    let (_temp, mut allocator) = setup_allocator(10);
    allocator.allocate(b"012").unwrap();

    // data_0 only holds 3 bytes, the block claims 5
    let mut reader = allocator
        .open_read_stream(&BlockLocation::new("data_0", 0, 5))
        .unwrap();
    let mut out = Vec::new();
    let err = reader.read_to_end(&mut out).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn test_read_block_of_sentinel_is_empty() {
    let (_temp, allocator) = setup_allocator(10);

    assert!(allocator.read_block(&BlockLocation::empty()).unwrap().is_empty());
}

#[test]
fn test_read_block_missing_file_fails() {
    let (_temp, allocator) = setup_allocator(10);

    assert!(allocator
        .read_block(&BlockLocation::new("data_7", 0, 1))
        .is_err());
}
