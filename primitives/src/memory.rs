//! Memory bridge — the host-owned linear memory seen from the guest.
//!
//! [`MemoryBridge`] is the given capability set (allocate / resolve / read)
//! that the value codec stages richer values through. On wasm it is backed
//! by host imports; in tests it is backed by [`Arena`], a bump allocator
//! over a plain byte vector.

use std::collections::BTreeMap;

use crate::error::{CodecError, CodecResult};
use crate::types::{MemoryHandle, Region};

/// Allocate / resolve / read over host linear memory.
pub trait MemoryBridge {
    /// Allocate a block holding exactly `bytes` and return its handle.
    fn allocate(&mut self, bytes: &[u8]) -> CodecResult<MemoryHandle>;

    /// Resolve an offset to the block it starts. `None` if the offset does
    /// not denote a live allocation.
    fn resolve(&self, offset: u64) -> Option<Region>;

    /// Copy the bytes of a resolved region out of linear memory.
    fn read_bytes(&self, region: Region) -> Vec<u8>;

    /// Read a region as UTF-8 text.
    fn read_text(&self, region: Region) -> CodecResult<String> {
        String::from_utf8(self.read_bytes(region)).map_err(|_| CodecError::Utf8)
    }

    /// Release a block. Hosts that reclaim memory per invocation may ignore this.
    fn free(&mut self, _handle: MemoryHandle) {}
}

/// Round up to the next multiple of 8.
fn align8(size: usize) -> usize {
    (size + 7) & !7
}

/// First offset handed out by an [`Arena`]; everything below is reserved so
/// that offset 0 never denotes a block.
pub const ARENA_BASE: usize = 8;

/// Default arena capacity: 16 MiB.
pub const DEFAULT_ARENA_CAPACITY: usize = 16 * 1024 * 1024;

/// In-memory linear memory with a bump allocator.
///
/// Blocks are 8-byte aligned and never reused; `free` only forgets the
/// block so it stops resolving.
#[derive(Debug, Clone)]
pub struct Arena {
    data: Vec<u8>,
    bump: usize,
    capacity: usize,
    blocks: BTreeMap<u64, u64>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ARENA_CAPACITY)
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena that refuses to grow past `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; ARENA_BASE],
            bump: ARENA_BASE,
            capacity,
            blocks: BTreeMap::new(),
        }
    }

    /// Number of live blocks.
    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.bump - ARENA_BASE
    }
}

impl MemoryBridge for Arena {
    fn allocate(&mut self, bytes: &[u8]) -> CodecResult<MemoryHandle> {
        let ptr = self.bump;
        let end = ptr
            .checked_add(align8(bytes.len().max(1)))
            .ok_or_else(|| CodecError::Allocation("offset overflow".into()))?;
        if end > self.capacity {
            return Err(CodecError::Allocation(format!(
                "{} bytes requested, {} of {} in use",
                bytes.len(),
                self.bump,
                self.capacity
            )));
        }
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[ptr..ptr + bytes.len()].copy_from_slice(bytes);
        self.bump = end;
        self.blocks.insert(ptr as u64, bytes.len() as u64);
        Ok(MemoryHandle(ptr as u64))
    }

    fn resolve(&self, offset: u64) -> Option<Region> {
        self.blocks
            .get(&offset)
            .map(|len| Region::new(offset, *len))
    }

    fn read_bytes(&self, region: Region) -> Vec<u8> {
        let start = region.offset as usize;
        let end = start.saturating_add(region.len as usize).min(self.data.len());
        if start >= end {
            return Vec::new();
        }
        self.data[start..end].to_vec()
    }

    fn free(&mut self, handle: MemoryHandle) {
        self.blocks.remove(&handle.offset());
    }
}
