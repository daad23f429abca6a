//! Boundary scalars, memory handles, and shared constants.
//!
//! The host/guest boundary only ever exchanges 64-bit scalars. A scalar is
//! either an offset into host-owned linear memory (a [`MemoryHandle`]) or a
//! raw integer carried as two's-complement bits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value crossing the host/guest boundary.
pub type Scalar = u64;

/// Returned by a dispatch edge when the export failed.
///
/// All bits set: offset `u64::MAX` is never a valid allocation, so the
/// sentinel cannot collide with a real handle. It does collide with an
/// integer result of `-1`, which crosses as the same bits; callers that
/// need to tell them apart check the error channel.
pub const FAILURE_SENTINEL: Scalar = u64::MAX;

/// The widest host call the shim provides (`__invokeHostFunc_5_*`).
pub const MAX_HOST_ARGS: usize = 5;

/// Opaque offset into host-owned linear memory.
///
/// Valid only for the invocation that produced it. Offset 0 is reserved
/// for "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryHandle(pub u64);

impl MemoryHandle {
    /// The absent handle (offset 0).
    pub const NULL: Self = Self(0);

    /// Raw offset of this handle.
    pub fn offset(self) -> u64 {
        self.0
    }

    /// Returns true for the absent handle.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for MemoryHandle {
    fn from(offset: u64) -> Self {
        Self(offset)
    }
}

impl fmt::Display for MemoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:#x}", self.0)
    }
}

/// A resolved byte range inside linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: u64,
    pub len: u64,
}

impl Region {
    pub fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// The handle that resolves to this region.
    pub fn handle(self) -> MemoryHandle {
        MemoryHandle(self.offset)
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Reinterpret a signed integer as a boundary scalar.
pub fn int_to_scalar(v: i64) -> Scalar {
    v as u64
}

/// Reinterpret a boundary scalar as a signed integer.
pub fn scalar_to_int(s: Scalar) -> i64 {
    s as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle() {
        assert!(MemoryHandle::NULL.is_null());
        assert_eq!(MemoryHandle::NULL.offset(), 0);
        assert!(!MemoryHandle(8).is_null());
    }

    #[test]
    fn test_negative_int_roundtrip() {
        assert_eq!(scalar_to_int(int_to_scalar(-42)), -42);
        assert_eq!(int_to_scalar(-1), u64::MAX);
    }

    #[test]
    fn test_sentinel_is_not_a_handle() {
        assert_ne!(FAILURE_SENTINEL, MemoryHandle::NULL.offset());
        assert_eq!(FAILURE_SENTINEL as i64, -1);
    }

    #[test]
    fn test_region_handle() {
        let region = Region::new(64, 5);
        assert_eq!(region.handle(), MemoryHandle(64));
        assert!(!region.is_empty());
        assert!(Region::new(64, 0).is_empty());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(MemoryHandle(255).to_string(), "@0xff");
    }
}
