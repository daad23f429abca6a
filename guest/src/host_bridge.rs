//! Wasm host bridge — implements `HostInterface` by calling imported functions.
//!
//! This module bridges the engine's `HostInterface` trait and the codec's
//! `MemoryBridge` to the host imports declared in `imports.rs`. Host memory
//! is not guest linear memory, so every block is copied in and out through
//! the `load_*` / `store_*` primitives, eight bytes at a time.

use plugwire_engine::{HostError, HostInterface, LogLevel};
use plugwire_primitives::{
    CodecError, CodecResult, MemoryBridge, MemoryHandle, Region, Scalar, MAX_HOST_ARGS,
};

use crate::imports;

/// The host as seen from inside a wasm guest. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmHost;

/// Copy `bytes` into the host block at `offs`.
fn write_block(offs: u64, bytes: &[u8]) {
    let mut chunks = bytes.chunks_exact(8);
    let mut at = offs;
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        unsafe { imports::store_u64(at, u64::from_le_bytes(word)) };
        at += 8;
    }
    for byte in chunks.remainder() {
        unsafe { imports::store_u8(at, *byte) };
        at += 1;
    }
}

/// Copy `len` bytes out of the host block at `offs`.
fn read_block(
    offs: u64,
    len: u64,
    load_u64: unsafe extern "C" fn(u64) -> u64,
    load_u8: unsafe extern "C" fn(u64) -> u8,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(len as usize);
    let mut at = 0;
    while at + 8 <= len {
        out.extend_from_slice(&unsafe { load_u64(offs + at) }.to_le_bytes());
        at += 8;
    }
    while at < len {
        out.push(unsafe { load_u8(offs + at) });
        at += 1;
    }
    out
}

impl WasmHost {
    fn block(&self, offs: u64) -> Option<Vec<u8>> {
        self.resolve(offs).map(|region| self.read_bytes(region))
    }

    /// Allocate a transient block, mapping failure into a host error.
    fn transient(&mut self, bytes: &[u8]) -> Result<MemoryHandle, HostError> {
        self.allocate(bytes).map_err(|e| HostError::Failed(e.to_string()))
    }
}

impl MemoryBridge for WasmHost {
    fn allocate(&mut self, bytes: &[u8]) -> CodecResult<MemoryHandle> {
        let offs = unsafe { imports::alloc(bytes.len() as u64) };
        if offs == 0 && !bytes.is_empty() {
            return Err(CodecError::Allocation(format!("host refused {} bytes", bytes.len())));
        }
        write_block(offs, bytes);
        Ok(MemoryHandle(offs))
    }

    fn resolve(&self, offset: u64) -> Option<Region> {
        if offset == 0 {
            return None;
        }
        match unsafe { imports::length(offset) } {
            0 => None,
            len => Some(Region::new(offset, len)),
        }
    }

    fn read_bytes(&self, region: Region) -> Vec<u8> {
        read_block(region.offset, region.len, imports::load_u64, imports::load_u8)
    }

    fn free(&mut self, handle: MemoryHandle) {
        if !handle.is_null() {
            unsafe { imports::free(handle.offset()) }
        }
    }
}

impl HostInterface for WasmHost {
    fn invoke_host_with_result(&mut self, slot: u32, args: &[Scalar]) -> Result<Scalar, HostError> {
        use imports::*;
        let result = unsafe {
            match *args {
                [] => __invokeHostFunc_0_1(slot),
                [a] => __invokeHostFunc_1_1(slot, a),
                [a, b] => __invokeHostFunc_2_1(slot, a, b),
                [a, b, c] => __invokeHostFunc_3_1(slot, a, b, c),
                [a, b, c, d] => __invokeHostFunc_4_1(slot, a, b, c, d),
                [a, b, c, d, e] => __invokeHostFunc_5_1(slot, a, b, c, d, e),
                _ => return Err(too_wide(args.len())),
            }
        };
        Ok(result)
    }

    fn invoke_host_no_result(&mut self, slot: u32, args: &[Scalar]) -> Result<(), HostError> {
        use imports::*;
        unsafe {
            match *args {
                [] => __invokeHostFunc_0_0(slot),
                [a] => __invokeHostFunc_1_0(slot, a),
                [a, b] => __invokeHostFunc_2_0(slot, a, b),
                [a, b, c] => __invokeHostFunc_3_0(slot, a, b, c),
                [a, b, c, d] => __invokeHostFunc_4_0(slot, a, b, c, d),
                [a, b, c, d, e] => __invokeHostFunc_5_0(slot, a, b, c, d, e),
                _ => return Err(too_wide(args.len())),
            }
        }
        Ok(())
    }

    fn set_error(&mut self, message: &str) {
        if let Ok(handle) = self.allocate(message.as_bytes()) {
            unsafe { imports::error_set(handle.offset()) }
        }
    }

    fn input_bytes(&self) -> Result<Vec<u8>, HostError> {
        let len = unsafe { imports::input_length() };
        Ok(read_block(0, len, imports::input_load_u64, imports::input_load_u8))
    }

    fn output_bytes(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        let handle = self.transient(bytes)?;
        unsafe { imports::output_set(handle.offset(), bytes.len() as u64) };
        Ok(())
    }

    fn var_get(&self, key: &str) -> Result<Option<Vec<u8>>, HostError> {
        let mut this = *self;
        let key = this.transient(key.as_bytes())?;
        let offs = unsafe { imports::var_get(key.offset()) };
        this.free(key);
        let value = self.block(offs);
        this.free(MemoryHandle(offs));
        Ok(value)
    }

    fn var_set(&mut self, key: &str, value: &[u8]) -> Result<(), HostError> {
        let key = self.transient(key.as_bytes())?;
        let value = self.transient(value)?;
        unsafe { imports::var_set(key.offset(), value.offset()) };
        self.free(key);
        Ok(())
    }

    fn var_remove(&mut self, key: &str) -> Result<(), HostError> {
        let key = self.transient(key.as_bytes())?;
        unsafe { imports::var_set(key.offset(), 0) };
        self.free(key);
        Ok(())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, HostError> {
        let mut this = *self;
        let key = this.transient(key.as_bytes())?;
        let offs = unsafe { imports::config_get(key.offset()) };
        this.free(key);
        let Some(bytes) = self.block(offs) else {
            return Ok(None);
        };
        this.free(MemoryHandle(offs));
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| HostError::Failed("config value is not valid UTF-8".into()))
    }

    fn http_request(
        &mut self,
        request: MemoryHandle,
        body: MemoryHandle,
    ) -> Result<MemoryHandle, HostError> {
        let offs = unsafe { imports::http_request(request.offset(), body.offset()) };
        Ok(MemoryHandle(offs))
    }

    fn http_status_code(&self) -> Result<u16, HostError> {
        let code = unsafe { imports::http_status_code() };
        u16::try_from(code).map_err(|_| HostError::Failed(format!("invalid http status {code}")))
    }

    fn log(&mut self, level: LogLevel, message: &str) -> Result<(), HostError> {
        let handle = self.transient(message.as_bytes())?;
        unsafe {
            match level {
                LogLevel::Error => imports::log_error(handle.offset()),
                LogLevel::Warn => imports::log_warn(handle.offset()),
                LogLevel::Info => imports::log_info(handle.offset()),
                LogLevel::Debug => imports::log_debug(handle.offset()),
            }
        }
        Ok(())
    }
}

fn too_wide(got: usize) -> HostError {
    HostError::Failed(format!(
        "host functions with more than {MAX_HOST_ARGS} arguments are not supported (got {got})"
    ))
}
