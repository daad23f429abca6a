//! Host function imports.
//!
//! Runtime primitives come from the `extism:host/env` wasm module; all
//! offsets are 64-bit handles into host-owned memory, not guest pointers.
//! User host functions are reached through the `shim` module, which
//! provides one entry point per (argument count, has-result) pair and
//! routes by slot index.

#[link(wasm_import_module = "extism:host/env")]
extern "C" {
    // ── Input / output ──

    pub fn input_length() -> u64;
    pub fn input_load_u8(offs: u64) -> u8;
    pub fn input_load_u64(offs: u64) -> u64;
    pub fn output_set(offs: u64, len: u64);
    pub fn error_set(offs: u64);

    // ── Host memory ──

    /// Allocate `len` bytes. Zero-length requests may return 0.
    pub fn alloc(len: u64) -> u64;
    /// Length of the block at `offs`, or 0 if `offs` is not a block.
    pub fn length(offs: u64) -> u64;
    pub fn free(offs: u64);
    pub fn store_u8(offs: u64, value: u8);
    pub fn load_u8(offs: u64) -> u8;
    pub fn store_u64(offs: u64, value: u64);
    pub fn load_u64(offs: u64) -> u64;

    // ── Config & vars ──

    /// Returns 0 if the key is not set.
    pub fn config_get(key: u64) -> u64;
    /// Returns 0 if the key is not set.
    pub fn var_get(key: u64) -> u64;
    /// A `value` of 0 removes the key.
    pub fn var_set(key: u64, value: u64);

    // ── HTTP ──

    pub fn http_request(request: u64, body: u64) -> u64;
    pub fn http_status_code() -> i32;

    // ── Logging ──

    pub fn log_info(offs: u64);
    pub fn log_debug(offs: u64);
    pub fn log_warn(offs: u64);
    pub fn log_error(offs: u64);
}

#[allow(non_snake_case)]
#[link(wasm_import_module = "shim")]
extern "C" {
    pub fn __invokeHostFunc_0_0(slot: u32);
    pub fn __invokeHostFunc_1_0(slot: u32, a: u64);
    pub fn __invokeHostFunc_2_0(slot: u32, a: u64, b: u64);
    pub fn __invokeHostFunc_3_0(slot: u32, a: u64, b: u64, c: u64);
    pub fn __invokeHostFunc_4_0(slot: u32, a: u64, b: u64, c: u64, d: u64);
    pub fn __invokeHostFunc_5_0(slot: u32, a: u64, b: u64, c: u64, d: u64, e: u64);

    pub fn __invokeHostFunc_0_1(slot: u32) -> u64;
    pub fn __invokeHostFunc_1_1(slot: u32, a: u64) -> u64;
    pub fn __invokeHostFunc_2_1(slot: u32, a: u64, b: u64) -> u64;
    pub fn __invokeHostFunc_3_1(slot: u32, a: u64, b: u64, c: u64) -> u64;
    pub fn __invokeHostFunc_4_1(slot: u32, a: u64, b: u64, c: u64, d: u64) -> u64;
    pub fn __invokeHostFunc_5_1(slot: u32, a: u64, b: u64, c: u64, d: u64, e: u64) -> u64;
}
