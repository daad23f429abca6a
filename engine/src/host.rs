//! Host interface trait — abstraction over the host-provided primitives.
//!
//! The `HostInterface` trait decouples dispatch from the execution
//! environment (wasm runtime vs. native tests). Linear memory access comes
//! from the [`MemoryBridge`] supertrait; everything else the guest consumes
//! from the host is declared here.
//!
//! - In wasm: implemented by calling imported host functions
//! - In tests: implemented via `MockHost` (in-memory arena and stores)

use std::collections::BTreeMap;
use std::fmt;

use plugwire_primitives::{Arena, CodecResult, MemoryBridge, MemoryHandle, Region, Scalar};
use serde_json::Value;

use crate::error::HostError;
use crate::error_channel::ErrorChannel;

/// Severity of a host log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log line recorded by an in-memory host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Abstraction over the host environment.
///
/// Dispatch, import stubs and the convenience capabilities only ever talk
/// to the host through this trait. Methods map one-to-one onto the host's
/// primitives; none of them retry.
pub trait HostInterface: MemoryBridge {
    /// Call the host function bound to `slot` and return its result scalar.
    fn invoke_host_with_result(&mut self, slot: u32, args: &[Scalar]) -> Result<Scalar, HostError>;

    /// Call the host function bound to `slot`, discarding any result.
    fn invoke_host_no_result(&mut self, slot: u32, args: &[Scalar]) -> Result<(), HostError>;

    /// Populate the single-slot error channel.
    fn set_error(&mut self, message: &str);

    /// Raw input of the current call.
    fn input_bytes(&self) -> Result<Vec<u8>, HostError>;

    fn input_text(&self) -> Result<String, HostError> {
        String::from_utf8(self.input_bytes()?)
            .map_err(|_| HostError::Failed("input is not valid UTF-8".into()))
    }

    /// Set the output of the current call. A second call replaces the first.
    fn output_bytes(&mut self, bytes: &[u8]) -> Result<(), HostError>;

    fn output_text(&mut self, text: &str) -> Result<(), HostError> {
        self.output_bytes(text.as_bytes())
    }

    /// Read a plugin variable. Variables persist across calls.
    fn var_get(&self, key: &str) -> Result<Option<Vec<u8>>, HostError>;

    fn var_set(&mut self, key: &str, value: &[u8]) -> Result<(), HostError>;

    fn var_remove(&mut self, key: &str) -> Result<(), HostError>;

    /// Read a host-supplied configuration value.
    fn config_get(&self, key: &str) -> Result<Option<String>, HostError>;

    /// Perform an HTTP request. `request` holds the structured-text request
    /// descriptor; `body` is the request body or [`MemoryHandle::NULL`].
    /// Returns the handle of the response body.
    fn http_request(
        &mut self,
        request: MemoryHandle,
        body: MemoryHandle,
    ) -> Result<MemoryHandle, HostError>;

    /// Status code of the last HTTP response.
    fn http_status_code(&self) -> Result<u16, HostError>;

    /// Write a log line. Callers never branch on the outcome.
    fn log(&mut self, level: LogLevel, message: &str) -> Result<(), HostError>;
}

// ── MockHost: in-memory host for testing ──

/// Host function bound to an import slot in a [`MockHost`].
pub type HostFn = Box<dyn FnMut(&mut Arena, &[Scalar]) -> Result<Scalar, HostError>>;

/// A host-function invocation recorded by [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCall {
    pub slot: u32,
    pub args: Vec<Scalar>,
    pub with_result: bool,
}

/// An HTTP request observed by [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// In-memory host implementation for testing.
///
/// Linear memory is a bump-allocated [`Arena`]. Host functions are plain
/// closures bound to slots; every invocation is recorded.
#[derive(Default)]
pub struct MockHost {
    memory: Arena,
    input: Vec<u8>,
    output: Option<Vec<u8>>,
    vars: BTreeMap<String, Vec<u8>>,
    config: BTreeMap<String, String>,
    functions: BTreeMap<u32, HostFn>,
    calls: Vec<HostCall>,
    http_responses: BTreeMap<String, (u16, Vec<u8>)>,
    http_requests: Vec<RecordedRequest>,
    http_status: Option<u16>,
    logs: Vec<LogLine>,
    error: ErrorChannel,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific arena, e.g. one with a small capacity.
    pub fn with_memory(memory: Arena) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    /// Set the input of the next call.
    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Serve a canned response for `url`.
    pub fn with_http_response(
        mut self,
        url: impl Into<String>,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.http_responses.insert(url.into(), (status, body.into()));
        self
    }

    /// Bind a host function to an import slot.
    pub fn register_function<F>(&mut self, slot: u32, f: F)
    where
        F: FnMut(&mut Arena, &[Scalar]) -> Result<Scalar, HostError> + 'static,
    {
        self.functions.insert(slot, Box::new(f));
    }

    /// Replace the input between calls.
    pub fn set_input(&mut self, input: impl Into<Vec<u8>>) {
        self.input = input.into();
    }

    pub fn memory(&self) -> &Arena {
        &self.memory
    }

    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn output_str(&self) -> Option<&str> {
        self.output().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.output.take()
    }

    pub fn vars(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.vars
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn http_requests(&self) -> &[RecordedRequest] {
        &self.http_requests
    }

    pub fn logs(&self) -> &[LogLine] {
        &self.logs
    }

    pub fn error(&self) -> Option<&str> {
        self.error.get()
    }

    pub fn error_channel_mut(&mut self) -> &mut ErrorChannel {
        &mut self.error
    }

    /// Bytes of the block at `offset`, if it resolves.
    pub fn read_handle(&self, offset: u64) -> Option<Vec<u8>> {
        self.memory.resolve(offset).map(|r| self.memory.read_bytes(r))
    }

    fn call(&mut self, slot: u32, args: &[Scalar], with_result: bool) -> Result<Scalar, HostError> {
        self.calls.push(HostCall {
            slot,
            args: args.to_vec(),
            with_result,
        });
        let f = self.functions.get_mut(&slot).ok_or(HostError::UnknownSlot(slot))?;
        f(&mut self.memory, args)
    }

    fn read_optional(&self, handle: MemoryHandle) -> Option<Vec<u8>> {
        if handle.is_null() {
            return None;
        }
        self.read_handle(handle.offset())
    }
}

impl MemoryBridge for MockHost {
    fn allocate(&mut self, bytes: &[u8]) -> CodecResult<MemoryHandle> {
        self.memory.allocate(bytes)
    }

    fn resolve(&self, offset: u64) -> Option<Region> {
        self.memory.resolve(offset)
    }

    fn read_bytes(&self, region: Region) -> Vec<u8> {
        self.memory.read_bytes(region)
    }

    fn free(&mut self, handle: MemoryHandle) {
        self.memory.free(handle)
    }
}

impl HostInterface for MockHost {
    fn invoke_host_with_result(&mut self, slot: u32, args: &[Scalar]) -> Result<Scalar, HostError> {
        self.call(slot, args, true)
    }

    fn invoke_host_no_result(&mut self, slot: u32, args: &[Scalar]) -> Result<(), HostError> {
        self.call(slot, args, false).map(|_| ())
    }

    fn set_error(&mut self, message: &str) {
        self.error.set(message);
    }

    fn input_bytes(&self) -> Result<Vec<u8>, HostError> {
        Ok(self.input.clone())
    }

    fn output_bytes(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        self.output = Some(bytes.to_vec());
        Ok(())
    }

    fn var_get(&self, key: &str) -> Result<Option<Vec<u8>>, HostError> {
        Ok(self.vars.get(key).cloned())
    }

    fn var_set(&mut self, key: &str, value: &[u8]) -> Result<(), HostError> {
        self.vars.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn var_remove(&mut self, key: &str) -> Result<(), HostError> {
        self.vars.remove(key);
        Ok(())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.config.get(key).cloned())
    }

    fn http_request(
        &mut self,
        request: MemoryHandle,
        body: MemoryHandle,
    ) -> Result<MemoryHandle, HostError> {
        let raw = self
            .read_optional(request)
            .ok_or_else(|| HostError::Failed("http request descriptor not found".into()))?;
        let descriptor: Value = serde_json::from_slice(&raw)
            .map_err(|e| HostError::Failed(format!("bad http request: {e}")))?;

        let url = descriptor
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| HostError::Failed("http request has no url".into()))?
            .to_string();
        let method = descriptor
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_string();
        let headers = descriptor
            .get("headers")
            .and_then(Value::as_object)
            .map(|h| {
                h.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        let body = self.read_optional(body);

        let (status, response) = self
            .http_responses
            .get(&url)
            .cloned()
            .ok_or_else(|| HostError::Failed(format!("no route to {url}")))?;
        self.http_requests.push(RecordedRequest {
            url,
            method,
            headers,
            body,
        });
        self.http_status = Some(status);
        self.memory
            .allocate(&response)
            .map_err(|e| HostError::Failed(e.to_string()))
    }

    fn http_status_code(&self) -> Result<u16, HostError> {
        self.http_status
            .ok_or_else(|| HostError::Failed("no http request has been made".into()))
    }

    fn log(&mut self, level: LogLevel, message: &str) -> Result<(), HostError> {
        self.logs.push(LogLine {
            level,
            message: message.to_string(),
        });
        Ok(())
    }
}
