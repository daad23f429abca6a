//! `plugwire-guest` — the guest side of a plugwire plugin.
//!
//! A plugin builds a [`PluginModule`] (exports, imports, config) and hands
//! its constructor to [`plugin_module!`], which emits the wasm exports the
//! host calls:
//!
//! - `__arg_start` / `__arg_i32` / `__arg_i64` — stage positional scalars
//! - `__invoke` / `__invoke_i32` / `__invoke_i64` — dispatch an export by index
//! - `__plugin_manifest` — JSON description of exports and imports
//!
//! Host primitives are imported from `extism:host/env`; user host functions
//! are reached through the `shim` module's `__invokeHostFunc_{p}_{q}`
//! trampolines. Off wasm, every capability runs against any
//! [`HostInterface`], so plugins are tested natively with
//! [`MockHost`](plugwire_engine::MockHost).

// ── Modules ──

#[cfg(target_arch = "wasm32")]
mod imports;
#[cfg(target_arch = "wasm32")]
mod host_bridge;

pub mod exports;

pub mod config;
pub mod http;
pub mod io;
pub mod log;
pub mod var;

// ── Re-exports ──

#[cfg(target_arch = "wasm32")]
pub use host_bridge::WasmHost;

pub use exports::{Edge, Trap};
pub use http::{HttpRequest, HttpResponse};
pub use plugwire_engine::{
    Args, CallingConvention, FailureMode, HostInterface, ImportStub, LogLevel, Manifest,
    ModuleBuilder, ModuleConfig, PluginModule, PluginResult, Signature,
};
pub use plugwire_primitives::{
    Codec, Enumeration, FromValue, IntoValue, Json, MemoryHandle, Protobuf, Structured, TypeTag,
    TypedValue,
};

/// Everything a plugin crate usually needs.
pub mod prelude {
    pub use crate::http::{HttpRequest, HttpResponse};
    pub use crate::{config, http, io, var};
    pub use crate::{debug, error, info, warn};
    pub use plugwire_engine::{
        Args, CallingConvention, FailureMode, HostInterface, ImportStub, LogLevel, ModuleBuilder,
        ModuleConfig, PluginModule, PluginResult, Signature,
    };
    pub use plugwire_primitives::{
        codec_value, enumeration, Enumeration, FromValue, IntoValue, Json, MemoryHandle, Protobuf,
        Structured, TypeTag, TypedValue,
    };
}
